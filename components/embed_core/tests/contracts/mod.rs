//! Contract tests for embed_core
//!
//! These tests pin the public surface of the embedding API: which types can
//! move between threads, what serializes, and how errors read.

mod api_contract;
