//! Integration test suite for the embedding core
//!
//! This crate provides integration tests that verify components work
//! together correctly across component boundaries.

/// Re-export components for test convenience
pub mod components {
    pub use core_types;
    pub use embed_core;
    pub use js_cli;
}
