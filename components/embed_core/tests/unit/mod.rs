//! Unit tests for the embedding core
//! Each module exercises one part of the public surface through real isolates.

mod common;
mod test_evaluate;
mod test_properties;
mod test_values;
