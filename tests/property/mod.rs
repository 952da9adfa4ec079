//! Property-based tests

mod allocator_proptest;
