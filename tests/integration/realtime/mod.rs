//! Real-time integration tests

#[cfg(feature = "ssr")]
mod broadcast_test;
