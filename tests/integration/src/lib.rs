//! Cross-crate integration tests for chainsign
//!
//! This test suite validates:
//! - The device lifecycle from creation through chained signing
//! - Chain replay and verification from genesis
//! - Concurrent signing on one device
//! - Store ordering guarantees under concurrent callers
//! - The HTTP API end to end

pub mod test_utils;



#[cfg(test)]
mod store_tests;

#[cfg(test)]
mod http_api_tests;
