//! Tests against a running server. Run with: cargo test -- --ignored

mod api_tests;
