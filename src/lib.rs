//! Shared fixtures for the json-swap benchmarks and end-to-end tests.

pub mod bench_support;
