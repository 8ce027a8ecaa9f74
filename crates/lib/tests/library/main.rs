//! Library integration tests: the public flows driven through a recording engine.

mod common;
mod flow_tests;
mod tag_tests;
