//! CLI integration tests against a scripted stand-in for the container engine.

mod common;

mod all_tests;
mod list_tests;
mod tag_tests;
