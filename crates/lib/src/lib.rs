//! dockbuild-lib: containerized build environments for a platform matrix
//!
//! This crate provides the pieces the `dockbuild` binary composes:
//! - `platform`: the catalog of build platforms under the docker directory
//! - `tag`: content-addressed image tags
//! - `cache`: best-effort image retrieval from a registry
//! - `builder`: image construction with bounded retries
//! - `runner`: container execution with GPU runtime fallback
//! - `pipeline` and `matrix`: the single-platform and all-platform flows
//!
//! Every engine interaction goes through the [`engine::Engine`] trait.

pub mod builder;
pub mod cache;
pub mod config;
pub mod consts;
pub mod engine;
pub mod error;
pub mod matrix;
pub mod pipeline;
pub mod platform;
pub mod registry;
pub mod retry;
pub mod runner;
pub mod tag;
pub mod util;

pub use error::{Error, Result};
