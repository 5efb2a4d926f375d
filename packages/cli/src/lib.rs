#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Batch pipeline that turns NASA FIRMS detections into district-level
//! fire counts for Punjab and Haryana.
//!
//! [`pipeline::run`] drives a full run from a [`PipelineConfig`];
//! [`pipeline::run_with_sources`] accepts any point and boundary sources,
//! which is how the integration tests exercise it without network access.

pub mod config;
pub mod error;
pub mod pipeline;

pub use config::PipelineConfig;
pub use error::PipelineError;
pub use pipeline::{RunSummary, Sources, run, run_with_sources};
