//! Delta manifests and change-set deployment for platform metadata projects.
//!
//! Changed source paths are classified into typed metadata components,
//! aggregated into a `package.xml` manifest, and optionally pushed through a
//! retrieve, patch, repackage, and deploy pipeline.
pub mod archive;
pub mod changes;
pub mod classify;
pub mod cleanup;
pub mod cli;
pub mod config;
pub mod manifest;
pub mod patch;
pub mod paths;
pub mod pipeline;
pub mod platform;
pub mod util;
pub mod workflow;
