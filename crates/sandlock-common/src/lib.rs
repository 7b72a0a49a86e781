//! # sandlock-common
//!
//! Shared types, error definitions, configuration models, and kernel
//! constants used across the sandlock workspace.
//!
//! This crate is the leaf of the dependency graph. It performs no system
//! calls; it only names the things the kernel interface talks about.

pub mod config;
pub mod constants;
pub mod error;
pub mod types;
