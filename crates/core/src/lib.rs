//! mpc_params_core - Pure no_std parameter registry for position control
//!
//! Platform-agnostic types and algorithms that can be tested on host without
//! any feature flags or embassy dependencies.
//!
//! # Design Principles
//!
//! - **Zero cfg**: No `#[cfg(feature = ...)]` directives allowed
//! - **Pure no_std**: No std library dependencies
//! - **Trait abstractions**: Platform services injected via traits
//!
//! # Modules
//!
//! - [`parameters`]: Descriptors, validator, value cells, registry, store format
//! - [`traits`]: Platform-agnostic trait abstractions (TimeSource)

#![no_std]

pub mod parameters;
pub mod traits;
