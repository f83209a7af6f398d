#![cfg_attr(not(any(test, feature = "std")), no_std)]

//! mpc_params - Multicopter position control parameters
//!
//! Typed, bounds-checked parameter registry with flash persistence. The
//! registry itself lives in `mpc_params_core`; this crate adds the storage
//! medium, the persisted store, the debounced save task, update channels and
//! the position controller manifest.
//!
//! # Example
//!
//! ```
//! use mpc_params::core::parameters::ParamStorage;
//! use mpc_params::parameters::{register_all, PosControlParams};
//! use mpc_params::platform::mock::MockFlash;
//! use mpc_params_core::parameters::ParameterRegistry;
//!
//! let mut registry = ParameterRegistry::new();
//! register_all(&mut registry).unwrap();
//!
//! let mut storage = ParamStorage::new(MockFlash::new()).unwrap();
//! storage.load(&registry).unwrap();
//!
//! registry.set("MPC_THR_MIN", 0.05f32).unwrap();
//! storage.save(&registry).unwrap();
//!
//! let params = PosControlParams::from_registry(&registry).unwrap();
//! assert_eq!(params.thr_min, 0.05);
//! ```

// Storage medium abstraction
pub mod platform;

// Logging and persistence
pub mod core;

// Parameter manifests
pub mod parameters;

// Update channels
pub mod communication;
