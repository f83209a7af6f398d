//! Parameter manifests
//!
//! Declarative descriptor tables for each subsystem and the process-wide
//! registry instance.
//!
//! # Boot sequence
//!
//! ```text
//! install()            register every manifest at defaults
//!    │
//!    ▼
//! ParamStorage::load   overlay stored non-default values
//!    │
//!    ▼
//! control loop         PosControlHandles::resolve once, read every cycle
//! ```

pub mod mc_pos_control;

use core::fmt;

use mpc_params_core::parameters::{ParameterError, ParameterRegistry};
use static_cell::StaticCell;

pub use mc_pos_control::{PosControlHandles, PosControlParams, MC_POS_CONTROL_PARAMS};

/// Errors from [`install`] and [`install_with`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallError {
    /// The registry was already installed
    AlreadyInstalled,
    /// A manifest failed to register
    Registration(ParameterError),
}

impl fmt::Display for InstallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstallError::AlreadyInstalled => write!(f, "Parameter registry already installed"),
            InstallError::Registration(e) => write!(f, "Parameter registration failed: {}", e),
        }
    }
}

impl From<ParameterError> for InstallError {
    fn from(error: ParameterError) -> Self {
        InstallError::Registration(error)
    }
}

/// Register every manifest in this crate
pub fn register_all(registry: &mut ParameterRegistry) -> Result<(), ParameterError> {
    mc_pos_control::register_defaults(registry)
}

static REGISTRY: StaticCell<ParameterRegistry> = StaticCell::new();

/// Build the process-wide registry with every manifest registered
///
/// Succeeds once; the returned reference is shared with every task.
pub fn install() -> Result<&'static ParameterRegistry, InstallError> {
    install_with(register_all)
}

/// Build the process-wide registry with a custom set of manifests
///
/// Registration runs on a local registry; the static slot is only taken
/// once it succeeds, so a failed attempt can be retried.
pub fn install_with(
    register: impl FnOnce(&mut ParameterRegistry) -> Result<(), ParameterError>,
) -> Result<&'static ParameterRegistry, InstallError> {
    let mut registry = ParameterRegistry::new();
    register(&mut registry)?;

    let registry: &'static ParameterRegistry = REGISTRY
        .try_init(registry)
        .ok_or(InstallError::AlreadyInstalled)?;
    crate::log_info!("Registered {} parameters", registry.len());
    Ok(registry)
}
