//! Update channels
//!
//! Operator-facing adapters that drive the registry. Every channel goes
//! through `ParameterRegistry::set`, so validation is identical regardless of
//! where an update comes from.
//!
//! - **Parameter shell**: line-oriented text commands for a serial console

pub mod param_shell;

pub use param_shell::{ParamShell, ShellError, ShellOutcome};
