//! Text parameter shell
//!
//! Line-oriented update channel for a serial console or bench CLI.
//!
//! # Commands
//!
//! - `show [GROUP]`: list visible parameters, optionally one group
//! - `get NAME`: print one parameter
//! - `set NAME VALUE`: validate and write
//! - `reset NAME` / `reset_all`: return to defaults
//! - `save`: persist now
//! - `help`
//!
//! Values are parsed according to the parameter's declared type. A float
//! literal sent to an int32 parameter is passed through as a float so the
//! registry reports `TypeMismatch`, the same as any other update channel.

use core::fmt::{self, Write};

use mpc_params_core::parameters::{
    ParamDescriptor, ParamKind, ParamState, ParamType, ParameterError, ParameterRegistry,
    RawValue,
};

use crate::core::parameters::storage::{ParamStorage, PersistenceError, SaveReport};
use crate::platform::traits::flash::FlashInterface;

/// Shell errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellError {
    /// First word is not a command
    UnknownCommand,
    /// Command needs more arguments
    MissingArgument,
    /// Value is not a number
    InvalidNumber,
    /// Registry rejected the request
    Parameter(ParameterError),
    /// Save failed
    Persistence(PersistenceError),
    /// `save` used on a shell without storage
    NoStorage,
    /// Output sink failed
    Output,
}

impl fmt::Display for ShellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShellError::UnknownCommand => write!(f, "unknown command (try 'help')"),
            ShellError::MissingArgument => write!(f, "missing argument"),
            ShellError::InvalidNumber => write!(f, "invalid number"),
            ShellError::Parameter(e) => write!(f, "{}", e),
            ShellError::Persistence(e) => write!(f, "{}", e),
            ShellError::NoStorage => write!(f, "no storage attached"),
            ShellError::Output => write!(f, "output error"),
        }
    }
}

impl From<ParameterError> for ShellError {
    fn from(e: ParameterError) -> Self {
        ShellError::Parameter(e)
    }
}

impl From<PersistenceError> for ShellError {
    fn from(e: PersistenceError) -> Self {
        ShellError::Persistence(e)
    }
}

impl From<fmt::Error> for ShellError {
    fn from(_: fmt::Error) -> Self {
        ShellError::Output
    }
}

/// What a successful command did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellOutcome {
    /// Read-only command
    Done,
    /// Registry state changed; the caller should schedule a save
    Changed,
    /// Store written
    Saved(SaveReport),
}

/// Parameter shell over a registry and optional storage
pub struct ParamShell<'a, F: FlashInterface> {
    registry: &'a ParameterRegistry,
    storage: Option<&'a mut ParamStorage<F>>,
}

impl<'a, F: FlashInterface> ParamShell<'a, F> {
    /// Shell without persistence; `save` fails with `NoStorage`
    pub fn new(registry: &'a ParameterRegistry) -> Self {
        Self {
            registry,
            storage: None,
        }
    }

    /// Shell that can save
    pub fn with_storage(registry: &'a ParameterRegistry, storage: &'a mut ParamStorage<F>) -> Self {
        Self {
            registry,
            storage: Some(storage),
        }
    }

    /// Execute one command line, writing the response to `out`
    pub fn execute<W: Write>(&mut self, line: &str, out: &mut W) -> Result<ShellOutcome, ShellError> {
        let line = line.trim();
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };

        match command {
            "show" => {
                let group = if rest.is_empty() { None } else { Some(rest) };
                self.show(group, out)?;
                Ok(ShellOutcome::Done)
            }
            "get" => {
                let name = first_arg(rest)?;
                write_state(out, &self.registry.state(name)?)?;
                Ok(ShellOutcome::Done)
            }
            "set" => {
                let mut args = rest.split_whitespace();
                let name = args.next().ok_or(ShellError::MissingArgument)?;
                let text = args.next().ok_or(ShellError::MissingArgument)?;
                let descriptor = self.registry.descriptor(name)?;
                let raw = parse_value(text, descriptor.param_type())?;
                self.registry.set(name, raw)?;
                write_state(out, &self.registry.state(name)?)?;
                Ok(ShellOutcome::Changed)
            }
            "reset" => {
                let name = first_arg(rest)?;
                self.registry.reset_to_default(name)?;
                write_state(out, &self.registry.state(name)?)?;
                Ok(ShellOutcome::Changed)
            }
            "reset_all" => {
                self.registry.reset_all();
                writeln!(out, "all parameters reset to defaults")?;
                Ok(ShellOutcome::Changed)
            }
            "save" => {
                let storage = self.storage.as_deref_mut().ok_or(ShellError::NoStorage)?;
                let report = storage.save(self.registry)?;
                writeln!(
                    out,
                    "saved {} parameters (slot {}, seq {})",
                    report.records, report.slot, report.sequence
                )?;
                Ok(ShellOutcome::Saved(report))
            }
            "help" | "" => {
                writeln!(out, "show [GROUP] | get NAME | set NAME VALUE | reset NAME | reset_all | save")?;
                Ok(ShellOutcome::Done)
            }
            _ => Err(ShellError::UnknownCommand),
        }
    }

    fn show<W: Write>(&self, group: Option<&str>, out: &mut W) -> Result<(), ShellError> {
        let mut shown = 0usize;
        for descriptor in self.registry.list(group).filter(|d| !d.is_hidden()) {
            write_state(out, &self.registry.state(descriptor.name)?)?;
            shown += 1;
        }
        if shown == 0 {
            if let Some(group) = group {
                writeln!(out, "no parameters in group '{}'", group)?;
            }
        }
        Ok(())
    }
}

fn first_arg(rest: &str) -> Result<&str, ShellError> {
    rest.split_whitespace()
        .next()
        .ok_or(ShellError::MissingArgument)
}

/// Parse shell text for a parameter of type `ty`
pub fn parse_value(text: &str, ty: ParamType) -> Result<RawValue, ShellError> {
    match ty {
        // Parsed at storage width so "0.1" meets a bound of 0.1
        ParamType::Float => text
            .parse::<f32>()
            .map(RawValue::from)
            .map_err(|_| ShellError::InvalidNumber),
        ParamType::Int32 => match text.parse::<i64>() {
            Ok(v) => Ok(RawValue::Int(v)),
            Err(_) => text
                .parse::<f64>()
                .map(RawValue::Float)
                .map_err(|_| ShellError::InvalidNumber),
        },
    }
}

fn write_state<W: Write>(out: &mut W, state: &ParamState<'_>) -> fmt::Result {
    let descriptor = state.descriptor;
    write!(out, "{} = {}", descriptor.name, state.value)?;
    if !descriptor.unit.is_empty() {
        write!(out, " {}", descriptor.unit)?;
    }
    write!(out, " [{}", descriptor.param_type().as_str())?;
    write_bounds(out, descriptor)?;
    if state.dirty {
        write!(out, ", modified")?;
    }
    writeln!(out, "]")
}

fn write_bounds<W: Write>(out: &mut W, descriptor: &ParamDescriptor) -> fmt::Result {
    match descriptor.kind {
        ParamKind::Float { default, min, max } => {
            write!(out, ", default {}", default)?;
            if let Some(min) = min {
                write!(out, ", min {}", min)?;
            }
            if let Some(max) = max {
                write!(out, ", max {}", max)?;
            }
        }
        ParamKind::Int32 { default, min, max } => {
            write!(out, ", default {}", default)?;
            if let Some(min) = min {
                write!(out, ", min {}", min)?;
            }
            if let Some(max) = max {
                write!(out, ", max {}", max)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::mc_pos_control::register_defaults;
    use crate::platform::mock::MockFlash;

    fn registry() -> ParameterRegistry {
        let mut registry = ParameterRegistry::new();
        register_defaults(&mut registry).unwrap();
        registry
    }

    #[test]
    fn test_get() {
        let registry = registry();
        let mut shell: ParamShell<'_, MockFlash> = ParamShell::new(&registry);
        let mut out = String::new();

        assert_eq!(shell.execute("get MPC_Z_VEL_MAX", &mut out), Ok(ShellOutcome::Done));
        assert_eq!(out, "MPC_Z_VEL_MAX = 5 m/s [float32, default 5, min 0]\n");
    }

    #[test]
    fn test_set_and_reset() {
        let registry = registry();
        let mut shell: ParamShell<'_, MockFlash> = ParamShell::new(&registry);
        let mut out = String::new();

        assert_eq!(
            shell.execute("set MPC_THR_MIN 0.05", &mut out),
            Ok(ShellOutcome::Changed)
        );
        assert_eq!(registry.get_f32("MPC_THR_MIN"), Ok(0.05));
        assert!(out.contains("modified"));

        assert_eq!(
            shell.execute("reset MPC_THR_MIN", &mut out),
            Ok(ShellOutcome::Changed)
        );
        assert_eq!(registry.get_f32("MPC_THR_MIN"), Ok(0.1));
    }

    #[test]
    fn test_set_errors() {
        let registry = registry();
        let mut shell: ParamShell<'_, MockFlash> = ParamShell::new(&registry);
        let mut out = String::new();

        assert_eq!(
            shell.execute("set MPC_THR_MIN 1.5", &mut out),
            Err(ShellError::Parameter(ParameterError::OutOfBounds))
        );
        assert_eq!(
            shell.execute("set MPC_FW_USE_ALT 0.5", &mut out),
            Err(ShellError::Parameter(ParameterError::TypeMismatch))
        );
        assert_eq!(
            shell.execute("set MPC_FW_USE_ALT yes", &mut out),
            Err(ShellError::InvalidNumber)
        );
        assert_eq!(
            shell.execute("set MPC_NOPE 1", &mut out),
            Err(ShellError::Parameter(ParameterError::UnknownName))
        );
        assert_eq!(
            shell.execute("set MPC_THR_MIN", &mut out),
            Err(ShellError::MissingArgument)
        );
        assert_eq!(shell.execute("frobnicate", &mut out), Err(ShellError::UnknownCommand));
        assert!(out.is_empty());
    }

    #[test]
    fn test_show_group_with_spaces() {
        let registry = registry();
        let mut shell: ParamShell<'_, MockFlash> = ParamShell::new(&registry);

        let mut out = String::new();
        shell.execute("show AirDog", &mut out).unwrap();
        assert_eq!(out.lines().count(), 1);
        assert!(out.starts_with("AIRD_LOITER_STEP = 2 meters"));

        let mut out = String::new();
        shell
            .execute("show Multicopter Position Control", &mut out)
            .unwrap();
        assert_eq!(out.lines().count(), 26);

        let mut out = String::new();
        shell.execute("show Nothing", &mut out).unwrap();
        assert_eq!(out, "no parameters in group 'Nothing'\n");
    }

    #[test]
    fn test_save() {
        let registry = registry();
        let mut out = String::new();

        let mut shell: ParamShell<'_, MockFlash> = ParamShell::new(&registry);
        assert_eq!(shell.execute("save", &mut out), Err(ShellError::NoStorage));

        let mut storage = ParamStorage::new(MockFlash::new()).unwrap();
        let mut shell = ParamShell::with_storage(&registry, &mut storage);
        shell.execute("set MPC_FW_USE_ALT 1", &mut out).unwrap();
        let outcome = shell.execute("save", &mut out).unwrap();
        assert!(matches!(outcome, ShellOutcome::Saved(report) if report.records == 1));
    }

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("1", ParamType::Int32), Ok(RawValue::Int(1)));
        assert_eq!(parse_value("1", ParamType::Float), Ok(RawValue::Float(1.0)));
        assert_eq!(parse_value("-2.5", ParamType::Int32), Ok(RawValue::Float(-2.5)));
        assert_eq!(
            parse_value("99999999999", ParamType::Int32),
            Ok(RawValue::Int(99_999_999_999))
        );
        assert_eq!(parse_value("x", ParamType::Float), Err(ShellError::InvalidNumber));
        assert_eq!(
            parse_value("0.1", ParamType::Float),
            Ok(RawValue::from(0.1f32))
        );
    }
}
