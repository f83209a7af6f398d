//! Concurrent writers and a control-loop reader

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use mpc_params::core::parameters::ParamStorage;
use mpc_params::parameters::register_all;
use mpc_params::platform::mock::MockFlash;
use mpc_params::platform::{FlashInterface, Result};
use mpc_params_core::parameters::{ParamValue, ParameterRegistry};

const WRITES: u32 = 20_000;

/// (name, two valid values with very different bit patterns)
const TARGETS: [(&str, f32, f32); 4] = [
    ("MPC_XY_VEL_MAX", 1.25, 9876.5),
    ("MPC_Z_VEL_MAX", 0.001, 3.0e6),
    ("MPC_FW_ALT_OFF", -1.0e-7, 1.0e7),
    ("MPC_YAW_OFF", -360.0, 0.5),
];

#[test]
fn test_readers_never_see_torn_values() {
    let mut registry = ParameterRegistry::new();
    register_all(&mut registry).unwrap();
    let registry = &registry;
    let done = AtomicBool::new(false);

    thread::scope(|s| {
        let writers: Vec<_> = TARGETS
            .iter()
            .map(|&(name, a, b)| {
                s.spawn(move || {
                    let param = registry.float(name).unwrap();
                    for i in 0..WRITES {
                        param.set(if i % 2 == 0 { a } else { b }).unwrap();
                    }
                })
            })
            .collect();

        let reader = s.spawn(|| {
            let handles: Vec<_> = TARGETS
                .iter()
                .map(|&(name, ..)| registry.handle(name).unwrap())
                .collect();
            let mut last_versions = vec![0u32; TARGETS.len()];
            let mut reads = 0u64;

            while !done.load(Ordering::Acquire) {
                for (i, handle) in handles.iter().enumerate() {
                    let (value, version) = handle.get();
                    let (_, a, b) = TARGETS[i];
                    let default = handle.descriptor().default_value();
                    assert!(
                        value == ParamValue::Float(a)
                            || value == ParamValue::Float(b)
                            || value == default,
                        "torn read of {}: {:?}",
                        TARGETS[i].0,
                        value
                    );
                    assert!(version >= last_versions[i], "version went backwards");
                    last_versions[i] = version;
                    reads += 1;
                }
            }
            reads
        });

        for writer in writers {
            writer.join().unwrap();
        }
        done.store(true, Ordering::Release);
        assert!(reader.join().unwrap() > 0);
    });

    for &(name, _, b) in &TARGETS {
        let (value, version) = registry.get(name).unwrap();
        assert_eq!(value, ParamValue::Float(b));
        assert_eq!(version, WRITES);
    }
}

#[test]
fn test_snapshot_during_writes_sees_whole_values() {
    let mut registry = ParameterRegistry::new();
    register_all(&mut registry).unwrap();
    let registry = &registry;

    thread::scope(|s| {
        s.spawn(|| {
            let param = registry.float("MPC_TILTMAX_AIR").unwrap();
            for i in 0..WRITES {
                param.set(if i % 2 == 0 { 10.0 } else { 80.0 }).unwrap();
            }
        });

        s.spawn(|| {
            for _ in 0..1_000 {
                for state in registry.states() {
                    if state.descriptor.name == "MPC_TILTMAX_AIR" {
                        let v = state.value.as_f32().unwrap();
                        assert!(v == 10.0 || v == 80.0 || v == 45.0, "torn: {}", v);
                    } else {
                        assert!(state.is_default());
                    }
                }
            }
        });
    });
}

fn registry() -> ParameterRegistry {
    let mut registry = ParameterRegistry::new();
    register_all(&mut registry).unwrap();
    registry
}

fn stored_values(flash: MockFlash) -> ParameterRegistry {
    let registry = registry();
    ParamStorage::new(flash).unwrap().load(&registry).unwrap();
    registry
}

fn same_values(a: &ParameterRegistry, b: &ParameterRegistry) -> bool {
    TARGETS
        .iter()
        .all(|&(name, ..)| a.get(name).unwrap().0 == b.get(name).unwrap().0)
}

#[test]
fn test_save_while_writers_run() {
    let registry = registry();
    let registry = &registry;
    let mut storage = ParamStorage::new(MockFlash::new()).unwrap();
    let done = AtomicBool::new(false);

    thread::scope(|s| {
        let writers: Vec<_> = TARGETS
            .iter()
            .map(|&(name, a, b)| {
                s.spawn(move || {
                    for i in 0..WRITES / 10 {
                        registry.set(name, if i % 2 == 0 { a } else { b }).unwrap();
                    }
                })
            })
            .collect();

        let storage = &mut storage;
        let done = &done;
        let saver = s.spawn(move || {
            let mut saves = 0u32;
            while !done.load(Ordering::Acquire) || saves == 0 {
                storage.save(registry).unwrap();
                saves += 1;
            }
            saves
        });

        for writer in writers {
            writer.join().unwrap();
        }
        done.store(true, Ordering::Release);
        assert!(saver.join().unwrap() > 0);
    });

    // Whatever the last save captured, each value is one that was written
    let stored = stored_values(storage.flash_mut().clone());
    for &(name, a, b) in &TARGETS {
        let value = stored.get(name).unwrap().0;
        let default = stored.descriptor(name).unwrap().default_value();
        assert!(
            value == ParamValue::Float(a) || value == ParamValue::Float(b) || value == default,
            "{} stored as {:?}",
            name,
            value
        );
    }
    if !registry.needs_save() {
        assert!(same_values(&stored, registry));
    }

    storage.save_if_needed(registry).unwrap();
    assert!(!registry.needs_save());
    assert!(same_values(&stored_values(storage.into_flash()), registry));
}

/// Flash that writes a parameter while the first erase of a save is running
struct RacingFlash<'a> {
    inner: MockFlash,
    registry: &'a ParameterRegistry,
    fired: bool,
}

impl FlashInterface for RacingFlash<'_> {
    fn read(&mut self, address: u32, buf: &mut [u8]) -> Result<()> {
        self.inner.read(address, buf)
    }

    fn write(&mut self, address: u32, data: &[u8]) -> Result<()> {
        self.inner.write(address, data)
    }

    fn erase(&mut self, address: u32, size: u32) -> Result<()> {
        if !self.fired {
            self.fired = true;
            self.registry.set("MPC_XY_VEL_MAX", 7.5f32).unwrap();
        }
        self.inner.erase(address, size)
    }

    fn block_size(&self) -> u32 {
        self.inner.block_size()
    }

    fn capacity(&self) -> u32 {
        self.inner.capacity()
    }
}

#[test]
fn test_write_racing_a_save_stays_pending() {
    let registry = registry();
    registry.set("MPC_Z_VEL_MAX", 2.0f32).unwrap();

    let flash = RacingFlash {
        inner: MockFlash::new(),
        registry: &registry,
        fired: false,
    };
    let mut storage = ParamStorage::new(flash).unwrap();
    let report = storage.save(&registry).unwrap();
    assert_eq!(report.records, 1);

    // The racing write landed after the snapshot
    assert_eq!(registry.get_f32("MPC_XY_VEL_MAX"), Ok(7.5));
    assert!(registry.needs_save());

    let stored = stored_values(storage.flash_mut().inner.clone());
    assert_eq!(stored.get_f32("MPC_Z_VEL_MAX"), Ok(2.0));
    assert_eq!(stored.get_f32("MPC_XY_VEL_MAX"), Ok(5.0));

    assert!(storage.save_if_needed(&registry).unwrap().is_some());
    assert!(!registry.needs_save());
    let stored = stored_values(storage.into_flash().inner);
    assert_eq!(stored.get_f32("MPC_XY_VEL_MAX"), Ok(7.5));
}
