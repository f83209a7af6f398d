//! Multicopter Position Control Parameter Definitions
//!
//! Gains, limits and follow-mode constants for the position controller.
//!
//! # Parameters
//!
//! - `MPC_THR_MIN` / `MPC_THR_MAX` - Vertical thrust limits (normalized)
//! - `MPC_Z_*` - Vertical position and velocity loop gains, limits, feed forward
//! - `MPC_XY_*` - Horizontal position and velocity loop gains, limits, feed forward
//! - `MPC_TILTMAX_AIR` / `MPC_TILTMAX_LND` - Tilt limits (deg)
//! - `MPC_LAND_SPEED` - Landing descend rate (m/s)
//! - `MPC_FW_*` - Follow mode tuning
//! - `MPC_CAM_P_MAX`, `MPC_YAW_OFF`, `MPC_PITCH_OFF` - Camera and heading
//! - `AIRD_LOITER_STEP` - Loiter position adjustment step (AirDog group)

use mpc_params_core::parameters::{
    FloatParam, IntParam, ParamDescriptor, ParameterError, ParameterRegistry,
};

/// Group tag for position controller parameters
pub const GROUP: &str = "Multicopter Position Control";

/// Group tag for AirDog-specific parameters
pub const AIRDOG_GROUP: &str = "AirDog";

const fn float(name: &'static str, default: f32, min: Option<f32>, max: Option<f32>) -> ParamDescriptor {
    ParamDescriptor::new_float(name, default, min, max).with_group(GROUP)
}

/// Position controller manifest, in registration order
pub const MC_POS_CONTROL_PARAMS: [ParamDescriptor; 27] = [
    float("MPC_THR_MIN", 0.1, Some(0.0), Some(1.0)).with_description(
        "Minimum thrust",
        "Minimum vertical thrust. Keep it above 0 to avoid free fall with zero thrust.",
    ),
    float("MPC_THR_MAX", 1.0, Some(0.0), Some(1.0))
        .with_description("Maximum thrust", "Limit max allowed thrust."),
    float("MPC_Z_P", 1.0, Some(0.0), None)
        .with_description("Proportional gain for vertical position error", ""),
    float("MPC_Z_VEL_P", 0.1, Some(0.0), None)
        .with_description("Proportional gain for vertical velocity error", ""),
    float("MPC_Z_VEL_I", 0.02, Some(0.0), None).with_description(
        "Integral gain for vertical velocity error",
        "Non-zero value allows hovering thrust estimation on stabilized or autonomous takeoff.",
    ),
    float("MPC_Z_VEL_D", 0.0, Some(0.0), None)
        .with_description("Differential gain for vertical velocity error", ""),
    float("MPC_Z_VEL_MAX", 5.0, Some(0.0), None)
        .with_unit("m/s")
        .with_description(
            "Maximum vertical velocity",
            "Maximum vertical velocity in AUTO mode and endpoint for stabilized modes (ALTCTRL, POSCTRL).",
        ),
    float("MPC_Z_FF", 0.5, Some(0.0), Some(1.0)).with_description(
        "Vertical velocity feed forward",
        "Feed forward weight for altitude control in stabilized modes (ALTCTRL, POSCTRL). \
         0 gives slow response and no overshoot, 1 gives fast response and big overshoot.",
    ),
    float("MPC_XY_P", 1.0, Some(0.0), None)
        .with_description("Proportional gain for horizontal position error", ""),
    float("MPC_XY_VEL_P", 0.1, Some(0.0), None)
        .with_description("Proportional gain for horizontal velocity error", ""),
    float("MPC_XY_VEL_I", 0.02, Some(0.0), None).with_description(
        "Integral gain for horizontal velocity error",
        "Non-zero value allows to resist wind.",
    ),
    float("MPC_XY_VEL_D", 0.01, Some(0.0), None).with_description(
        "Differential gain for horizontal velocity error",
        "Small values help reduce fast oscillations. If the value is too big oscillations appear again.",
    ),
    float("MPC_XY_VEL_MAX", 5.0, Some(0.0), None)
        .with_unit("m/s")
        .with_description(
            "Maximum horizontal velocity",
            "Maximum horizontal velocity in AUTO mode and endpoint for position stabilized mode (POSCTRL).",
        ),
    float("MPC_XY_FF", 0.5, Some(0.0), Some(1.0)).with_description(
        "Horizontal velocity feed forward",
        "Feed forward weight for position control in position control mode (POSCTRL). \
         0 gives slow response and no overshoot, 1 gives fast response and big overshoot.",
    ),
    float("MPC_TILTMAX_AIR", 45.0, Some(0.0), Some(90.0))
        .with_unit("deg")
        .with_description(
            "Maximum tilt angle in air",
            "Limits maximum tilt in AUTO and POSCTRL modes during flight.",
        ),
    float("MPC_TILTMAX_LND", 15.0, Some(0.0), Some(90.0))
        .with_unit("deg")
        .with_description(
            "Maximum tilt during landing",
            "Limits maximum tilt angle on landing.",
        ),
    float("MPC_LAND_SPEED", 1.0, Some(0.0), None)
        .with_unit("m/s")
        .with_description("Landing descend rate", ""),
    float("MPC_FW_FF", 0.0, Some(0.0), Some(1.0)).with_description(
        "Follow mode position feed-forward",
        "Target velocity feed-forward in follow mode.",
    ),
    float("MPC_FW_MIN_DIST", 10.0, Some(0.0), None).with_description(
        "Follow mode min distance",
        "Minimum allowed distance between target and copter.",
    ),
    float("MPC_FW_ALT_OFF", 0.0, None, None)
        .with_unit("meters")
        .with_description(
            "Follow mode initial altitude offset",
            "Altitude offset (copter_alt - target_alt) on copter arming, for altitude estimates synchronization.",
        ),
    float("MPC_FW_MAX_YAW", 45.0, Some(0.0), None)
        .with_unit("deg")
        .with_description(
            "Follow mode max yaw offset",
            "Maximum yaw offset in FOLLOW mode that can be set by stick.",
        ),
    ParamDescriptor::new_int32("MPC_FW_USE_ALT", 0, Some(0), Some(1))
        .with_group(GROUP)
        .with_description(
            "Use altitude of target to set copter altitude",
            "0 (disabled): copter holds constant altitude, only adjusts camera pitch to point to the target. \
             1 (enabled): copter holds constant altitude difference with target.",
        ),
    float("MPC_FW_LPF", 0.0, Some(0.0), Some(10.0))
        .with_unit("s")
        .with_description(
            "Low pass filter for target velocity",
            "Time constant for low pass filter.",
        ),
    float("MPC_CAM_P_MAX", 90.0, Some(0.0), Some(180.0))
        .with_unit("deg")
        .with_description(
            "Maximum camera pitch",
            "Camera pitch (degrees) for control signal of 1, assuming camera pitch is 0 at control signal 0.",
        ),
    float("MPC_YAW_OFF", 0.0, None, None)
        .with_unit("meters")
        .with_description("Turn off automatic YAW", "in FOLLOW and AUTO modes"),
    float("MPC_PITCH_OFF", 0.0, None, None)
        .with_unit("meters")
        .with_description("Turn off automatic pitch", "in FOLLOW and AUTO modes"),
    ParamDescriptor::new_float("AIRD_LOITER_STEP", 2.0, None, None)
        .with_group(AIRDOG_GROUP)
        .with_unit("meters")
        .with_description("Airdog step to adjust position", "in LOITER mode"),
];

/// Register the position controller manifest
pub fn register_defaults(registry: &mut ParameterRegistry) -> Result<(), ParameterError> {
    registry.register_all(&MC_POS_CONTROL_PARAMS)
}

/// Pre-resolved handles for every position controller parameter
///
/// Resolve once at task start; each field read afterwards is a single
/// lock-free load.
#[derive(Debug, Clone, Copy)]
pub struct PosControlHandles<'a> {
    pub thr_min: FloatParam<'a>,
    pub thr_max: FloatParam<'a>,
    pub z_p: FloatParam<'a>,
    pub z_vel_p: FloatParam<'a>,
    pub z_vel_i: FloatParam<'a>,
    pub z_vel_d: FloatParam<'a>,
    pub z_vel_max: FloatParam<'a>,
    pub z_ff: FloatParam<'a>,
    pub xy_p: FloatParam<'a>,
    pub xy_vel_p: FloatParam<'a>,
    pub xy_vel_i: FloatParam<'a>,
    pub xy_vel_d: FloatParam<'a>,
    pub xy_vel_max: FloatParam<'a>,
    pub xy_ff: FloatParam<'a>,
    pub tilt_max_air: FloatParam<'a>,
    pub tilt_max_land: FloatParam<'a>,
    pub land_speed: FloatParam<'a>,
    pub follow_ff: FloatParam<'a>,
    pub follow_min_dist: FloatParam<'a>,
    pub follow_alt_offset: FloatParam<'a>,
    pub follow_max_yaw: FloatParam<'a>,
    pub follow_use_alt: IntParam<'a>,
    pub follow_lpf: FloatParam<'a>,
    pub cam_pitch_max: FloatParam<'a>,
    pub yaw_off: FloatParam<'a>,
    pub pitch_off: FloatParam<'a>,
    pub loiter_step: FloatParam<'a>,
}

impl<'a> PosControlHandles<'a> {
    /// Resolve every handle; fails if the manifest was not registered
    pub fn resolve(registry: &'a ParameterRegistry) -> Result<Self, ParameterError> {
        Ok(Self {
            thr_min: registry.float("MPC_THR_MIN")?,
            thr_max: registry.float("MPC_THR_MAX")?,
            z_p: registry.float("MPC_Z_P")?,
            z_vel_p: registry.float("MPC_Z_VEL_P")?,
            z_vel_i: registry.float("MPC_Z_VEL_I")?,
            z_vel_d: registry.float("MPC_Z_VEL_D")?,
            z_vel_max: registry.float("MPC_Z_VEL_MAX")?,
            z_ff: registry.float("MPC_Z_FF")?,
            xy_p: registry.float("MPC_XY_P")?,
            xy_vel_p: registry.float("MPC_XY_VEL_P")?,
            xy_vel_i: registry.float("MPC_XY_VEL_I")?,
            xy_vel_d: registry.float("MPC_XY_VEL_D")?,
            xy_vel_max: registry.float("MPC_XY_VEL_MAX")?,
            xy_ff: registry.float("MPC_XY_FF")?,
            tilt_max_air: registry.float("MPC_TILTMAX_AIR")?,
            tilt_max_land: registry.float("MPC_TILTMAX_LND")?,
            land_speed: registry.float("MPC_LAND_SPEED")?,
            follow_ff: registry.float("MPC_FW_FF")?,
            follow_min_dist: registry.float("MPC_FW_MIN_DIST")?,
            follow_alt_offset: registry.float("MPC_FW_ALT_OFF")?,
            follow_max_yaw: registry.float("MPC_FW_MAX_YAW")?,
            follow_use_alt: registry.int("MPC_FW_USE_ALT")?,
            follow_lpf: registry.float("MPC_FW_LPF")?,
            cam_pitch_max: registry.float("MPC_CAM_P_MAX")?,
            yaw_off: registry.float("MPC_YAW_OFF")?,
            pitch_off: registry.float("MPC_PITCH_OFF")?,
            loiter_step: registry.float("AIRD_LOITER_STEP")?,
        })
    }

    /// Read every value once
    ///
    /// Each field is individually consistent; the struct as a whole is not
    /// an atomic snapshot of the registry.
    pub fn snapshot(&self) -> PosControlParams {
        PosControlParams {
            thr_min: self.thr_min.get(),
            thr_max: self.thr_max.get(),
            z_p: self.z_p.get(),
            z_vel_p: self.z_vel_p.get(),
            z_vel_i: self.z_vel_i.get(),
            z_vel_d: self.z_vel_d.get(),
            z_vel_max: self.z_vel_max.get(),
            z_ff: self.z_ff.get(),
            xy_p: self.xy_p.get(),
            xy_vel_p: self.xy_vel_p.get(),
            xy_vel_i: self.xy_vel_i.get(),
            xy_vel_d: self.xy_vel_d.get(),
            xy_vel_max: self.xy_vel_max.get(),
            xy_ff: self.xy_ff.get(),
            tilt_max_air: self.tilt_max_air.get(),
            tilt_max_land: self.tilt_max_land.get(),
            land_speed: self.land_speed.get(),
            follow_ff: self.follow_ff.get(),
            follow_min_dist: self.follow_min_dist.get(),
            follow_alt_offset: self.follow_alt_offset.get(),
            follow_max_yaw: self.follow_max_yaw.get(),
            follow_use_alt: self.follow_use_alt.get() != 0,
            follow_lpf: self.follow_lpf.get(),
            cam_pitch_max: self.cam_pitch_max.get(),
            yaw_off: self.yaw_off.get(),
            pitch_off: self.pitch_off.get(),
            loiter_step: self.loiter_step.get(),
        }
    }
}

/// Position controller parameters read from the registry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PosControlParams {
    /// Minimum vertical thrust (normalized)
    pub thr_min: f32,
    /// Maximum vertical thrust (normalized)
    pub thr_max: f32,
    /// Vertical position P gain
    pub z_p: f32,
    /// Vertical velocity P gain
    pub z_vel_p: f32,
    /// Vertical velocity I gain
    pub z_vel_i: f32,
    /// Vertical velocity D gain
    pub z_vel_d: f32,
    /// Maximum vertical velocity (m/s)
    pub z_vel_max: f32,
    /// Vertical velocity feed forward weight
    pub z_ff: f32,
    /// Horizontal position P gain
    pub xy_p: f32,
    /// Horizontal velocity P gain
    pub xy_vel_p: f32,
    /// Horizontal velocity I gain
    pub xy_vel_i: f32,
    /// Horizontal velocity D gain
    pub xy_vel_d: f32,
    /// Maximum horizontal velocity (m/s)
    pub xy_vel_max: f32,
    /// Horizontal velocity feed forward weight
    pub xy_ff: f32,
    /// Maximum tilt in flight (deg)
    pub tilt_max_air: f32,
    /// Maximum tilt while landing (deg)
    pub tilt_max_land: f32,
    /// Landing descend rate (m/s)
    pub land_speed: f32,
    /// Follow mode target velocity feed forward
    pub follow_ff: f32,
    /// Follow mode minimum target distance
    pub follow_min_dist: f32,
    /// Follow mode altitude offset at arming (m)
    pub follow_alt_offset: f32,
    /// Follow mode stick yaw offset limit (deg)
    pub follow_max_yaw: f32,
    /// Follow target altitude instead of holding constant altitude
    pub follow_use_alt: bool,
    /// Follow mode target velocity filter time constant (s)
    pub follow_lpf: f32,
    /// Camera pitch at full control signal (deg)
    pub cam_pitch_max: f32,
    /// Automatic yaw switch in FOLLOW and AUTO modes (nonzero turns it off)
    pub yaw_off: f32,
    /// Automatic pitch switch in FOLLOW and AUTO modes (nonzero turns it off)
    pub pitch_off: f32,
    /// Loiter position adjustment step (m)
    pub loiter_step: f32,
}

impl PosControlParams {
    /// Load current values from the registry
    pub fn from_registry(registry: &ParameterRegistry) -> Result<Self, ParameterError> {
        PosControlHandles::resolve(registry).map(|handles| handles.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mpc_params_core::parameters::ParamValue;

    fn registry() -> ParameterRegistry {
        let mut registry = ParameterRegistry::new();
        register_defaults(&mut registry).unwrap();
        registry
    }

    #[test]
    fn test_manifest_is_consistent() {
        for descriptor in &MC_POS_CONTROL_PARAMS {
            assert!(descriptor.check().is_ok(), "{}", descriptor.name);
            assert!(!descriptor.short_desc.is_empty(), "{}", descriptor.name);
        }
        let registry = registry();
        assert_eq!(registry.len(), MC_POS_CONTROL_PARAMS.len());
    }

    #[test]
    fn test_groups() {
        let registry = registry();
        assert_eq!(registry.groups().as_slice(), &[GROUP, AIRDOG_GROUP]);
        assert_eq!(registry.list(Some(GROUP)).count(), 26);
        assert_eq!(
            registry.list(Some(AIRDOG_GROUP)).map(|d| d.name).next(),
            Some("AIRD_LOITER_STEP")
        );
    }

    #[test]
    fn test_defaults_snapshot() {
        let registry = registry();
        let params = PosControlParams::from_registry(&registry).unwrap();

        assert_eq!(params.thr_min, 0.1);
        assert_eq!(params.thr_max, 1.0);
        assert_eq!(params.z_vel_i, 0.02);
        assert_eq!(params.xy_vel_d, 0.01);
        assert_eq!(params.tilt_max_air, 45.0);
        assert_eq!(params.tilt_max_land, 15.0);
        assert_eq!(params.follow_min_dist, 10.0);
        assert!(!params.follow_use_alt);
        assert_eq!(params.cam_pitch_max, 90.0);
        assert_eq!(params.yaw_off, 0.0);
        assert_eq!(params.pitch_off, 0.0);
        assert_eq!(params.loiter_step, 2.0);
    }

    #[test]
    fn test_handles_follow_updates() {
        let registry = registry();
        let handles = PosControlHandles::resolve(&registry).unwrap();

        registry.set("MPC_TILTMAX_AIR", 30.0f32).unwrap();
        registry.set("MPC_FW_USE_ALT", 1i32).unwrap();

        let params = handles.snapshot();
        assert_eq!(params.tilt_max_air, 30.0);
        assert!(params.follow_use_alt);
    }

    #[test]
    fn test_units_and_types() {
        let registry = registry();
        assert_eq!(registry.descriptor("MPC_Z_VEL_MAX").unwrap().unit, "m/s");
        assert_eq!(registry.descriptor("MPC_FW_LPF").unwrap().unit, "s");
        assert_eq!(
            registry.get("MPC_FW_USE_ALT").unwrap().0,
            ParamValue::Int32(0)
        );
    }

    #[test]
    fn test_resolve_requires_manifest() {
        let registry = ParameterRegistry::new();
        assert!(matches!(
            PosControlHandles::resolve(&registry),
            Err(ParameterError::UnknownName)
        ));
    }
}
