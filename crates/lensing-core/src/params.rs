use std::f32::consts::TAU;
use std::ops::RangeInclusive;

use crate::controls::{Control, ParamUpdate};

// ---------------------------------------------------------------------------
// Declared ranges
// ---------------------------------------------------------------------------

pub const SCHWARZSCHILD_RADIUS_RANGE: RangeInclusive<f32> = 0.1..=5.0;
pub const GRAVITY_ACCELERATION_RANGE: RangeInclusive<f32> = -5.0..=-0.1;
pub const INTEGRATION_STEP_RANGE: RangeInclusive<f32> = 0.01..=0.2;
pub const DISK_INNER_RANGE: RangeInclusive<f32> = 1.1..=4.0;
pub const DISK_OUTER_RANGE: RangeInclusive<f32> = 4.1..=15.0;
pub const DOPPLER_INTENSITY_RANGE: RangeInclusive<f32> = 0.0..=2.0;
pub const FLOW_FREQUENCY_RANGE: RangeInclusive<f32> = 1.0..=30.0;
pub const NEAR_STAR_DENSITY_RANGE: RangeInclusive<f32> = 0.95..=0.999;
pub const DISTANT_STAR_DENSITY_RANGE: RangeInclusive<f32> = 0.90..=0.99;
pub const NEBULA_INTENSITY_RANGE: RangeInclusive<f32> = 0.0..=5.0;
pub const CAMERA_DISTANCE_RANGE: RangeInclusive<f32> = 5.0..=100.0;
pub const MANUAL_ROTATION_RANGE: RangeInclusive<f32> = 0.0..=TAU;

/// Smallest gap kept between the disk limits if the ranges ever overlap.
const DISK_MIN_GAP: f32 = 0.1;

// ---------------------------------------------------------------------------
// RotationMode
// ---------------------------------------------------------------------------

/// Which azimuth the camera uses.
///
/// While auto-rotation runs, the last manual angle stays parked inside the
/// variant so switching back to manual resumes where the user left it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RotationMode {
    Auto { parked: f32 },
    Manual(f32),
}

impl RotationMode {
    pub fn is_auto(self) -> bool {
        matches!(self, RotationMode::Auto { .. })
    }

    /// The stored manual angle, active or parked.
    pub fn manual_angle(self) -> f32 {
        match self {
            RotationMode::Auto { parked } => parked,
            RotationMode::Manual(angle) => angle,
        }
    }

    /// Effective azimuth for a frame whose clock angle is `auto_angle`.
    pub fn resolve(self, auto_angle: f32) -> f32 {
        match self {
            RotationMode::Auto { .. } => auto_angle,
            RotationMode::Manual(angle) => angle,
        }
    }
}

// ---------------------------------------------------------------------------
// ParameterSet: the current value of every tunable
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterSet {
    pub schwarzschild_radius: f32,
    pub gravity_acceleration: f32,
    pub integration_step: f32,
    pub disk_inner_limit: f32,
    pub disk_outer_limit: f32,
    pub doppler_intensity: f32,
    pub flow_frequency: f32,
    pub near_star_density: f32,
    pub distant_star_density: f32,
    pub nebula_intensity: f32,
    pub camera_distance: f32,
    pub rotation: RotationMode,
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self {
            schwarzschild_radius: 1.0,
            gravity_acceleration: -1.5,
            integration_step: 0.1,
            disk_inner_limit: 2.6,
            disk_outer_limit: 8.5,
            doppler_intensity: 0.75,
            flow_frequency: 10.0,
            near_star_density: 0.98,
            distant_star_density: 0.95,
            nebula_intensity: 1.0,
            camera_distance: 30.0,
            rotation: RotationMode::Auto { parked: 0.0 },
        }
    }
}

impl ParameterSet {
    pub fn manual_rotation_angle(&self) -> f32 {
        self.rotation.manual_angle()
    }

    pub fn auto_rotation_enabled(&self) -> bool {
        self.rotation.is_auto()
    }
}

// ---------------------------------------------------------------------------
// ParameterStore
// ---------------------------------------------------------------------------

/// Owns the live [`ParameterSet`]. Every setter clamps to the declared range;
/// a NaN write is dropped and the previous value kept.
#[derive(Debug, Clone, Default)]
pub struct ParameterStore {
    current: ParameterSet,
}

impl ParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parameters(set: ParameterSet) -> Self {
        let mut store = Self::new();
        store.set_schwarzschild_radius(set.schwarzschild_radius);
        store.set_gravity_acceleration(set.gravity_acceleration);
        store.set_integration_step(set.integration_step);
        store.set_disk_inner_limit(set.disk_inner_limit);
        store.set_disk_outer_limit(set.disk_outer_limit);
        store.set_doppler_intensity(set.doppler_intensity);
        store.set_flow_frequency(set.flow_frequency);
        store.set_near_star_density(set.near_star_density);
        store.set_distant_star_density(set.distant_star_density);
        store.set_nebula_intensity(set.nebula_intensity);
        store.set_camera_distance(set.camera_distance);
        store.set_manual_rotation(set.rotation.manual_angle());
        store.set_auto_rotation(set.rotation.is_auto());
        store
    }

    pub fn current(&self) -> &ParameterSet {
        &self.current
    }

    pub fn reset(&mut self) {
        self.current = ParameterSet::default();
    }

    /// Apply one message from the control surface.
    pub fn apply(&mut self, update: ParamUpdate) {
        match update {
            ParamUpdate::Set(control, value) => control.apply(self, value),
            ParamUpdate::Nudge(control, delta) => {
                let value = control.read(&self.current) + delta;
                control.apply(self, value);
            }
            ParamUpdate::AutoRotation(enabled) => self.set_auto_rotation(enabled),
            ParamUpdate::ToggleAutoRotation => {
                let enabled = !self.current.auto_rotation_enabled();
                self.set_auto_rotation(enabled);
            }
            ParamUpdate::ResetDefaults => self.reset(),
        }
    }

    pub fn set_schwarzschild_radius(&mut self, value: f32) {
        write_clamped(
            &mut self.current.schwarzschild_radius,
            value,
            SCHWARZSCHILD_RADIUS_RANGE,
            Control::SchwarzschildRadius,
        );
    }

    pub fn set_gravity_acceleration(&mut self, value: f32) {
        write_clamped(
            &mut self.current.gravity_acceleration,
            value,
            GRAVITY_ACCELERATION_RANGE,
            Control::GravityAcceleration,
        );
    }

    pub fn set_integration_step(&mut self, value: f32) {
        write_clamped(
            &mut self.current.integration_step,
            value,
            INTEGRATION_STEP_RANGE,
            Control::IntegrationStep,
        );
    }

    pub fn set_disk_inner_limit(&mut self, value: f32) {
        write_clamped(
            &mut self.current.disk_inner_limit,
            value,
            DISK_INNER_RANGE,
            Control::DiskInnerLimit,
        );
        self.keep_disk_ordered();
    }

    pub fn set_disk_outer_limit(&mut self, value: f32) {
        write_clamped(
            &mut self.current.disk_outer_limit,
            value,
            DISK_OUTER_RANGE,
            Control::DiskOuterLimit,
        );
        self.keep_disk_ordered();
    }

    pub fn set_doppler_intensity(&mut self, value: f32) {
        write_clamped(
            &mut self.current.doppler_intensity,
            value,
            DOPPLER_INTENSITY_RANGE,
            Control::DopplerIntensity,
        );
    }

    pub fn set_flow_frequency(&mut self, value: f32) {
        write_clamped(
            &mut self.current.flow_frequency,
            value,
            FLOW_FREQUENCY_RANGE,
            Control::FlowFrequency,
        );
    }

    pub fn set_near_star_density(&mut self, value: f32) {
        write_clamped(
            &mut self.current.near_star_density,
            value,
            NEAR_STAR_DENSITY_RANGE,
            Control::NearStarDensity,
        );
    }

    pub fn set_distant_star_density(&mut self, value: f32) {
        write_clamped(
            &mut self.current.distant_star_density,
            value,
            DISTANT_STAR_DENSITY_RANGE,
            Control::DistantStarDensity,
        );
    }

    pub fn set_nebula_intensity(&mut self, value: f32) {
        write_clamped(
            &mut self.current.nebula_intensity,
            value,
            NEBULA_INTENSITY_RANGE,
            Control::NebulaIntensity,
        );
    }

    pub fn set_camera_distance(&mut self, value: f32) {
        write_clamped(
            &mut self.current.camera_distance,
            value,
            CAMERA_DISTANCE_RANGE,
            Control::CameraDistance,
        );
    }

    /// Store a manual azimuth and switch to manual rotation in one step.
    pub fn set_manual_rotation(&mut self, value: f32) {
        let mut angle = self.current.rotation.manual_angle();
        write_clamped(
            &mut angle,
            value,
            MANUAL_ROTATION_RANGE,
            Control::ManualRotation,
        );
        self.current.rotation = RotationMode::Manual(angle);
    }

    /// Enabling parks the manual angle; disabling resumes it.
    pub fn set_auto_rotation(&mut self, enabled: bool) {
        let angle = self.current.rotation.manual_angle();
        self.current.rotation = if enabled {
            RotationMode::Auto { parked: angle }
        } else {
            RotationMode::Manual(angle)
        };
    }

    // The declared ranges cannot overlap today; this only matters if they change.
    fn keep_disk_ordered(&mut self) {
        debug_assert!(
            *DISK_INNER_RANGE.end() < *DISK_OUTER_RANGE.start(),
            "disk ranges overlap"
        );
        let set = &mut self.current;
        if set.disk_inner_limit >= set.disk_outer_limit {
            let inner = set.disk_inner_limit;
            let outer = (inner + DISK_MIN_GAP).min(*DISK_OUTER_RANGE.end());
            set.disk_outer_limit = outer;
            set.disk_inner_limit = inner.min(outer - DISK_MIN_GAP);
        }
    }
}

fn write_clamped(slot: &mut f32, value: f32, range: RangeInclusive<f32>, control: Control) {
    if value.is_nan() {
        log::warn!("ignoring NaN write to {}", control.label());
        return;
    }
    *slot = value.clamp(*range.start(), *range.end());
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
