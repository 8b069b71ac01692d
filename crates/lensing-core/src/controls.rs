use std::ops::RangeInclusive;
use std::sync::mpsc::{self, Receiver, Sender};

use crate::params::{self, ParameterSet, ParameterStore};

// ---------------------------------------------------------------------------
// Control: declarative table of every slider-backed parameter
// ---------------------------------------------------------------------------

/// One slider-backed field of the [`ParameterSet`].
///
/// The control surface iterates [`Control::ALL`] and routes values through
/// [`Control::apply`]; it never needs a closure per widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    SchwarzschildRadius,
    GravityAcceleration,
    IntegrationStep,
    DiskInnerLimit,
    DiskOuterLimit,
    DopplerIntensity,
    FlowFrequency,
    NearStarDensity,
    DistantStarDensity,
    NebulaIntensity,
    CameraDistance,
    ManualRotation,
}

impl Control {
    pub const ALL: [Control; 12] = [
        Control::SchwarzschildRadius,
        Control::GravityAcceleration,
        Control::IntegrationStep,
        Control::DiskInnerLimit,
        Control::DiskOuterLimit,
        Control::DopplerIntensity,
        Control::FlowFrequency,
        Control::NearStarDensity,
        Control::DistantStarDensity,
        Control::NebulaIntensity,
        Control::CameraDistance,
        Control::ManualRotation,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Control::SchwarzschildRadius => "Schwarzschild radius (rs)",
            Control::GravityAcceleration => "Gravity (acceleration)",
            Control::IntegrationStep => "Integration step (dt)",
            Control::DiskInnerLimit => "Disk: inner limit",
            Control::DiskOuterLimit => "Disk: outer limit",
            Control::DopplerIntensity => "Doppler effect",
            Control::FlowFrequency => "Flow frequency",
            Control::NearStarDensity => "Near stars",
            Control::DistantStarDensity => "Distant stars",
            Control::NebulaIntensity => "Nebula intensity",
            Control::CameraDistance => "Camera distance (zoom)",
            Control::ManualRotation => "Manual rotation",
        }
    }

    pub fn range(self) -> RangeInclusive<f32> {
        match self {
            Control::SchwarzschildRadius => params::SCHWARZSCHILD_RADIUS_RANGE,
            Control::GravityAcceleration => params::GRAVITY_ACCELERATION_RANGE,
            Control::IntegrationStep => params::INTEGRATION_STEP_RANGE,
            Control::DiskInnerLimit => params::DISK_INNER_RANGE,
            Control::DiskOuterLimit => params::DISK_OUTER_RANGE,
            Control::DopplerIntensity => params::DOPPLER_INTENSITY_RANGE,
            Control::FlowFrequency => params::FLOW_FREQUENCY_RANGE,
            Control::NearStarDensity => params::NEAR_STAR_DENSITY_RANGE,
            Control::DistantStarDensity => params::DISTANT_STAR_DENSITY_RANGE,
            Control::NebulaIntensity => params::NEBULA_INTENSITY_RANGE,
            Control::CameraDistance => params::CAMERA_DISTANCE_RANGE,
            Control::ManualRotation => params::MANUAL_ROTATION_RANGE,
        }
    }

    pub fn default_value(self) -> f32 {
        self.read(&ParameterSet::default())
    }

    /// Current value of this control's field.
    pub fn read(self, set: &ParameterSet) -> f32 {
        match self {
            Control::SchwarzschildRadius => set.schwarzschild_radius,
            Control::GravityAcceleration => set.gravity_acceleration,
            Control::IntegrationStep => set.integration_step,
            Control::DiskInnerLimit => set.disk_inner_limit,
            Control::DiskOuterLimit => set.disk_outer_limit,
            Control::DopplerIntensity => set.doppler_intensity,
            Control::FlowFrequency => set.flow_frequency,
            Control::NearStarDensity => set.near_star_density,
            Control::DistantStarDensity => set.distant_star_density,
            Control::NebulaIntensity => set.nebula_intensity,
            Control::CameraDistance => set.camera_distance,
            Control::ManualRotation => set.manual_rotation_angle(),
        }
    }

    pub fn apply(self, store: &mut ParameterStore, value: f32) {
        match self {
            Control::SchwarzschildRadius => store.set_schwarzschild_radius(value),
            Control::GravityAcceleration => store.set_gravity_acceleration(value),
            Control::IntegrationStep => store.set_integration_step(value),
            Control::DiskInnerLimit => store.set_disk_inner_limit(value),
            Control::DiskOuterLimit => store.set_disk_outer_limit(value),
            Control::DopplerIntensity => store.set_doppler_intensity(value),
            Control::FlowFrequency => store.set_flow_frequency(value),
            Control::NearStarDensity => store.set_near_star_density(value),
            Control::DistantStarDensity => store.set_distant_star_density(value),
            Control::NebulaIntensity => store.set_nebula_intensity(value),
            Control::CameraDistance => store.set_camera_distance(value),
            Control::ManualRotation => store.set_manual_rotation(value),
        }
    }
}

// ---------------------------------------------------------------------------
// ParamUpdate + queue
// ---------------------------------------------------------------------------

/// A single write from the control surface. Each message is applied whole,
/// so the manual-rotation compound write can never be observed half done.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamUpdate {
    Set(Control, f32),
    /// Relative change, resolved against the value current when drained.
    Nudge(Control, f32),
    AutoRotation(bool),
    /// Flip auto rotation relative to the value current when drained.
    ToggleAutoRotation,
    ResetDefaults,
}

/// Cloneable sending side handed to control surfaces, on any thread.
#[derive(Debug, Clone)]
pub struct ControlHandle {
    tx: Sender<ParamUpdate>,
}

impl ControlHandle {
    /// Queue an update for the next frame. Returns false once the frame loop
    /// is gone.
    pub fn send(&self, update: ParamUpdate) -> bool {
        self.tx.send(update).is_ok()
    }

    pub fn set(&self, control: Control, value: f32) -> bool {
        self.send(ParamUpdate::Set(control, value))
    }
}

/// Receiving side, owned by the frame loop.
#[derive(Debug)]
pub struct UpdateQueue {
    rx: Receiver<ParamUpdate>,
    tx: Sender<ParamUpdate>,
}

impl UpdateQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { rx, tx }
    }

    pub fn handle(&self) -> ControlHandle {
        ControlHandle { tx: self.tx.clone() }
    }

    /// Apply everything queued so far, in arrival order. Returns the count.
    pub fn drain_into(&self, store: &mut ParameterStore) -> usize {
        let mut applied = 0;
        for update in self.rx.try_iter() {
            store.apply(update);
            applied += 1;
        }
        applied
    }
}

impl Default for UpdateQueue {
    fn default() -> Self {
        Self::new()
    }
}
