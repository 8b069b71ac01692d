/// Nominal duration of one frame, in seconds.
pub const FRAME_DURATION: f32 = 1.0 / 60.0;
/// Auto-rotation increment per frame, in radians.
pub const AUTO_ROTATION_STEP: f32 = 0.002;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SimulationState {
    pub elapsed_time: f32,
    pub auto_angle: f32,
    pub frame: u64,
}

/// Simulated, not measured, clock: every `advance` adds a fixed step no
/// matter how long the frame really took.
#[derive(Debug, Clone)]
pub struct SimulationClock {
    state: SimulationState,
    frame_duration: f32,
    angle_step: f32,
}

impl SimulationClock {
    pub fn new() -> Self {
        Self::with_step(FRAME_DURATION, AUTO_ROTATION_STEP)
    }

    pub fn with_step(frame_duration: f32, angle_step: f32) -> Self {
        Self {
            state: SimulationState::default(),
            frame_duration,
            angle_step,
        }
    }

    pub fn advance(&mut self) {
        self.state.elapsed_time += self.frame_duration;
        self.state.auto_angle += self.angle_step;
        self.state.frame += 1;
    }

    pub fn state(&self) -> SimulationState {
        self.state
    }
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self::new()
    }
}
