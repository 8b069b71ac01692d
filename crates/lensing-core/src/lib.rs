pub mod clock;
pub mod controls;
pub mod dispatch;
pub mod driver;
pub mod params;
pub mod snapshot;

pub use clock::{SimulationClock, SimulationState};
pub use controls::{Control, ControlHandle, ParamUpdate, UpdateQueue};
pub use dispatch::{DispatchPlanner, DispatchShape, KernelCapability};
pub use driver::{FrameDriver, FrameOutcome, FrameStats};
pub use params::{ParameterSet, ParameterStore, RotationMode};
pub use snapshot::UniformSnapshot;

// ---------------------------------------------------------------------------
// Frame backend: the seam between the frame loop and the GPU
// ---------------------------------------------------------------------------

/// Why a frame was dropped instead of presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Drawable has zero width or height (minimised window).
    EmptyDrawable,
    /// No presentable surface texture this tick.
    Drawable,
    /// No command submission object.
    Submission,
    /// No work encoder.
    Encoder,
}

/// Everything the frame loop needs from the device side.
///
/// [`FrameDriver::frame`] calls these in a fixed order: `acquire_drawable`,
/// `begin_submission`, `encode`, `submit`, `present`. Any `Err` drops the
/// frame; nothing is retried.
pub trait FrameBackend {
    type Drawable;
    type Submission;

    fn acquire_drawable(&mut self) -> Result<Self::Drawable, SkipReason>;

    fn begin_submission(&mut self) -> Result<Self::Submission, SkipReason>;

    /// Record the kernel dispatch with `snapshot` as its only parameter input
    /// and the drawable's frame target as its only write target.
    fn encode(
        &mut self,
        submission: &mut Self::Submission,
        drawable: &Self::Drawable,
        snapshot: &UniformSnapshot,
        shape: &DispatchShape,
    ) -> Result<(), SkipReason>;

    /// Hand the recorded work to the device without waiting on it.
    fn submit(&mut self, submission: Self::Submission);

    fn present(&mut self, drawable: Self::Drawable);
}
