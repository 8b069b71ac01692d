pub mod context;
pub mod error;
pub mod kernel;
pub mod present;

pub use context::{kernel_capability, GpuContext};
pub use error::GpuError;
pub use kernel::{FrameTarget, LensingKernel, TARGET_FORMAT};
pub use present::FramePresenter;
