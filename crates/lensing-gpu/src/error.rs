use thiserror::Error;

/// Start-up failures. None of these are recoverable: without them no frame
/// can ever be produced.
#[derive(Debug, Error)]
pub enum GpuError {
    #[error("failed to create wgpu surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("no suitable GPU adapter found")]
    NoAdapter,

    #[error("failed to create GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("surface is not supported by adapter {0}")]
    UnsupportedSurface(String),

    #[error("{label} pipeline failed validation: {message}")]
    Pipeline { label: &'static str, message: String },
}
