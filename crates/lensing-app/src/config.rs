use clap::{Parser, ValueEnum};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum PresentModeArg {
    Fifo,
    Mailbox,
    Immediate,
}

impl From<PresentModeArg> for wgpu::PresentMode {
    fn from(mode: PresentModeArg) -> Self {
        match mode {
            PresentModeArg::Fifo => wgpu::PresentMode::Fifo,
            PresentModeArg::Mailbox => wgpu::PresentMode::Mailbox,
            PresentModeArg::Immediate => wgpu::PresentMode::Immediate,
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Real-time lensed black hole viewer")]
pub struct Cli {
    /// Initial window width in logical pixels
    #[arg(long, default_value_t = 1280)]
    pub width: u32,
    /// Initial window height in logical pixels
    #[arg(long, default_value_t = 720)]
    pub height: u32,
    /// Preferred workgroup width for the lensing kernel
    #[arg(long, default_value_t = 32)]
    pub tile_width: u32,
    #[arg(long, value_enum, default_value_t = PresentModeArg::Fifo)]
    pub present_mode: PresentModeArg,
    /// Start with the control panel hidden (toggle with H)
    #[arg(long)]
    pub hide_controls: bool,
}
