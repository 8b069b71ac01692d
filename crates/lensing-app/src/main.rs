use std::sync::Arc;

use clap::Parser;
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

mod app;
mod backend;
mod config;
mod input;
mod panel;

use app::App;
use config::Cli;
use input::Key;

fn map_key(code: KeyCode) -> Option<Key> {
    match code {
        KeyCode::Space => Some(Key::Space),
        KeyCode::Equal | KeyCode::NumpadAdd => Some(Key::Equal),
        KeyCode::Minus | KeyCode::NumpadSubtract => Some(Key::Minus),
        KeyCode::KeyR => Some(Key::R),
        KeyCode::KeyH => Some(Key::H),
        KeyCode::KeyQ => Some(Key::Q),
        KeyCode::Escape => Some(Key::Escape),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Handler: winit ApplicationHandler
// ---------------------------------------------------------------------------

struct Handler {
    cli: Cli,
    window: Option<Arc<Window>>,
    app: Option<App>,
    /// Start-up failure, reported once the event loop has returned.
    failure: Option<anyhow::Error>,
}

impl ApplicationHandler for Handler {
    /// Called once on desktop when the event loop starts.
    /// Creates the window then initialises the GPU side.
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.app.is_some() {
            return;
        }
        let size = LogicalSize::new(self.cli.width, self.cli.height);
        let window_attrs = Window::default_attributes()
            .with_title("Black Hole")
            .with_inner_size(size);

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                self.failure = Some(anyhow::Error::new(e).context("failed to create window"));
                event_loop.exit();
                return;
            }
        };
        log::info!("Window created ({}×{})", self.cli.width, self.cli.height);

        match App::new(Arc::clone(&window), &self.cli) {
            Ok(app) => {
                self.window = Some(window);
                self.app = Some(app);
            }
            Err(e) => {
                log::error!("{e:#}");
                self.failure = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(app) = &mut self.app else {
            return;
        };
        let consumed = app.on_window_event(&event);

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested — exiting");
                event_loop.exit();
            }

            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } if !consumed => {
                if let Some(key) = map_key(code) {
                    if app.handle_action(input::on_key(key)) {
                        log::info!("Quit requested — exiting");
                        event_loop.exit();
                    }
                }
            }

            WindowEvent::Resized(new_size) => {
                app.resize(new_size.width, new_size.height);
            }

            WindowEvent::RedrawRequested => {
                app.render();
                if app.is_lost() {
                    log::error!("GPU device lost — exiting");
                    event_loop.exit();
                }
            }

            _ => {}
        }
    }

    /// Drive continuous redraws (game-loop style).
    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut handler = Handler {
        cli,
        window: None,
        app: None,
        failure: None,
    };
    event_loop.run_app(&mut handler)?;

    match handler.failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
