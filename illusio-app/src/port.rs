use crate::keymap;
use illusio_core::{InputEvent, Stimulus};
use illusio_experiment::{DisplayConfig, PresentationError, RenderInputPort};
use illusio_render::{find_system_font, load_font, SkiaRenderer};
use illusio_timing::{FrameLimiter, HighPrecisionTimer, Timer};
use pixels::{Pixels, SurfaceTexture};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Fullscreen, Window, WindowId};

/// Pumps attempted while waiting for the platform to hand us a window.
const WINDOW_WAIT_PUMPS: usize = 200;

struct Surface {
    window: Arc<Window>,
    pixels: Pixels<'static>,
}

/// winit callback side: owns the window and buffers translated key presses
/// until the next poll.
struct Handler {
    display: DisplayConfig,
    surface: Option<Surface>,
    events: Vec<InputEvent>,
    error: Option<PresentationError>,
}

impl Handler {
    fn create_surface(&self, event_loop: &ActiveEventLoop) -> Result<Surface, PresentationError> {
        let unavailable = |e: &dyn std::fmt::Display| PresentationError::Unavailable(e.to_string());

        let mut attributes = Window::default_attributes()
            .with_title(self.display.title.clone())
            .with_inner_size(PhysicalSize::new(self.display.width, self.display.height))
            .with_resizable(false);
        if self.display.fullscreen {
            let monitor = event_loop
                .primary_monitor()
                .or_else(|| event_loop.available_monitors().next());
            attributes = attributes.with_fullscreen(Some(Fullscreen::Borderless(monitor)));
        }

        let window = Arc::new(
            event_loop
                .create_window(attributes)
                .map_err(|e| unavailable(&e))?,
        );
        let physical_size = window.inner_size();
        let surface_texture =
            SurfaceTexture::new(physical_size.width, physical_size.height, window.clone());
        // The buffer keeps the configured size; pixels scales it to the window.
        let pixels = Pixels::new(self.display.width, self.display.height, surface_texture)
            .map_err(|e| unavailable(&e))?;

        info!(
            width = physical_size.width,
            height = physical_size.height,
            scale = window.scale_factor(),
            fullscreen = self.display.fullscreen,
            "window created"
        );
        window.set_cursor_visible(false);
        Ok(Surface { window, pixels })
    }
}

impl ApplicationHandler for Handler {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.surface.is_none() {
            match self.create_surface(event_loop) {
                Ok(surface) => self.surface = Some(surface),
                Err(err) => self.error = Some(err),
            }
        }
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.events.push(InputEvent::Quit),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key,
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                if let Some(input) = keymap::translate(physical_key) {
                    self.events.push(input);
                }
            }
            WindowEvent::Resized(size) => {
                if let Some(surface) = &mut self.surface {
                    if let Err(e) = surface.pixels.resize_surface(size.width, size.height) {
                        warn!("failed to resize surface: {e}");
                    }
                }
            }
            _ => {}
        }
    }
}

/// Window-backed render/input port: one winit event pump per poll.
pub struct WindowPort {
    event_loop: EventLoop<()>,
    handler: Handler,
    renderer: SkiaRenderer,
    timer: HighPrecisionTimer,
    limiter: FrameLimiter,
    echoed_text: Option<String>,
}

impl WindowPort {
    pub fn open(display: &DisplayConfig, timer: HighPrecisionTimer) -> Result<Self, PresentationError> {
        let event_loop =
            EventLoop::new().map_err(|e| PresentationError::Unavailable(e.to_string()))?;

        let font = match &display.font_path {
            Some(path) => match load_font(path) {
                Ok(font) => Some(font),
                Err(err) => {
                    warn!("{err:#}, falling back to a system font");
                    find_system_font()
                }
            },
            None => find_system_font(),
        };
        let renderer = SkiaRenderer::new(display.width, display.height, font)
            .map_err(|e| PresentationError::Unavailable(format!("{e:#}")))?;

        let mut port = Self {
            event_loop,
            handler: Handler {
                display: display.clone(),
                surface: None,
                events: Vec::new(),
                error: None,
            },
            renderer,
            timer,
            limiter: FrameLimiter::new(),
            echoed_text: None,
        };

        for _ in 0..WINDOW_WAIT_PUMPS {
            port.pump()?;
            if port.handler.surface.is_some() {
                return Ok(port);
            }
            port.timer.sleep(Duration::from_millis(5));
        }
        Err(PresentationError::Unavailable(
            "platform never provided a window".into(),
        ))
    }

    fn pump(&mut self) -> Result<(), PresentationError> {
        if let PumpStatus::Exit(code) = self
            .event_loop
            .pump_app_events(Some(Duration::ZERO), &mut self.handler)
        {
            debug!(code, "event loop exited");
            self.handler.events.push(InputEvent::Quit);
        }
        match self.handler.error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Without a font the text screens are blank, so mirror them on stdout.
    fn echo_text(&mut self, stimulus: &Stimulus) {
        if let Stimulus::Text { content, .. } = stimulus {
            if !self.renderer.has_font() && self.echoed_text.as_deref() != Some(content.as_str()) {
                println!("\n{content}\n");
                self.echoed_text = Some(content.clone());
            }
        }
    }
}

impl RenderInputPort for WindowPort {
    fn draw_stimulus(&mut self, stimulus: &Stimulus) -> Result<(), PresentationError> {
        // The fixation delay is a sleep, not a frame.
        if matches!(stimulus, Stimulus::Fixation) {
            self.limiter.reset();
        }
        self.echo_text(stimulus);
        let surface = self
            .handler
            .surface
            .as_mut()
            .ok_or_else(|| PresentationError::Unavailable("window is gone".into()))?;
        self.renderer
            .render(stimulus)
            .map_err(|e| PresentationError::Render(format!("{e:#}")))?;
        self.renderer
            .present(surface.pixels.frame_mut())
            .map_err(|e| PresentationError::Render(format!("{e:#}")))?;
        surface
            .pixels
            .render()
            .map_err(|e| PresentationError::Render(e.to_string()))
    }

    fn poll_events(&mut self) -> Result<Vec<InputEvent>, PresentationError> {
        self.pump()?;
        Ok(std::mem::take(&mut self.handler.events))
    }

    fn tick(&mut self, target_hz: u32) {
        self.limiter.tick(&mut self.timer, target_hz);
    }

    fn release(&mut self) {
        if let Some(surface) = self.handler.surface.take() {
            surface.window.set_cursor_visible(true);
        }
        if let Err(err) = self.pump() {
            debug!("ignoring error while closing window: {err}");
        }

        let stats = self.timer.calibration_stats();
        info!(
            frames = stats.samples,
            mean_ms = stats.average_frame_time_ns / 1_000_000.0,
            jitter_ms = stats.jitter_ns / 1_000_000.0,
            min_ms = stats.min_frame_time_ns / 1_000_000.0,
            max_ms = stats.max_frame_time_ns / 1_000_000.0,
            fps = stats.effective_fps,
            "frame timing"
        );
    }
}
