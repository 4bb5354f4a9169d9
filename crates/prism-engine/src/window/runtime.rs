use std::sync::Arc;
use std::time::Duration;

use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalPosition};
use winit::event::{ElementState, MouseButton as WinitMouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Window, WindowId};

use crate::device::InitError;
use crate::input::{InputEvent, InputState, Key, KeyState, MouseButton, MouseButtonState};

use super::system::WindowSystem;

/// How many zero-timeout pumps `open` allows for the platform to deliver
/// `resumed` and hand out the window.
const OPEN_PUMP_ATTEMPTS: usize = 64;

/// Window configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "prism".to_string(),
            width: 640,
            height: 480,
        }
    }
}

/// winit-backed window system driven by explicit pumping.
///
/// There is no `run_app`: the render loop owns control flow and calls
/// `poll_events` once per frame, which dispatches whatever the platform has
/// queued and returns.
pub struct WinitWindowSystem {
    // Handler (and the window it holds) drops before the event loop.
    handler: Handler,
    event_loop: EventLoop<()>,
}

impl WinitWindowSystem {
    /// Starts the event loop and pumps it until the window exists.
    pub fn open(config: &RuntimeConfig) -> Result<Self, InitError> {
        let mut event_loop =
            EventLoop::new().map_err(|e| InitError::BackendInitFailed(e.to_string()))?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut handler = Handler::new(config.clone());

        for _ in 0..OPEN_PUMP_ATTEMPTS {
            let status = event_loop.pump_app_events(Some(Duration::ZERO), &mut handler);

            if let Some(err) = handler.create_error.take() {
                return Err(InitError::ContextCreationFailed(err));
            }
            if handler.window.is_some() {
                return Ok(Self {
                    handler,
                    event_loop,
                });
            }
            if let PumpStatus::Exit(code) = status {
                return Err(InitError::BackendInitFailed(format!(
                    "event loop exited with code {code} before the window was created"
                )));
            }
        }

        Err(InitError::ContextCreationFailed(
            "platform never resumed the application; no window was created".to_string(),
        ))
    }

    /// Shared handle to the open window, for surface creation.
    ///
    /// Only `None` after `terminate`; `open` guarantees a window otherwise.
    pub fn window(&self) -> Option<Arc<Window>> {
        self.handler.window.clone()
    }
}

impl WindowSystem for WinitWindowSystem {
    fn poll_events(&mut self) {
        if self.handler.window.is_none() {
            return;
        }

        let status = self
            .event_loop
            .pump_app_events(Some(Duration::ZERO), &mut self.handler);

        if let PumpStatus::Exit(code) = status {
            log::debug!("event loop exited with code {code}");
            self.handler.close_requested = true;
        }
    }

    fn close_requested(&self) -> bool {
        self.handler.close_requested
    }

    fn input(&self) -> &InputState {
        &self.handler.input
    }

    fn take_resize(&mut self) -> Option<(u32, u32)> {
        self.handler.pending_resize.take()
    }

    fn terminate(&mut self) {
        if let Some(window) = self.handler.window.take() {
            window.set_visible(false);
            log::debug!("window destroyed");
        }
        self.handler.close_requested = true;
    }
}

struct Handler {
    config: RuntimeConfig,
    window: Option<Arc<Window>>,
    input: InputState,
    close_requested: bool,
    pending_resize: Option<(u32, u32)>,
    create_error: Option<String>,
}

impl Handler {
    fn new(config: RuntimeConfig) -> Self {
        Self {
            config,
            window: None,
            input: InputState::default(),
            close_requested: false,
            pending_resize: None,
            create_error: None,
        }
    }

    fn owns(&self, id: WindowId) -> bool {
        self.window.as_ref().is_some_and(|w| w.id() == id)
    }
}

impl ApplicationHandler for Handler {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(LogicalSize::new(self.config.width, self.config.height))
            .with_resizable(true);

        match event_loop.create_window(attrs) {
            Ok(window) => self.window = Some(Arc::new(window)),
            Err(e) => {
                log::error!("failed to create window: {e}");
                self.create_error = Some(e.to_string());
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        if !self.owns(window_id) {
            return;
        }
        let Some(window) = self.window.clone() else {
            return;
        };

        if let Some(ev) = translate_input_event(&window, &event) {
            self.input.apply_event(&ev);
        }

        match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                log::info!("close requested");
                self.close_requested = true;
            }

            WindowEvent::Resized(size) => {
                self.pending_resize = Some((size.width, size.height));
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                let size = window.inner_size();
                self.pending_resize = Some((size.width, size.height));
            }

            _ => {}
        }
    }
}

fn translate_input_event(window: &Window, event: &WindowEvent) -> Option<InputEvent> {
    match event {
        WindowEvent::Focused(f) => Some(InputEvent::Focused(*f)),

        WindowEvent::CursorLeft { .. } => Some(InputEvent::PointerLeft),

        WindowEvent::CursorMoved { position, .. } => {
            let (x, y) = to_logical_f32(window, *position);
            log::trace!("cursor at ({x:.1}, {y:.1})");
            Some(InputEvent::PointerMoved { x, y })
        }

        WindowEvent::MouseInput { state, button, .. } => {
            let state = match state {
                ElementState::Pressed => MouseButtonState::Pressed,
                ElementState::Released => MouseButtonState::Released,
            };

            Some(InputEvent::PointerButton {
                button: map_mouse_button(*button),
                state,
            })
        }

        WindowEvent::KeyboardInput { event, .. } => {
            let state = match event.state {
                ElementState::Pressed => KeyState::Pressed,
                ElementState::Released => KeyState::Released,
            };

            Some(InputEvent::Key {
                key: map_key(event.physical_key),
                state,
                repeat: event.repeat,
            })
        }

        _ => None,
    }
}

fn to_logical_f32(window: &Window, pos: PhysicalPosition<f64>) -> (f32, f32) {
    let scale = window.scale_factor();
    let logical = pos.to_logical::<f64>(scale);
    (logical.x as f32, logical.y as f32)
}

fn map_mouse_button(b: WinitMouseButton) -> MouseButton {
    match b {
        WinitMouseButton::Left => MouseButton::Left,
        WinitMouseButton::Right => MouseButton::Right,
        WinitMouseButton::Middle => MouseButton::Middle,
        WinitMouseButton::Back => MouseButton::Other(3),
        WinitMouseButton::Forward => MouseButton::Other(4),
        WinitMouseButton::Other(v) => MouseButton::Other(v),
    }
}

fn map_key(pk: PhysicalKey) -> Key {
    match pk {
        PhysicalKey::Code(code) => match code {
            KeyCode::ArrowUp => Key::ArrowUp,
            KeyCode::ArrowDown => Key::ArrowDown,
            KeyCode::ArrowLeft => Key::ArrowLeft,
            KeyCode::ArrowRight => Key::ArrowRight,
            other => Key::Unknown(other as u32),
        },

        // NativeKeyCode is not a u32 in winit 0.30.
        PhysicalKey::Unidentified(_) => Key::Unknown(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_small_prism_window() {
        let c = RuntimeConfig::default();
        assert_eq!((c.width, c.height), (640, 480));
        assert_eq!(c.title, "prism");
    }

    #[test]
    fn arrow_keys_map_to_named_keys() {
        assert_eq!(map_key(PhysicalKey::Code(KeyCode::ArrowLeft)), Key::ArrowLeft);
        assert_eq!(map_key(PhysicalKey::Code(KeyCode::ArrowDown)), Key::ArrowDown);
        assert!(matches!(map_key(PhysicalKey::Code(KeyCode::KeyQ)), Key::Unknown(_)));
    }

    #[test]
    fn extra_mouse_buttons_become_other() {
        assert_eq!(map_mouse_button(WinitMouseButton::Left), MouseButton::Left);
        assert_eq!(map_mouse_button(WinitMouseButton::Other(9)), MouseButton::Other(9));
    }
}
