use crate::input::InputState;
use crate::window::{RuntimeConfig, WindowSystem, WinitWindowSystem};

use super::backend::{GpuDevice, ResourceId};
use super::error::InitError;
use super::gpu::{GpuInit, WgpuDevice};

/// Kind of a GPU object tracked by the context ledger.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ResourceKind {
    VertexArray,
    Buffer,
    Program,
}

/// The open drawing surface: window system + GPU device, owned together.
///
/// Every GPU-touching operation in the crate takes `&mut Context`, so the
/// context is "current" for exactly the code holding that borrow. The context
/// also keeps a ledger of live GPU objects in acquisition order; `terminate`
/// releases anything still outstanding in reverse order before tearing down
/// the device and window.
pub struct Context<W: WindowSystem, G: GpuDevice> {
    // Field order is drop order: the device (and its surface) goes before the
    // window system.
    gpu: G,
    window: W,
    live: Vec<(ResourceId, ResourceKind)>,
    terminated: bool,
}

/// Context backed by winit + wgpu.
pub type NativeContext = Context<WinitWindowSystem, WgpuDevice>;

impl NativeContext {
    /// Opens the window and creates a GPU context bound to it.
    ///
    /// Fails with `BackendInitFailed` when the event loop cannot start and
    /// `ContextCreationFailed` when the window, surface, adapter or device
    /// cannot be created.
    pub fn initialize(config: &RuntimeConfig, gpu_init: GpuInit) -> Result<Self, InitError> {
        let window_system = WinitWindowSystem::open(config)?;
        let window = window_system.window().ok_or_else(|| {
            InitError::ContextCreationFailed("window closed during setup".to_string())
        })?;

        let gpu = pollster::block_on(WgpuDevice::new(window, gpu_init))
            .map_err(|e| InitError::ContextCreationFailed(format!("{e:#}")))?;

        log::info!(
            "context created: {}x{} \"{}\"",
            config.width,
            config.height,
            config.title
        );

        Ok(Context::from_parts(window_system, gpu))
    }
}

impl<W: WindowSystem, G: GpuDevice> Context<W, G> {
    /// Assembles a context from an already opened window system and device.
    pub fn from_parts(window: W, gpu: G) -> Self {
        Self {
            gpu,
            window,
            live: Vec::new(),
            terminated: false,
        }
    }

    /// Close-request flag owned by the window system.
    pub fn should_close(&self) -> bool {
        self.window.close_requested()
    }

    pub fn swap_buffers(&mut self) {
        self.gpu.present();
    }

    /// Drains pending window events and applies framebuffer resizes.
    pub fn poll_events(&mut self) {
        self.window.poll_events();

        if let Some((width, height)) = self.window.take_resize() {
            log::debug!("framebuffer resized to {width}x{height}");
            self.gpu.resize(width, height);
        }
    }

    pub fn input(&self) -> &InputState {
        self.window.input()
    }

    pub fn gpu(&self) -> &G {
        &self.gpu
    }

    pub fn gpu_mut(&mut self) -> &mut G {
        &mut self.gpu
    }

    pub fn window_system(&self) -> &W {
        &self.window
    }

    pub fn window_system_mut(&mut self) -> &mut W {
        &mut self.window
    }

    /// Number of GPU objects acquired and not yet released.
    pub fn outstanding_resources(&self) -> usize {
        self.live.len()
    }

    pub(crate) fn acquire(&mut self, id: ResourceId, kind: ResourceKind) {
        log::debug!("acquired {kind:?} {}", id.raw());
        self.live.push((id, kind));
    }

    /// Removes `id` from the ledger. Returns `false` if it was not live.
    pub(crate) fn release(&mut self, id: ResourceId) -> bool {
        match self.live.iter().position(|(live, _)| *live == id) {
            Some(index) => {
                let (_, kind) = self.live.remove(index);
                log::debug!("released {kind:?} {}", id.raw());
                true
            }
            None => false,
        }
    }

    /// Tears down the device and window. Consumes the context.
    ///
    /// Callers release their GPU objects first; anything left in the ledger is
    /// reported and deleted here, newest first, so the device never outlives
    /// its objects' owners or vice versa.
    pub fn terminate(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if self.terminated {
            return;
        }
        self.terminated = true;

        if !self.live.is_empty() {
            log::warn!(
                "terminating with {} outstanding GPU resource(s); releasing them now",
                self.live.len()
            );
        }

        while let Some((id, kind)) = self.live.pop() {
            match kind {
                ResourceKind::VertexArray => self.gpu.delete_vertex_array(id),
                ResourceKind::Buffer => self.gpu.delete_buffer(id),
                ResourceKind::Program => self.gpu.delete_program(id),
            }
        }

        self.window.terminate();
        log::info!("context terminated");
    }
}

impl<W: WindowSystem, G: GpuDevice> Drop for Context<W, G> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
