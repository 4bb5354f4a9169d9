use crate::input::InputState;

/// Window system primitives the context lifecycle is built on.
///
/// `WinitWindowSystem` is the production implementation; tests script their
/// own to drive the render loop without a display.
pub trait WindowSystem {
    /// Drains pending platform events without blocking and folds them into
    /// the input state and close flag.
    fn poll_events(&mut self);

    /// Set by the platform (window closed, event loop exited). Never set by
    /// the render loop.
    fn close_requested(&self) -> bool;

    fn input(&self) -> &InputState;

    /// Latest framebuffer size reported since the previous call, in physical
    /// pixels.
    fn take_resize(&mut self) -> Option<(u32, u32)>;

    /// Destroys the window. Called once by `Context` after every GPU object
    /// has been released.
    fn terminate(&mut self);
}
