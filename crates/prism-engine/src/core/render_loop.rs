use std::time::{Duration, Instant};

use glam::{Mat4, Vec3};

use crate::device::{Context, GpuDevice, GpuInit, NativeContext};
use crate::geometry::BufferSet;
use crate::input::{self, InputMapper, InputSnapshot};
use crate::shader::{set_mat4_uniform, ShaderProgram, UniformLocation};
use crate::transform::TransformState;
use crate::window::{RuntimeConfig, WindowSystem};

use super::error::CoreError;
use super::scene::Scene;

/// Render loop lifecycle.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LoopState {
    Init,
    Running,
    Terminating,
    Stopped,
}

/// What a finished run reports.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub frames: u64,
    pub elapsed: Duration,
    pub final_state: LoopState,
}

/// Owns the context and every GPU object of the scene for the lifetime of
/// the loop.
///
/// Setup order is context, buffers, program; teardown is the reverse. Each
/// frame runs update, draw, sample, poll, in that order.
pub struct RenderLoop<W: WindowSystem, G: GpuDevice> {
    ctx: Context<W, G>,
    buffers: BufferSet,
    program: ShaderProgram,
    mvp_location: UniformLocation,
    transform: TransformState,
    mapper: InputMapper,
    snapshot: InputSnapshot,
    clear_color: [f32; 4],
    state: LoopState,
    frames: u64,
    started: Instant,
}

impl<W: WindowSystem, G: GpuDevice> RenderLoop<W, G> {
    /// Uploads the geometry, builds the program and the initial transform.
    ///
    /// On failure everything acquired so far is released, newest first, the
    /// context is terminated and the error is returned.
    pub fn setup(
        mut ctx: Context<W, G>,
        scene: &Scene,
        aspect: f32,
        mapper: InputMapper,
    ) -> Result<Self, CoreError> {
        log::debug!("loop state: {:?}", LoopState::Init);

        let mut buffers = match BufferSet::upload(&mut ctx, &scene.vertices, &scene.indices) {
            Ok(buffers) => buffers,
            Err(e) => {
                abort_setup(ctx);
                return Err(e.into());
            }
        };

        let mut program = match ShaderProgram::compile_and_link(
            &mut ctx,
            &scene.shaders.vertex,
            &scene.shaders.fragment,
        ) {
            Ok(program) => program,
            Err(e) => {
                let _ = buffers.release(&mut ctx);
                abort_setup(ctx);
                return Err(e.into());
            }
        };

        let mvp_location = match program.mat4_location(&scene.mvp_uniform) {
            Ok(location) => location,
            Err(e) => {
                let _ = program.destroy(&mut ctx);
                let _ = buffers.release(&mut ctx);
                abort_setup(ctx);
                return Err(e.into());
            }
        };

        let transform = TransformState::new(&scene.camera, aspect);
        log::debug!("initial model-view: {:?}", transform.model_view());
        log::debug!("projection: {:?}", transform.projection());

        program.use_program(&mut ctx);
        set_mat4_uniform(&mut ctx, mvp_location, &transform.mvp());

        log::info!(
            "setup complete: {} indices, program {}",
            buffers.index_count(),
            program.id().raw()
        );

        Ok(Self {
            ctx,
            buffers,
            program,
            mvp_location,
            transform,
            mapper,
            snapshot: InputSnapshot::default(),
            clear_color: scene.clear_color,
            state: LoopState::Init,
            frames: 0,
            started: Instant::now(),
        })
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn context(&self) -> &Context<W, G> {
        &self.ctx
    }

    pub fn transform(&self) -> &TransformState {
        &self.transform
    }

    /// Input sampled at the end of the last frame.
    pub fn snapshot(&self) -> &InputSnapshot {
        &self.snapshot
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Runs frames until the window system requests close, then tears down.
    pub fn run(mut self) -> RunSummary {
        self.enter(LoopState::Running);
        self.started = Instant::now();

        while !self.ctx.should_close() {
            self.frame();
        }

        log::info!("close requested after {} frame(s)", self.frames);
        self.shutdown()
    }

    /// One iteration: update transform, draw, sample input, poll events.
    pub fn frame(&mut self) {
        if self.state == LoopState::Init {
            self.enter(LoopState::Running);
        }

        let delta = self.mapper.to_translation_delta(&self.snapshot);
        let mvp = self.transform.update(delta);
        if delta != Vec3::ZERO {
            log::trace!("translation now {:?}", self.transform.translation());
        }

        self.draw(&mvp);

        self.snapshot = input::sample(&self.ctx);
        self.ctx.poll_events();
        self.frames += 1;
    }

    fn draw(&mut self, mvp: &Mat4) {
        self.ctx.gpu_mut().clear(self.clear_color);
        self.buffers.bind(&mut self.ctx);
        self.program.use_program(&mut self.ctx);
        set_mat4_uniform(&mut self.ctx, self.mvp_location, mvp);
        self.ctx
            .gpu_mut()
            .draw_indexed_triangles(self.buffers.index_count());
        self.ctx.swap_buffers();
    }

    /// Releases the program, then the buffers, then terminates the context.
    pub fn shutdown(mut self) -> RunSummary {
        self.enter(LoopState::Terminating);

        if let Err(e) = self.program.destroy(&mut self.ctx) {
            log::warn!("{e}");
        }
        if let Err(e) = self.buffers.release(&mut self.ctx) {
            log::warn!("{e}");
        }

        let summary = RunSummary {
            frames: self.frames,
            elapsed: self.started.elapsed(),
            final_state: LoopState::Stopped,
        };

        self.ctx.terminate();
        log::debug!("loop state: {:?}", LoopState::Stopped);
        log::info!(
            "rendered {} frame(s) in {:.2?}",
            summary.frames,
            summary.elapsed
        );
        summary
    }

    fn enter(&mut self, next: LoopState) {
        log::debug!("loop state: {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}

fn abort_setup<W: WindowSystem, G: GpuDevice>(ctx: Context<W, G>) {
    log::debug!("loop state: {:?}", LoopState::Terminating);
    ctx.terminate();
    log::debug!("loop state: {:?}", LoopState::Stopped);
}

/// Opens the window, sets up `scene` and runs it until the window closes.
pub fn run_scene(
    config: &RuntimeConfig,
    gpu_init: GpuInit,
    scene: &Scene,
) -> Result<RunSummary, CoreError> {
    let ctx = NativeContext::initialize(config, gpu_init)?;
    let aspect = config.width.max(1) as f32 / config.height.max(1) as f32;

    let render_loop = RenderLoop::setup(ctx, scene, aspect, InputMapper::default())?;
    Ok(render_loop.run())
}
