use std::path::PathBuf;

use anyhow::{Context, Result};

use prism_engine::core::{run_scene, Scene};
use prism_engine::device::GpuInit;
use prism_engine::geometry::VertexData;
use prism_engine::logging::{init_logging, LoggingConfig};
use prism_engine::shader::load_shader_pair;
use prism_engine::window::RuntimeConfig;

const WIDTH: u32 = 640;
const HEIGHT: u32 = 480;
const TITLE: &str = "prism";

/// Unit quad centered on the origin, one color per corner.
fn quad() -> Result<(VertexData, Vec<u16>)> {
    let vertices = VertexData::from_blocks(
        &[
            [-0.5, -0.5, 0.0],
            [0.5, -0.5, 0.0],
            [0.5, 0.5, 0.0],
            [-0.5, 0.5, 0.0],
        ],
        &[
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
            [1.0, 1.0, 1.0],
        ],
    )?;

    Ok((vertices, vec![0, 1, 2, 0, 2, 3]))
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let shader_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("shaders");
    let shaders = load_shader_pair(
        shader_dir.join("perspective.vert.wgsl"),
        shader_dir.join("shader.frag.wgsl"),
    )
    .context("failed to load shaders")?;

    let (vertices, indices) = quad()?;
    let scene = Scene::new(vertices, indices, shaders);

    let config = RuntimeConfig {
        title: TITLE.to_string(),
        width: WIDTH,
        height: HEIGHT,
    };

    let summary = run_scene(&config, GpuInit::default(), &scene).context("render loop failed")?;
    log::info!("exited after {} frame(s)", summary.frames);

    Ok(())
}
