use crate::device::{ShaderError, ShaderStage};
use crate::geometry::{COLOR_SLOT, POSITION_SLOT};

use super::compile::{compile_stage, CompiledStage, DeclaredUniform};

/// Binding slot of a uniform in the program's uniform group.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct UniformLocation {
    binding: u32,
}

impl UniformLocation {
    pub(crate) fn new(binding: u32) -> Self {
        Self { binding }
    }

    pub fn binding(self) -> u32 {
        self.binding
    }
}

/// A reflected uniform of a linked program.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformInfo {
    pub name: String,
    pub location: UniformLocation,
    /// Size in bytes of the declared type.
    pub size: u64,
    pub is_mat4: bool,
}

/// A vertex + fragment pair that compiled, validated and links.
///
/// Holds no GPU object; `GpuDevice::create_program` turns it into one.
#[derive(Debug)]
pub struct LinkedProgram {
    vertex: CompiledStage,
    fragment: CompiledStage,
    vertex_entry: String,
    fragment_entry: String,
    uniforms: Vec<UniformInfo>,
}

impl LinkedProgram {
    /// Compiles both stages and links them.
    pub fn build(vertex_source: &str, fragment_source: &str) -> Result<Self, ShaderError> {
        let vertex = compile_stage(ShaderStage::Vertex, vertex_source)?;
        let fragment = compile_stage(ShaderStage::Fragment, fragment_source)?;
        link(vertex, fragment)
    }

    pub fn vertex_source(&self) -> &str {
        &self.vertex.source
    }

    pub fn fragment_source(&self) -> &str {
        &self.fragment.source
    }

    pub fn vertex_entry_point(&self) -> &str {
        &self.vertex_entry
    }

    pub fn fragment_entry_point(&self) -> &str {
        &self.fragment_entry
    }

    pub fn uniforms(&self) -> &[UniformInfo] {
        &self.uniforms
    }

    pub fn uniform(&self, name: &str) -> Option<&UniformInfo> {
        self.uniforms.iter().find(|u| u.name == name)
    }
}

fn link(vertex: CompiledStage, fragment: CompiledStage) -> Result<LinkedProgram, ShaderError> {
    let vertex_entry = vertex
        .entry_point()
        .ok_or_else(|| ShaderError::Link("vertex module has no @vertex entry point".into()))?
        .to_string();
    let fragment_entry = fragment
        .entry_point()
        .ok_or_else(|| {
            ShaderError::Link("fragment module has no @fragment entry point".into())
        })?
        .to_string();

    // The buffer set feeds exactly these attribute slots.
    let fed = [POSITION_SLOT, COLOR_SLOT];
    if let Some(unfed) = vertex
        .input_locations(&vertex_entry)
        .into_iter()
        .find(|l| !fed.contains(l))
    {
        return Err(ShaderError::Link(format!(
            "vertex input @location({unfed}) has no attribute; only {POSITION_SLOT} (position) \
             and {COLOR_SLOT} (color) are provided"
        )));
    }

    let produced = vertex.output_locations(&vertex_entry);
    let consumed = fragment.input_locations(&fragment_entry);
    if let Some(missing) = consumed.difference(&produced).next() {
        return Err(ShaderError::Link(format!(
            "fragment input @location({missing}) is not written by the vertex stage"
        )));
    }

    let mut declared: Vec<DeclaredUniform> = vertex.uniforms()?;
    for u in fragment.uniforms()? {
        match declared.iter().find(|d| d.binding == u.binding || d.name == u.name) {
            Some(d) if *d == u => {}
            Some(d) => {
                return Err(ShaderError::Link(format!(
                    "uniform `{}` (binding {}, {} bytes) in the fragment stage conflicts \
                     with `{}` (binding {}, {} bytes) in the vertex stage",
                    u.name, u.binding, u.size, d.name, d.binding, d.size
                )));
            }
            None => declared.push(u),
        }
    }

    if let Some(u) = declared.iter().find(|u| u.group != 0) {
        return Err(ShaderError::Link(format!(
            "uniform `{}` is in @group({}); only @group(0) is supported",
            u.name, u.group
        )));
    }

    declared.sort_by_key(|u| u.binding);
    let uniforms = declared
        .into_iter()
        .map(|u| UniformInfo {
            name: u.name,
            location: UniformLocation::new(u.binding),
            size: u.size,
            is_mat4: u.is_mat4,
        })
        .collect();

    Ok(LinkedProgram {
        vertex,
        fragment,
        vertex_entry,
        fragment_entry,
        uniforms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const VS: &str = r#"
@group(0) @binding(0) var<uniform> modelview_projection: mat4x4<f32>;

struct VsOut {
    @builtin(position) clip: vec4<f32>,
    @location(0) color: vec3<f32>,
};

@vertex
fn vs_main(@location(0) pos: vec3<f32>, @location(1) color: vec3<f32>) -> VsOut {
    var out: VsOut;
    out.clip = modelview_projection * vec4<f32>(pos, 1.0);
    out.color = color;
    return out;
}
"#;

    const FS: &str = r#"
@fragment
fn fs_main(@location(0) color: vec3<f32>) -> @location(0) vec4<f32> {
    return vec4<f32>(color, 1.0);
}
"#;

    #[test]
    fn matching_pair_links_and_exposes_mvp() {
        let p = LinkedProgram::build(VS, FS).unwrap();
        assert_eq!(p.vertex_entry_point(), "vs_main");
        assert_eq!(p.fragment_entry_point(), "fs_main");

        let mvp = p.uniform("modelview_projection").unwrap();
        assert_eq!(mvp.location.binding(), 0);
        assert!(mvp.is_mat4);
        assert!(p.uniform("missing").is_none());
    }

    #[test]
    fn fragment_reading_unwritten_location_fails_link() {
        let fs = r#"
@fragment
fn fs_main(@location(3) uv: vec2<f32>) -> @location(0) vec4<f32> {
    return vec4<f32>(uv, 0.0, 1.0);
}
"#;
        assert!(matches!(LinkedProgram::build(VS, fs), Err(ShaderError::Link(_))));
    }

    #[test]
    fn vertex_input_without_attribute_fails_link() {
        let vs = r#"
@vertex
fn vs_main(
    @location(0) pos: vec3<f32>,
    @location(5) extra: vec2<f32>,
) -> @builtin(position) vec4<f32> {
    return vec4<f32>(pos.xy + extra, pos.z, 1.0);
}
"#;
        let fs = r#"
@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(1.0);
}
"#;
        let err = LinkedProgram::build(vs, fs).unwrap_err();
        assert!(matches!(err, ShaderError::Link(ref m) if m.contains("@location(5)")));
    }

    #[test]
    fn vertex_reading_position_only_links() {
        let vs = r#"
@vertex
fn vs_main(@location(0) pos: vec3<f32>) -> @builtin(position) vec4<f32> {
    return vec4<f32>(pos, 1.0);
}
"#;
        let fs = r#"
@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(1.0);
}
"#;
        assert!(LinkedProgram::build(vs, fs).is_ok());
    }

    #[test]
    fn swapped_stages_fail_link() {
        assert!(matches!(LinkedProgram::build(FS, VS), Err(ShaderError::Link(_))));
    }

    #[test]
    fn conflicting_uniform_declarations_fail_link() {
        let fs = r#"
@group(0) @binding(0) var<uniform> tint: vec4<f32>;

@fragment
fn fs_main(@location(0) color: vec3<f32>) -> @location(0) vec4<f32> {
    return vec4<f32>(color, 1.0) * tint;
}
"#;
        assert!(matches!(LinkedProgram::build(VS, fs), Err(ShaderError::Link(_))));
    }

    #[test]
    fn shared_uniform_with_same_declaration_links_once() {
        let fs = r#"
@group(0) @binding(0) var<uniform> modelview_projection: mat4x4<f32>;

@fragment
fn fs_main(@location(0) color: vec3<f32>) -> @location(0) vec4<f32> {
    return modelview_projection * vec4<f32>(color, 1.0);
}
"#;
        let p = LinkedProgram::build(VS, fs).unwrap();
        assert_eq!(p.uniforms().len(), 1);
    }

    #[test]
    fn compile_error_reports_stage() {
        let err = LinkedProgram::build(VS, "not wgsl at all").unwrap_err();
        assert!(matches!(
            err,
            ShaderError::Compile {
                stage: ShaderStage::Fragment,
                ..
            }
        ));
    }
}
