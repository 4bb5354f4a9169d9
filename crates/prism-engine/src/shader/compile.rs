use std::collections::BTreeSet;

use wgpu::naga;
use wgpu::naga::valid::{Capabilities, ValidationFlags, Validator};

use crate::device::{ShaderError, ShaderStage};

/// A validated WGSL module for one pipeline stage.
#[derive(Debug)]
pub(crate) struct CompiledStage {
    pub stage: ShaderStage,
    pub source: String,
    pub module: naga::Module,
}

/// A `var<uniform>` global as declared in WGSL.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DeclaredUniform {
    pub name: String,
    pub group: u32,
    pub binding: u32,
    pub size: u64,
    pub is_mat4: bool,
}

/// Parses and validates `source` as the given stage.
///
/// Diagnostics are naga's rendered messages (with source snippets), so the
/// operator sees the same text a shader toolchain would print.
pub(crate) fn compile_stage(
    stage: ShaderStage,
    source: &str,
) -> Result<CompiledStage, ShaderError> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| ShaderError::Compile {
        stage,
        message: e.emit_to_string(source),
    })?;

    Validator::new(ValidationFlags::all(), Capabilities::empty())
        .validate(&module)
        .map_err(|e| ShaderError::Compile {
            stage,
            message: e.emit_to_string(source),
        })?;

    Ok(CompiledStage {
        stage,
        source: source.to_string(),
        module,
    })
}

impl CompiledStage {
    /// Name of the first entry point declared for this stage.
    pub fn entry_point(&self) -> Option<&str> {
        let wanted = match self.stage {
            ShaderStage::Vertex => naga::ShaderStage::Vertex,
            ShaderStage::Fragment => naga::ShaderStage::Fragment,
        };

        self.module
            .entry_points
            .iter()
            .find(|ep| ep.stage == wanted)
            .map(|ep| ep.name.as_str())
    }

    /// User-defined `@location`s of the named entry point's inputs.
    pub fn input_locations(&self, entry: &str) -> BTreeSet<u32> {
        let mut out = BTreeSet::new();
        if let Some(ep) = self.module.entry_points.iter().find(|ep| ep.name == entry) {
            for arg in &ep.function.arguments {
                self.collect_locations(arg.binding.as_ref(), arg.ty, &mut out);
            }
        }
        out
    }

    /// User-defined `@location`s of the named entry point's result.
    pub fn output_locations(&self, entry: &str) -> BTreeSet<u32> {
        let mut out = BTreeSet::new();
        if let Some(ep) = self.module.entry_points.iter().find(|ep| ep.name == entry) {
            if let Some(result) = &ep.function.result {
                self.collect_locations(result.binding.as_ref(), result.ty, &mut out);
            }
        }
        out
    }

    fn collect_locations(
        &self,
        binding: Option<&naga::Binding>,
        ty: naga::Handle<naga::Type>,
        out: &mut BTreeSet<u32>,
    ) {
        match binding {
            Some(naga::Binding::Location { location, .. }) => {
                out.insert(*location);
            }
            Some(naga::Binding::BuiltIn(_)) => {}
            None => {
                if let naga::TypeInner::Struct { members, .. } = &self.module.types[ty].inner {
                    for member in members {
                        if let Some(naga::Binding::Location { location, .. }) = &member.binding {
                            out.insert(*location);
                        }
                    }
                }
            }
        }
    }

    /// Reflects the module's resource globals.
    ///
    /// Only uniform buffers are supported; textures, samplers and storage
    /// buffers are rejected so a program never links with bindings the device
    /// cannot feed.
    pub fn uniforms(&self) -> Result<Vec<DeclaredUniform>, ShaderError> {
        let mut out = Vec::new();

        for (_, global) in self.module.global_variables.iter() {
            let name = global.name.clone().unwrap_or_default();

            match global.space {
                naga::AddressSpace::Uniform => {
                    let Some(rb) = &global.binding else {
                        return Err(ShaderError::Link(format!(
                            "{} uniform `{name}` has no @group/@binding",
                            self.stage
                        )));
                    };
                    let inner = &self.module.types[global.ty].inner;
                    out.push(DeclaredUniform {
                        name,
                        group: rb.group,
                        binding: rb.binding,
                        size: inner.size(self.module.to_ctx()) as u64,
                        is_mat4: is_mat4x4_f32(inner),
                    });
                }
                naga::AddressSpace::Handle | naga::AddressSpace::Storage { .. } => {
                    return Err(ShaderError::Link(format!(
                        "{} global `{name}` is not a uniform buffer; \
                         only var<uniform> is supported",
                        self.stage
                    )));
                }
                _ => {}
            }
        }

        Ok(out)
    }
}

fn is_mat4x4_f32(inner: &naga::TypeInner) -> bool {
    matches!(
        inner,
        naga::TypeInner::Matrix {
            columns: naga::VectorSize::Quad,
            rows: naga::VectorSize::Quad,
            scalar,
        } if *scalar == naga::Scalar::F32
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const VS: &str = r#"
@group(0) @binding(0) var<uniform> mvp: mat4x4<f32>;

struct VsOut {
    @builtin(position) clip: vec4<f32>,
    @location(0) color: vec3<f32>,
};

@vertex
fn vs_main(@location(0) pos: vec3<f32>, @location(1) color: vec3<f32>) -> VsOut {
    var out: VsOut;
    out.clip = mvp * vec4<f32>(pos, 1.0);
    out.color = color;
    return out;
}
"#;

    #[test]
    fn valid_vertex_stage_reflects_entry_and_locations() {
        let stage = compile_stage(ShaderStage::Vertex, VS).unwrap();
        assert_eq!(stage.entry_point(), Some("vs_main"));
        assert_eq!(stage.input_locations("vs_main").into_iter().collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(stage.output_locations("vs_main").into_iter().collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn mat4_uniform_is_reflected_with_size() {
        let stage = compile_stage(ShaderStage::Vertex, VS).unwrap();
        let uniforms = stage.uniforms().unwrap();
        assert_eq!(uniforms.len(), 1);
        assert_eq!(uniforms[0].name, "mvp");
        assert_eq!((uniforms[0].group, uniforms[0].binding), (0, 0));
        assert_eq!(uniforms[0].size, 64);
        assert!(uniforms[0].is_mat4);
    }

    #[test]
    fn syntax_error_is_a_compile_error_for_that_stage() {
        let err = compile_stage(ShaderStage::Fragment, "fn broken( {").unwrap_err();
        match err {
            ShaderError::Compile { stage, message } => {
                assert_eq!(stage, ShaderStage::Fragment);
                assert!(!message.is_empty());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn type_error_fails_validation() {
        let src = "@fragment fn fs_main() -> @location(0) vec4<f32> { return 1.0; }";
        assert!(matches!(
            compile_stage(ShaderStage::Fragment, src),
            Err(ShaderError::Compile { .. })
        ));
    }

    #[test]
    fn textures_are_rejected() {
        let src = r#"
@group(0) @binding(0) var tex: texture_2d<f32>;
@fragment fn fs_main() -> @location(0) vec4<f32> {
    return textureLoad(tex, vec2<i32>(0, 0), 0);
}
"#;
        let stage = compile_stage(ShaderStage::Fragment, src).unwrap();
        assert!(matches!(stage.uniforms(), Err(ShaderError::Link(_))));
    }
}
