use std::fs;
use std::io;
use std::path::Path;

/// Vertex and fragment source text, read from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSources {
    pub vertex: String,
    pub fragment: String,
}

/// Reads a shader pair. Path resolution is the caller's business.
pub fn load_shader_pair(
    vertex_path: impl AsRef<Path>,
    fragment_path: impl AsRef<Path>,
) -> io::Result<ShaderSources> {
    let vertex_path = vertex_path.as_ref();
    let fragment_path = fragment_path.as_ref();

    let vertex = fs::read_to_string(vertex_path).map_err(|e| with_path(e, vertex_path))?;
    let fragment = fs::read_to_string(fragment_path).map_err(|e| with_path(e, fragment_path))?;

    log::debug!(
        "loaded shaders {} ({} bytes), {} ({} bytes)",
        vertex_path.display(),
        vertex.len(),
        fragment_path.display(),
        fragment.len()
    );

    Ok(ShaderSources { vertex, fragment })
}

fn with_path(err: io::Error, path: &Path) -> io::Error {
    io::Error::new(err.kind(), format!("{}: {err}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("prism-loader-{}-{name}", std::process::id()));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn reads_both_sources() {
        let vs = temp_file("a.vert.wgsl", "vertex text");
        let fs_path = temp_file("a.frag.wgsl", "fragment text");

        let pair = load_shader_pair(&vs, &fs_path).unwrap();
        assert_eq!(pair.vertex, "vertex text");
        assert_eq!(pair.fragment, "fragment text");

        let _ = fs::remove_file(vs);
        let _ = fs::remove_file(fs_path);
    }

    #[test]
    fn missing_file_keeps_kind_and_names_path() {
        let vs = temp_file("b.vert.wgsl", "vertex text");
        let err = load_shader_pair(&vs, "/definitely/not/here.frag.wgsl").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(err.to_string().contains("here.frag.wgsl"));

        let _ = fs::remove_file(vs);
    }
}
