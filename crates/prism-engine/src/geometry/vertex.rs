use crate::device::UploadError;

/// Color components per vertex (RGB, 0.0..=1.0).
pub const COLOR_COMPONENTS: u32 = 3;

const FLOAT_SIZE: u64 = std::mem::size_of::<f32>() as u64;

/// Vertex data in block layout: every vertex's position first, then every
/// vertex's color.
///
/// For `n` vertices with `p` position components, `data` holds `n * p`
/// position floats followed by `n * 3` color floats.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexData {
    position_components: u32,
    data: Vec<f32>,
}

impl VertexData {
    /// Wraps block-layout data, checking the component count and length.
    pub fn new(position_components: u32, data: Vec<f32>) -> Result<Self, UploadError> {
        if !(2..=3).contains(&position_components) {
            return Err(UploadError::UnsupportedPositionComponents(position_components));
        }
        if data.is_empty() {
            return Err(UploadError::EmptyGeometry);
        }

        let stride = (position_components + COLOR_COMPONENTS) as usize;
        if data.len() % stride != 0 {
            return Err(UploadError::MalformedVertexData {
                len: data.len(),
                stride,
            });
        }

        Ok(Self {
            position_components,
            data,
        })
    }

    /// Builds block-layout data from separate position and color lists.
    pub fn from_blocks<const P: usize>(
        positions: &[[f32; P]],
        colors: &[[f32; 3]],
    ) -> Result<Self, UploadError> {
        if positions.len() != colors.len() {
            return Err(UploadError::MalformedVertexData {
                len: positions.len() * P + colors.len() * 3,
                stride: P + 3,
            });
        }

        let mut data = Vec::with_capacity(positions.len() * (P + 3));
        data.extend(positions.iter().flatten());
        data.extend(colors.iter().flatten());
        Self::new(P as u32, data)
    }

    pub fn position_components(&self) -> u32 {
        self.position_components
    }

    pub fn vertex_count(&self) -> usize {
        self.data.len() / (self.position_components + COLOR_COMPONENTS) as usize
    }

    /// Byte offset where the color block starts.
    pub fn color_offset_bytes(&self) -> u64 {
        self.vertex_count() as u64 * u64::from(self.position_components) * FLOAT_SIZE
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Checks that `indices` form whole triangles over this data.
    pub fn validate_indices(&self, indices: &[u16]) -> Result<(), UploadError> {
        if indices.is_empty() {
            return Err(UploadError::EmptyGeometry);
        }
        if indices.len() % 3 != 0 {
            return Err(UploadError::IncompleteTriangle(indices.len()));
        }

        let vertex_count = self.vertex_count();
        match indices
            .iter()
            .enumerate()
            .find(|(_, i)| usize::from(**i) >= vertex_count)
        {
            Some((position, index)) => Err(UploadError::IndexOutOfRange {
                position,
                index: *index,
                vertex_count,
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> VertexData {
        VertexData::from_blocks(
            &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
            &[[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 1.0, 1.0]],
        )
        .unwrap()
    }

    #[test]
    fn color_block_follows_all_positions() {
        let q = quad();
        assert_eq!(q.vertex_count(), 4);
        // 4 vertices * 3 components * 4 bytes
        assert_eq!(q.color_offset_bytes(), 48);
        assert_eq!(&q.as_slice()[12..15], &[1.0, 0.0, 0.0]);
    }

    #[test]
    fn two_component_positions_shift_the_color_block() {
        let tri = VertexData::from_blocks(
            &[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]],
            &[[1.0, 0.0, 0.0]; 3],
        )
        .unwrap();
        assert_eq!(tri.position_components(), 2);
        assert_eq!(tri.color_offset_bytes(), 24);
    }

    #[test]
    fn rejects_bad_shapes() {
        assert_eq!(
            VertexData::new(4, vec![0.0; 7]),
            Err(UploadError::UnsupportedPositionComponents(4))
        );
        assert_eq!(VertexData::new(3, vec![]), Err(UploadError::EmptyGeometry));
        assert_eq!(
            VertexData::new(3, vec![0.0; 10]),
            Err(UploadError::MalformedVertexData { len: 10, stride: 6 })
        );
    }

    #[test]
    fn index_checks() {
        let q = quad();
        assert!(q.validate_indices(&[0, 1, 2, 0, 2, 3]).is_ok());
        assert_eq!(q.validate_indices(&[]), Err(UploadError::EmptyGeometry));
        assert_eq!(q.validate_indices(&[0, 1]), Err(UploadError::IncompleteTriangle(2)));
        assert_eq!(
            q.validate_indices(&[0, 1, 4]),
            Err(UploadError::IndexOutOfRange {
                position: 2,
                index: 4,
                vertex_count: 4
            })
        );
    }
}
