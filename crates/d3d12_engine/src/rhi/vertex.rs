use bevy_math::Vec3;

#[cfg(windows)]
use windows::core::s;
#[cfg(windows)]
use windows::Win32::Graphics::Direct3D12::*;
#[cfg(windows)]
use windows::Win32::Graphics::Dxgi::Common::*;

/// Position + color vertex matching the `VSMain` input signature.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexPosColor {
    pub position: Vec3,
    pub color: [f32; 4],
}

impl VertexPosColor {
    pub const POSITION_OFFSET: u32 = std::mem::offset_of!(VertexPosColor, position) as u32;
    pub const COLOR_OFFSET: u32 = std::mem::offset_of!(VertexPosColor, color) as u32;
    pub const STRIDE: u32 = std::mem::size_of::<VertexPosColor>() as u32;

    pub const fn new(position: Vec3, color: [f32; 4]) -> Self {
        Self { position, color }
    }
}

/// Vertex types that can describe themselves to the input assembler.
#[cfg(windows)]
pub trait InputLayout: Copy {
    fn input_element_descs() -> Vec<D3D12_INPUT_ELEMENT_DESC>;
}

#[cfg(windows)]
impl InputLayout for VertexPosColor {
    fn input_element_descs() -> Vec<D3D12_INPUT_ELEMENT_DESC> {
        vec![
            D3D12_INPUT_ELEMENT_DESC {
                SemanticName: s!("POSITION"),
                Format: DXGI_FORMAT_R32G32B32_FLOAT,
                AlignedByteOffset: Self::POSITION_OFFSET,
                InputSlotClass: D3D12_INPUT_CLASSIFICATION_PER_VERTEX_DATA,
                ..Default::default()
            },
            D3D12_INPUT_ELEMENT_DESC {
                SemanticName: s!("COLOR"),
                Format: DXGI_FORMAT_R32G32B32A32_FLOAT,
                AlignedByteOffset: Self::COLOR_OFFSET,
                InputSlotClass: D3D12_INPUT_CLASSIFICATION_PER_VERTEX_DATA,
                ..Default::default()
            },
        ]
    }
}

/// The red/green/blue triangle, stretched vertically so it keeps its shape on
/// a non-square back buffer.
pub fn triangle_vertices(aspect_ratio: f32) -> [VertexPosColor; 3] {
    [
        VertexPosColor::new(Vec3::new(0.0, 0.25 * aspect_ratio, 0.0), [1.0, 0.0, 0.0, 1.0]),
        VertexPosColor::new(Vec3::new(0.25, -0.25 * aspect_ratio, 0.0), [0.0, 1.0, 0.0, 1.0]),
        VertexPosColor::new(Vec3::new(-0.25, -0.25 * aspect_ratio, 0.0), [0.0, 0.0, 1.0, 1.0]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_tightly_packed() {
        assert_eq!(VertexPosColor::STRIDE, 28);
        assert_eq!(VertexPosColor::POSITION_OFFSET, 0);
        assert_eq!(VertexPosColor::COLOR_OFFSET, 12);
        assert_eq!(std::mem::align_of::<VertexPosColor>(), 4);
    }

    #[test]
    fn triangle_scales_with_aspect_ratio() {
        let aspect_ratio = 1280.0 / 720.0;
        let [top, right, left] = triangle_vertices(aspect_ratio);

        assert_eq!(top.position, Vec3::new(0.0, 0.25 * aspect_ratio, 0.0));
        assert_eq!(right.position.y, left.position.y);
        assert!(right.position.x > 0.0 && left.position.x < 0.0);
        assert!(top.position.y > 0.0 && right.position.y < 0.0);

        assert_eq!(top.color, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(right.color, [0.0, 1.0, 0.0, 1.0]);
        assert_eq!(left.color, [0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn square_target_gives_symmetric_triangle() {
        let [top, right, _] = triangle_vertices(1.0);
        assert_eq!(top.position.y, 0.25);
        assert_eq!(right.position, Vec3::new(0.25, -0.25, 0.0));
    }
}
