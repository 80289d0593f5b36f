//! GPU resource wrappers: the upload buffer base and the typed vertex buffer.

#[cfg(windows)]
pub mod upload_buffer;
pub mod vertex;
#[cfg(windows)]
pub mod vertex_buffer;

#[cfg(windows)]
pub use upload_buffer::MappedBuffer;
#[cfg(windows)]
pub use upload_buffer::UploadBuffer;
pub use vertex::triangle_vertices;
pub use vertex::VertexPosColor;
#[cfg(windows)]
pub use vertex_buffer::VertexBuffer;

/// Whether `len` bytes written at `offset` stay inside a buffer of `size` bytes.
pub fn fits_in_buffer(size: u64, offset: usize, len: usize) -> bool {
    offset
        .checked_add(len)
        .is_some_and(|end| end as u64 <= size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_must_stay_in_bounds() {
        assert!(fits_in_buffer(84, 0, 84));
        assert!(fits_in_buffer(84, 56, 28));
        assert!(fits_in_buffer(84, 84, 0));
        assert!(!fits_in_buffer(84, 57, 28));
        assert!(!fits_in_buffer(84, usize::MAX, 1));
    }
}
