use std::marker::PhantomData;

use eyre::eyre;
use windows::Win32::Graphics::Direct3D12::*;

use super::upload_buffer::UploadBuffer;
use crate::error::EngineResult;

/// Typed vertex data living in an [`UploadBuffer`], together with its view.
pub struct VertexBuffer<T: Copy> {
    buffer: UploadBuffer,
    view: D3D12_VERTEX_BUFFER_VIEW,
    vertex_count: u32,
    _vertex: PhantomData<T>,
}

impl<T: Copy> VertexBuffer<T> {
    pub fn new(device: &ID3D12Device, vertices: &[T], name: &str) -> EngineResult<Self> {
        if vertices.is_empty() {
            return Err(eyre!("Vertex buffer {name} needs at least one vertex").into());
        }
        let size_in_bytes = std::mem::size_of_val(vertices);
        let size_in_bytes_u32 = u32::try_from(size_in_bytes)
            .map_err(|_| eyre!("Vertex buffer {name} is too large ({size_in_bytes} bytes)"))?;

        let buffer = UploadBuffer::new(device, size_in_bytes as u64, name)?;
        {
            let mapped = buffer.map()?;
            unsafe {
                std::ptr::copy_nonoverlapping(
                    vertices.as_ptr(),
                    mapped.as_mut_ptr().cast::<T>(),
                    vertices.len(),
                );
            }
        }

        let view = D3D12_VERTEX_BUFFER_VIEW {
            BufferLocation: buffer.gpu_virtual_address(),
            StrideInBytes: std::mem::size_of::<T>() as u32,
            SizeInBytes: size_in_bytes_u32,
        };

        Ok(Self {
            buffer,
            view,
            vertex_count: vertices.len() as u32,
            _vertex: PhantomData,
        })
    }

    /// Binds the buffer to input slot 0.
    pub fn apply(&self, command_list: &ID3D12GraphicsCommandList) {
        unsafe { command_list.IASetVertexBuffers(0, Some(&[self.view])) };
    }

    pub fn view(&self) -> D3D12_VERTEX_BUFFER_VIEW {
        self.view
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn buffer(&self) -> &UploadBuffer {
        &self.buffer
    }
}
