use eyre::eyre;
use tracing::debug;
use windows::core::HSTRING;
use windows::Win32::Graphics::Direct3D12::*;
use windows::Win32::Graphics::Dxgi::Common::*;

use super::fits_in_buffer;
use crate::error::EngineResult;
use crate::error::HresultContext;

/// A committed buffer on the upload heap.
///
/// Upload heap memory stays CPU visible, so the buffer is created in
/// `GENERIC_READ` and written through [`UploadBuffer::map`]. Good enough for a
/// handful of vertices; larger data belongs in a default heap with a copy.
pub struct UploadBuffer {
    resource: ID3D12Resource,
    size: u64,
}

impl UploadBuffer {
    pub fn new(device: &ID3D12Device, size: u64, name: &str) -> EngineResult<Self> {
        if size == 0 {
            return Err(eyre!("Cannot create an empty buffer ({name})").into());
        }

        let heap_props = D3D12_HEAP_PROPERTIES {
            Type: D3D12_HEAP_TYPE_UPLOAD,
            ..Default::default()
        };
        let resource_desc = D3D12_RESOURCE_DESC {
            Dimension: D3D12_RESOURCE_DIMENSION_BUFFER,
            Alignment: 0,
            Width: size,
            Height: 1,
            DepthOrArraySize: 1,
            MipLevels: 1,
            Format: DXGI_FORMAT_UNKNOWN,
            SampleDesc: DXGI_SAMPLE_DESC {
                Count: 1,
                Quality: 0,
            },
            Layout: D3D12_TEXTURE_LAYOUT_ROW_MAJOR,
            Flags: D3D12_RESOURCE_FLAG_NONE,
        };

        let mut resource: Option<ID3D12Resource> = None;
        unsafe {
            device.CreateCommittedResource(
                &heap_props,
                D3D12_HEAP_FLAG_NONE,
                &resource_desc,
                D3D12_RESOURCE_STATE_GENERIC_READ,
                None,
                &mut resource,
            )
        }
        .context(format!("Failed to create upload buffer {name} ({size} bytes)."))?;
        let resource =
            resource.ok_or_else(|| eyre!("CreateCommittedResource returned no resource"))?;

        if let Err(e) = unsafe { resource.SetName(&HSTRING::from(name)) } {
            debug!("Could not name buffer {name}: {e:?}");
        }

        Ok(Self { resource, size })
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn resource(&self) -> &ID3D12Resource {
        &self.resource
    }

    pub fn gpu_virtual_address(&self) -> u64 {
        unsafe { self.resource.GetGPUVirtualAddress() }
    }

    /// Maps subresource 0 for writing. The CPU never reads it back, so the read
    /// range is empty.
    pub fn map(&self) -> EngineResult<MappedBuffer<'_>> {
        let read_range = D3D12_RANGE { Begin: 0, End: 0 };
        let mut data = std::ptr::null_mut();
        unsafe { self.resource.Map(0, Some(&read_range), Some(&mut data)) }
            .context("Failed to map upload buffer.")?;
        if data.is_null() {
            return Err(eyre!("Map succeeded but returned a null pointer").into());
        }
        Ok(MappedBuffer {
            buffer: self,
            data: data.cast(),
        })
    }

    pub fn write_bytes(&self, offset: usize, bytes: &[u8]) -> EngineResult<()> {
        if !fits_in_buffer(self.size, offset, bytes.len()) {
            return Err(eyre!(
                "Write of {} bytes at offset {offset} overflows a {} byte buffer",
                bytes.len(),
                self.size
            )
            .into());
        }
        let mapped = self.map()?;
        unsafe {
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), mapped.data.add(offset), bytes.len());
        }
        Ok(())
    }
}

/// CPU pointer into a mapped [`UploadBuffer`]; unmaps on drop.
pub struct MappedBuffer<'a> {
    buffer: &'a UploadBuffer,
    data: *mut u8,
}

impl MappedBuffer<'_> {
    pub fn as_mut_ptr(&self) -> *mut u8 {
        self.data
    }

    pub fn len(&self) -> usize {
        self.buffer.size as usize
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.size == 0
    }
}

impl Drop for MappedBuffer<'_> {
    fn drop(&mut self) {
        // A null written range tells the driver the whole buffer may have changed.
        unsafe { self.buffer.resource.Unmap(0, None) };
    }
}
