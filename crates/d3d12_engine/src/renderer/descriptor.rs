#[cfg(windows)]
use eyre::eyre;
#[cfg(windows)]
use windows::Win32::Graphics::Direct3D12::*;

#[cfg(windows)]
use crate::error::EngineResult;
#[cfg(windows)]
use crate::error::HresultContext;

/// Address of the `index`th descriptor in a heap starting at `start`.
pub fn offset_descriptor(start: usize, index: u32, increment: u32) -> usize {
    start + index as usize * increment as usize
}

/// CPU-only descriptor heap holding one render target view per back buffer.
#[cfg(windows)]
pub struct RtvHeap {
    heap: ID3D12DescriptorHeap,
    descriptor_size: u32,
    capacity: u32,
}

#[cfg(windows)]
impl RtvHeap {
    pub fn new(device: &ID3D12Device, capacity: u32) -> EngineResult<Self> {
        let heap: ID3D12DescriptorHeap = unsafe {
            device.CreateDescriptorHeap(&D3D12_DESCRIPTOR_HEAP_DESC {
                NumDescriptors: capacity,
                Type: D3D12_DESCRIPTOR_HEAP_TYPE_RTV,
                Flags: D3D12_DESCRIPTOR_HEAP_FLAG_NONE,
                ..Default::default()
            })
        }
        .context("Failed to create RTV heap.")?;

        let descriptor_size =
            unsafe { device.GetDescriptorHandleIncrementSize(D3D12_DESCRIPTOR_HEAP_TYPE_RTV) };

        Ok(Self {
            heap,
            descriptor_size,
            capacity,
        })
    }

    pub fn descriptor_size(&self) -> u32 {
        self.descriptor_size
    }

    pub fn handle(&self, index: u32) -> EngineResult<D3D12_CPU_DESCRIPTOR_HANDLE> {
        if index >= self.capacity {
            return Err(eyre!(
                "RTV index {index} out of range for a heap of {}",
                self.capacity
            )
            .into());
        }
        let start = unsafe { self.heap.GetCPUDescriptorHandleForHeapStart() };
        Ok(D3D12_CPU_DESCRIPTOR_HANDLE {
            ptr: offset_descriptor(start.ptr, index, self.descriptor_size),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_by_increment() {
        assert_eq!(offset_descriptor(0x1000, 0, 32), 0x1000);
        assert_eq!(offset_descriptor(0x1000, 1, 32), 0x1020);
        assert_eq!(offset_descriptor(0x1000, 3, 8), 0x1018);
    }
}
