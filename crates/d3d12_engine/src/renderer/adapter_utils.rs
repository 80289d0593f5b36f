use eyre::eyre;
use tracing::debug;
use tracing::info;
use tracing::warn;
use windows::core::Interface;
use windows::Win32::Graphics::Direct3D::*;
use windows::Win32::Graphics::Direct3D12::D3D12CreateDevice;
use windows::Win32::Graphics::Direct3D12::ID3D12Device;
use windows::Win32::Graphics::Dxgi::*;

use crate::error::EngineResult;
use crate::error::HresultContext;

pub const MIN_FEATURE_LEVEL: D3D_FEATURE_LEVEL = D3D_FEATURE_LEVEL_11_0;

pub fn adapter_name(desc: &DXGI_ADAPTER_DESC1) -> String {
    let len = desc
        .Description
        .iter()
        .position(|c| *c == 0)
        .unwrap_or(desc.Description.len());
    String::from_utf16_lossy(&desc.Description[..len])
}

fn is_software_adapter(desc: &DXGI_ADAPTER_DESC1) -> bool {
    (DXGI_ADAPTER_FLAG(desc.Flags as i32) & DXGI_ADAPTER_FLAG_SOFTWARE) != DXGI_ADAPTER_FLAG_NONE
}

/// Probes for Direct3D 12 support without creating the device.
fn supports_d3d12(adapter: &IDXGIAdapter1) -> bool {
    unsafe {
        D3D12CreateDevice(
            adapter,
            MIN_FEATURE_LEVEL,
            std::ptr::null_mut::<Option<ID3D12Device>>(),
        )
    }
    .is_ok()
}

fn accept_adapter_desc(
    index: u32,
    desc: windows::core::Result<DXGI_ADAPTER_DESC1>,
    supports_d3d12: impl FnOnce() -> bool,
) -> bool {
    let desc = match desc {
        Ok(desc) => desc,
        Err(e) => {
            warn!("Adapter {index}: failed to read description ({e}), skipping");
            return false;
        }
    };
    let name = adapter_name(&desc);

    // The Basic Render Driver is only used when WARP is asked for explicitly.
    if is_software_adapter(&desc) {
        debug!("Adapter {index}: {name} (software, skipping)");
        return false;
    }
    if !supports_d3d12() {
        debug!("Adapter {index}: {name} (no feature level 11.0 support)");
        return false;
    }
    info!(
        "Using hardware adapter {index}: {name} ({} MiB dedicated video memory)",
        desc.DedicatedVideoMemory / (1024 * 1024)
    );
    true
}

fn accept_adapter(index: u32, adapter: &IDXGIAdapter1) -> bool {
    accept_adapter_desc(index, unsafe { adapter.GetDesc1() }, || supports_d3d12(adapter))
}

/// Returns the first hardware adapter that can run Direct3D 12.
///
/// Prefers `IDXGIFactory6::EnumAdapterByGpuPreference` so the high performance
/// GPU can be requested, and falls back to plain `EnumAdapters1` on older
/// runtimes or when the preferred enumeration yields nothing.
pub fn get_hardware_adapter(
    factory: &IDXGIFactory4,
    request_high_performance_adapter: bool,
) -> EngineResult<IDXGIAdapter1> {
    if let Ok(factory6) = factory.cast::<IDXGIFactory6>() {
        let preference = if request_high_performance_adapter {
            DXGI_GPU_PREFERENCE_HIGH_PERFORMANCE
        } else {
            DXGI_GPU_PREFERENCE_UNSPECIFIED
        };
        for i in 0.. {
            let adapter: IDXGIAdapter1 =
                match unsafe { factory6.EnumAdapterByGpuPreference(i, preference) } {
                    Ok(adapter) => adapter,
                    Err(e) if e.code() == DXGI_ERROR_NOT_FOUND => break,
                    Err(e) => Err(e).context("Failed to enumerate adapters by preference.")?,
                };
            if accept_adapter(i, &adapter) {
                return Ok(adapter);
            }
        }
    }

    for i in 0.. {
        let adapter = match unsafe { factory.EnumAdapters1(i) } {
            Ok(adapter) => adapter,
            Err(e) if e.code() == DXGI_ERROR_NOT_FOUND => break,
            Err(e) => Err(e).context("Failed to enumerate adapters.")?,
        };
        if accept_adapter(i, &adapter) {
            return Ok(adapter);
        }
    }

    Err(eyre!("No suitable D3D12 hardware adapter found. Try -warp.").into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use windows::Win32::Foundation::E_FAIL;

    fn desc_with(name: &str, flags: DXGI_ADAPTER_FLAG) -> DXGI_ADAPTER_DESC1 {
        let mut desc: DXGI_ADAPTER_DESC1 = unsafe { std::mem::zeroed() };
        desc.Flags = flags.0 as u32;
        for (slot, unit) in desc.Description.iter_mut().zip(name.encode_utf16()) {
            *slot = unit;
        }
        desc
    }

    #[test]
    fn unreadable_adapter_is_skipped_not_fatal() {
        let mut probed = false;
        let unreadable = Err(windows::core::Error::from_hresult(E_FAIL));
        let accepted = accept_adapter_desc(0, unreadable, || {
            probed = true;
            true
        });
        assert!(!accepted);
        assert!(!probed);
    }

    #[test]
    fn software_adapters_are_skipped() {
        let desc = desc_with("Microsoft Basic Render Driver", DXGI_ADAPTER_FLAG_SOFTWARE);
        assert!(!accept_adapter_desc(1, Ok(desc), || true));
    }

    #[test]
    fn hardware_adapter_needs_d3d12_support() {
        let desc = desc_with("Test GPU", DXGI_ADAPTER_FLAG_NONE);
        assert_eq!(adapter_name(&desc), "Test GPU");
        assert!(!accept_adapter_desc(2, Ok(desc), || false));
        assert!(accept_adapter_desc(2, Ok(desc), || true));
    }
}
