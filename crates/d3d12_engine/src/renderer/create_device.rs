use eyre::eyre;
use tracing::info;
use tracing::warn;
use windows::Win32::Graphics::Direct3D12::*;
use windows::Win32::Graphics::Dxgi::*;

use super::adapter_utils::adapter_name;
use super::adapter_utils::get_hardware_adapter;
use super::adapter_utils::MIN_FEATURE_LEVEL;
use crate::config::GraphicsConfig;
use crate::error::EngineResult;
use crate::error::HresultContext;

/// Turns on the D3D12 debug layer, with GPU-based validation when the runtime
/// exposes `ID3D12Debug1`. Returns whether any debug layer is active.
fn enable_debug_layer(gpu_based_validation: bool) -> bool {
    unsafe {
        let mut debug1: Option<ID3D12Debug1> = None;
        if D3D12GetDebugInterface(&mut debug1).is_ok() {
            if let Some(debug1) = debug1 {
                debug1.EnableDebugLayer();
                if gpu_based_validation {
                    debug1.SetEnableGPUBasedValidation(true);
                }
                info!(gpu_based_validation, "D3D12 debug layer enabled (ID3D12Debug1)");
                return true;
            }
        }

        let mut debug: Option<ID3D12Debug> = None;
        if D3D12GetDebugInterface(&mut debug).is_ok() {
            if let Some(debug) = debug {
                debug.EnableDebugLayer();
                info!("D3D12 debug layer enabled (ID3D12Debug)");
                return true;
            }
        }
    }
    warn!("D3D12 debug layer unavailable.");
    false
}

fn get_info_queue() -> Option<IDXGIInfoQueue> {
    match unsafe { DXGIGetDebugInterface1::<IDXGIInfoQueue>(0) } {
        Ok(queue) => {
            info!("DXGI info queue obtained.");
            Some(queue)
        }
        Err(e) => {
            warn!("Failed to get DXGI info queue: {e:?}");
            None
        }
    }
}

/// Creates the DXGI factory and the device on either the WARP adapter or the
/// first suitable hardware adapter.
pub fn create_device(
    config: &GraphicsConfig,
) -> EngineResult<(IDXGIFactory4, ID3D12Device, Option<IDXGIInfoQueue>)> {
    let mut factory_flags = DXGI_CREATE_FACTORY_FLAGS(0);
    let mut info_queue = None;

    if config.debug_layer && enable_debug_layer(config.gpu_based_validation) {
        factory_flags |= DXGI_CREATE_FACTORY_DEBUG;
        info_queue = get_info_queue();
    }

    let dxgi_factory: IDXGIFactory4 =
        unsafe { CreateDXGIFactory2(factory_flags) }.context("Failed to create DXGI factory.")?;

    let adapter: IDXGIAdapter1 = if config.use_warp_device {
        let warp: IDXGIAdapter1 = unsafe { dxgi_factory.EnumWarpAdapter() }
            .context("Failed to create WARP adapter.")?;
        if let Ok(desc) = unsafe { warp.GetDesc1() } {
            info!("Using WARP adapter: {}", adapter_name(&desc));
        }
        warp
    } else {
        get_hardware_adapter(&dxgi_factory, config.high_performance_adapter)?
    };

    let mut device: Option<ID3D12Device> = None;
    unsafe { D3D12CreateDevice(&adapter, MIN_FEATURE_LEVEL, &mut device) }
        .context("Failed to create device.")?;
    let device = device.ok_or_else(|| eyre!("D3D12CreateDevice returned no device"))?;

    Ok((dxgi_factory, device, info_queue))
}
