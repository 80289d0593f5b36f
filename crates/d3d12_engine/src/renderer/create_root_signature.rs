use eyre::eyre;
use tracing::error;
use windows::Win32::Graphics::Direct3D12::*;

use super::compile_shader::blob_to_string;
use crate::error::EngineResult;
use crate::error::HresultContext;

/// Empty root signature: the triangle only reads from the input assembler.
pub fn create_root_signature(device: &ID3D12Device) -> EngineResult<ID3D12RootSignature> {
    let desc = D3D12_ROOT_SIGNATURE_DESC {
        Flags: D3D12_ROOT_SIGNATURE_FLAG_ALLOW_INPUT_ASSEMBLER_INPUT_LAYOUT,
        ..Default::default()
    };

    let mut signature_blob = None;
    let mut error_blob = None;

    let serialize_result = unsafe {
        D3D12SerializeRootSignature(
            &desc,
            D3D_ROOT_SIGNATURE_VERSION_1,
            &mut signature_blob,
            Some(&mut error_blob),
        )
    };

    if let Err(e) = serialize_result {
        let details = error_blob
            .as_ref()
            .map(blob_to_string)
            .unwrap_or_else(|| e.message().to_string());
        error!("Root signature serialization error: {details}");
        return Err(eyre!("Failed to serialize root signature: {details}").into());
    }

    let signature_blob =
        signature_blob.ok_or_else(|| eyre!("Root signature serialization returned no blob"))?;
    let signature_data: &[u8] = unsafe {
        std::slice::from_raw_parts(
            signature_blob.GetBufferPointer() as *const u8,
            signature_blob.GetBufferSize(),
        )
    };

    unsafe { device.CreateRootSignature(0, signature_data) }
        .context("Failed to create root signature.")
}
