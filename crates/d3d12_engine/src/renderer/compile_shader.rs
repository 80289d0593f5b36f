#[cfg(windows)]
use std::ffi::CString;
#[cfg(windows)]
use std::path::Path;

#[cfg(windows)]
use eyre::eyre;
#[cfg(windows)]
use tracing::debug;
#[cfg(windows)]
use tracing::error;
#[cfg(windows)]
use windows::core::HSTRING;
#[cfg(windows)]
use windows::core::PCSTR;
#[cfg(windows)]
use windows::Win32::Graphics::Direct3D::Fxc::*;
#[cfg(windows)]
use windows::Win32::Graphics::Direct3D::*;

#[cfg(windows)]
use crate::error::EngineResult;

/// Name of the HLSL file holding both entry points.
pub const SHADER_FILE: &str = "shaders.hlsl";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Pixel,
}

impl ShaderStage {
    pub fn entry_point(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "VSMain",
            ShaderStage::Pixel => "PSMain",
        }
    }

    /// Shader model 5.0 profile for the stage.
    pub fn target(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vs_5_0",
            ShaderStage::Pixel => "ps_5_0",
        }
    }
}

/// Debug builds keep symbols and skip optimization so shaders can be stepped
/// through in PIX.
#[cfg(windows)]
pub fn compile_flags() -> u32 {
    if cfg!(debug_assertions) {
        D3DCOMPILE_DEBUG | D3DCOMPILE_SKIP_OPTIMIZATION
    } else {
        0
    }
}

#[cfg(windows)]
pub fn blob_to_string(blob: &ID3DBlob) -> String {
    let bytes = unsafe {
        std::slice::from_raw_parts(blob.GetBufferPointer() as *const u8, blob.GetBufferSize())
    };
    String::from_utf8_lossy(bytes)
        .trim_end_matches('\0')
        .trim_end()
        .to_string()
}

#[cfg(windows)]
pub fn compile_shader(hlsl_path: &Path, stage: ShaderStage, flags: u32) -> EngineResult<ID3DBlob> {
    let path_str = hlsl_path
        .to_str()
        .ok_or_else(|| eyre!("Shader path {} is not valid UTF-8", hlsl_path.display()))?;
    let hlsl: HSTRING = path_str.into();
    let entry_point = CString::new(stage.entry_point()).map_err(|e| eyre!(e))?;
    let target = CString::new(stage.target()).map_err(|e| eyre!(e))?;

    debug!(
        "Compiling {} ({}) from {}",
        stage.entry_point(),
        stage.target(),
        hlsl_path.display()
    );

    let mut shader_blob = None;
    let mut error_blob = None;
    let result = unsafe {
        D3DCompileFromFile(
            &hlsl,
            None,
            None,
            PCSTR(entry_point.as_ptr() as *const u8),
            PCSTR(target.as_ptr() as *const u8),
            flags,
            0,
            &mut shader_blob,
            Some(&mut error_blob),
        )
    };

    if let Err(e) = result {
        let details = error_blob
            .as_ref()
            .map(blob_to_string)
            .unwrap_or_else(|| e.message().to_string());
        error!(
            "Shader compile error ({} {}): {}",
            stage.entry_point(),
            stage.target(),
            details
        );
        return Err(eyre!(
            "Failed to compile {} ({}) from {}: {}",
            stage.entry_point(),
            stage.target(),
            hlsl_path.display(),
            details
        )
        .into());
    }

    shader_blob
        .ok_or_else(|| eyre!("D3DCompileFromFile returned no bytecode").into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_use_shader_model_5() {
        assert_eq!(ShaderStage::Vertex.entry_point(), "VSMain");
        assert_eq!(ShaderStage::Vertex.target(), "vs_5_0");
        assert_eq!(ShaderStage::Pixel.entry_point(), "PSMain");
        assert_eq!(ShaderStage::Pixel.target(), "ps_5_0");
    }

    #[test]
    fn shader_file_declares_both_entry_points() {
        let path = crate::renderer::assets::locate_asset(SHADER_FILE).unwrap();
        let source = std::fs::read_to_string(path).unwrap();
        for stage in [ShaderStage::Vertex, ShaderStage::Pixel] {
            assert!(source.contains(stage.entry_point()));
        }
        assert!(source.contains("POSITION"));
        assert!(source.contains("COLOR"));
    }
}
