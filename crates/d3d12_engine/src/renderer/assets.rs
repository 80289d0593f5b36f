use std::path::Path;
use std::path::PathBuf;

use eyre::eyre;

use crate::error::EngineResult;

/// Directory, relative to the executable or the crate root, holding runtime assets.
pub const ASSET_DIR: &str = "Resources";

pub fn asset_full_path(base_dir: &Path, asset_name: &str) -> PathBuf {
    base_dir.join(ASSET_DIR).join(asset_name)
}

/// Places an asset may live, in lookup order: next to the executable first,
/// then the crate sources for `cargo run`.
pub fn asset_candidates(asset_name: &str) -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        candidates.push(asset_full_path(&exe_dir, asset_name));
    }
    candidates.push(asset_full_path(
        Path::new(env!("CARGO_MANIFEST_DIR")),
        asset_name,
    ));
    candidates
}

pub fn locate_asset(asset_name: &str) -> EngineResult<PathBuf> {
    let candidates = asset_candidates(asset_name);
    candidates
        .iter()
        .find(|path| path.is_file())
        .cloned()
        .ok_or_else(|| eyre!("Asset {asset_name} not found, looked in {candidates:?}").into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_under_resources() {
        let path = asset_full_path(Path::new("bin"), "shaders.hlsl");
        assert_eq!(path, Path::new("bin").join("Resources").join("shaders.hlsl"));
    }

    #[test]
    fn finds_the_bundled_shader() {
        let path = locate_asset("shaders.hlsl").unwrap();
        assert!(path.ends_with(Path::new("Resources").join("shaders.hlsl")));
    }

    #[test]
    fn missing_assets_are_errors() {
        let error = locate_asset("does_not_exist.hlsl").unwrap_err();
        assert!(error.to_string().contains("does_not_exist.hlsl"));
    }
}
