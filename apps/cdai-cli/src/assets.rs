//! Reading uploads from disk and writing generated images back.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use cdai_core::ImageHandle;
use tracing::info;

/// File name prefix for saved images.
const ASSET_PREFIX: &str = "creative-asset";

/// Mime type for an image path, by extension. Unknown extensions are sent as PNG.
pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|value| value.to_str())
        .map(|value| value.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        _ => "image/png",
    }
}

/// File extension for a returned image's mime type.
pub fn extension_for_mime(mime: Option<&str>) -> &'static str {
    let lowered = mime.unwrap_or_default().to_ascii_lowercase();
    if lowered.contains("jpeg") || lowered.contains("jpg") {
        "jpg"
    } else if lowered.contains("webp") {
        "webp"
    } else if lowered.contains("gif") {
        "gif"
    } else {
        "png"
    }
}

/// Read an image file into a base64 data handle.
pub fn load_image(path: &Path) -> Result<ImageHandle> {
    let bytes =
        fs::read(path).with_context(|| format!("failed to read image: {}", path.display()))?;
    if bytes.is_empty() {
        bail!("image file is empty: {}", path.display());
    }
    let handle = ImageHandle::from_base64(mime_for_path(path), &BASE64.encode(bytes));
    info!(path = %path.display(), image = %handle, "loaded image");
    Ok(handle)
}

/// Write the decoded image bytes to `path`, creating parent directories.
pub fn write_image(image: &ImageHandle, path: &Path) -> Result<()> {
    let bytes = BASE64
        .decode(image.base64_payload())
        .context("generated image is not valid base64")?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory: {}", parent.display()))?;
    }
    fs::write(path, bytes).with_context(|| format!("failed to write image: {}", path.display()))?;
    info!(path = %path.display(), "saved image");
    Ok(())
}

/// Save into `dir` as `creative-asset-<n>.<ext>`, picking the first unused `n`.
pub fn save_image(image: &ImageHandle, dir: &Path) -> Result<PathBuf> {
    let path = next_asset_path(dir, extension_for_mime(image.mime_type()));
    write_image(image, &path)?;
    Ok(path)
}

fn next_asset_path(dir: &Path, ext: &str) -> PathBuf {
    (1u32..)
        .map(|n| dir.join(format!("{ASSET_PREFIX}-{n}.{ext}")))
        .find(|path| !path.exists())
        .unwrap_or_else(|| dir.join(format!("{ASSET_PREFIX}.{ext}")))
}
