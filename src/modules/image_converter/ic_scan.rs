use std::fs;
use std::path::{Path, PathBuf};
use crate::error::{ConvertError, ConvertResult};

pub const SUPPORTED_EXTENSIONS: [&str; 7] = ["png", "jpg", "jpeg", "webp", "bmp", "tiff", "ico"];

pub fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
}

/// Files directly inside `folder` with a supported extension, in directory
/// listing order. An empty result is not an error.
pub fn scan_folder(folder: &Path) -> ConvertResult<Vec<PathBuf>> {
    let read_err = |source| ConvertError::ReadFolder {
        path: folder.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(folder).map_err(read_err)? {
        let entry = entry.map_err(read_err)?;
        let path = entry.path();
        if path.is_file() && is_supported(&path) {
            files.push(path);
        }
    }
    Ok(files)
}

pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}
