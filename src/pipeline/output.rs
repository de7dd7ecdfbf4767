use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::{core::Frame, error::ViewfxResult};

const INDEX_DIGITS: usize = 6;

/// `dir/frame.png` -> `dir/frame_NNNNNN.png`, one past the highest index already on disk.
pub fn unique_output_path(base: &Path) -> PathBuf {
    let parent = base.parent().unwrap_or_else(|| Path::new(""));
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let suffix = base
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let prefix = format!("{stem}_");
    let next = std::fs::read_dir(if parent.as_os_str().is_empty() {
        Path::new(".")
    } else {
        parent
    })
    .into_iter()
    .flatten()
    .filter_map(Result::ok)
    .filter_map(|entry| {
        let name = entry.file_name().to_string_lossy().into_owned();
        let digits = name.strip_prefix(&prefix)?.strip_suffix(&suffix)?;
        if digits.len() != INDEX_DIGITS || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse::<u64>().ok()
    })
    .max()
    .map_or(0, |max| max + 1);

    parent.join(format!("{stem}_{next:0width$}{suffix}", width = INDEX_DIGITS))
}

/// Create the directory `path` will be written into.
pub(crate) fn create_parent_dir(path: &Path) -> ViewfxResult<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create output directory '{}'", parent.display()))?;
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Write `frame` to `path`, creating parent directories. The format follows the extension.
pub fn write_frame(path: &Path, frame: &Frame) -> ViewfxResult<()> {
    create_parent_dir(path)?;
    frame
        .save(path)
        .with_context(|| format!("write image '{}'", path.display()))?;
    Ok(())
}

/// Resolve `relative` under `root`, numbered if requested, and write the frame there.
/// Returns the path written.
pub fn save_frame(root: &Path, relative: &Path, frame: &Frame, numbered: bool) -> ViewfxResult<PathBuf> {
    let base = root.join(relative);
    let path = if numbered {
        unique_output_path(&base)
    } else {
        base
    };
    write_frame(&path, frame)?;
    Ok(path)
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/output.rs"]
mod tests;
