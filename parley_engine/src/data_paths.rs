use std::env;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Cached path to the directory containing the game's data files.
static DATA_ROOT: LazyLock<PathBuf> = LazyLock::new(detect_data_root);

/// The resolved data root itself.
pub fn data_root() -> &'static Path {
    DATA_ROOT.as_path()
}

/// Resolve the most likely location of the data directory.
///
/// `PARLEY_DATA` wins when set; otherwise the workspace layout, a flattened
/// `data/` and the same two next to the executable are tried in turn.
fn detect_data_root() -> PathBuf {
    if let Some(dir) = env::var_os("PARLEY_DATA") {
        return PathBuf::from(dir);
    }

    let mut candidates = vec![PathBuf::from("parley_engine/data"), PathBuf::from("data")];

    if let Ok(exe_path) = env::current_exe()
        && let Some(dir) = exe_path.parent()
    {
        candidates.push(dir.join("parley_engine/data"));
        candidates.push(dir.join("data"));

        if let Some(parent) = dir.parent() {
            candidates.push(parent.join("parley_engine/data"));
            candidates.push(parent.join("data"));
        }
    }

    candidates
        .into_iter()
        .find(|candidate| candidate.is_dir())
        .unwrap_or_else(|| PathBuf::from("parley_engine/data"))
}
