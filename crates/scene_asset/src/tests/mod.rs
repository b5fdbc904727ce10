//! Scenario tests over real scene files

mod malformed;

use std::path::PathBuf;

/// Path of a file under `resources/scenes`
pub(crate) fn scene_path(filename: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("resources");
    path.push("scenes");
    path.push(filename);
    path
}
