use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::Serialize;

use crate::error::Result;
use crate::snapshot::{BuildId, BuildSnapshot};

/// Writes the latest snapshot of a build to `<dir>/out_<build id>.json`.
///
/// Each write replaces the previous file; nothing is ever read back.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store rooted next to the running executable, or the current
    /// directory if the executable path cannot be determined.
    pub fn beside_executable() -> Self {
        let dir = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| {
                warn!("Executable directory unknown, writing snapshots to the current directory");
                PathBuf::from(".")
            });
        Self::new(dir)
    }

    pub fn path_for(&self, build_id: &BuildId) -> PathBuf {
        self.dir.join(format!("out_{build_id}.json"))
    }

    /// Serializes the snapshot as tab-indented JSON and overwrites its file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails or the file cannot be written.
    pub fn persist(&self, snapshot: &BuildSnapshot) -> Result<PathBuf> {
        let path = self.path_for(&snapshot.build_id);
        let contents = render(snapshot)?;

        fs::write(&path, contents)?;
        debug!("Snapshot written to {}", path.display());

        Ok(path)
    }
}

fn render(snapshot: &BuildSnapshot) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    snapshot.serialize(&mut serializer)?;
    Ok(buf)
}
