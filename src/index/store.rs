use crate::index::snapshot::IndexSnapshot;
use crate::index::{IndexError, IndexResult};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Reads and writes the index document at a fixed path
#[derive(Debug, Clone)]
pub struct IndexStore {
    path: PathBuf,
}

impl IndexStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the last written snapshot
    ///
    /// A missing file yields an empty snapshot. A file that exists but does
    /// not parse is an error so it is never silently overwritten.
    pub fn load(&self) -> IndexResult<IndexSnapshot> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no index yet, starting empty");
                return Ok(IndexSnapshot::default());
            }
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(IndexSnapshot::default());
        }

        serde_json::from_str(&content).map_err(|source| IndexError::Parse {
            path: self.path.display().to_string(),
            source,
        })
    }

    /// Writes the snapshot, replacing the previous one atomically
    ///
    /// The document goes to a temporary file in the same directory which is
    /// then renamed over the target.
    pub fn save(&self, snapshot: &IndexSnapshot) -> IndexResult<()> {
        let json = serde_json::to_string_pretty(snapshot).map_err(IndexError::Serialize)?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "index.json".to_string());
        let tmp_path = dir.join(format!(".{}.tmp", file_name));

        {
            let mut file = fs::File::create(&tmp_path)?;
            file.write_all(json.as_bytes())?;
            file.write_all(b"\n")?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &self.path)?;

        tracing::debug!(path = %self.path.display(), "index written");
        Ok(())
    }
}
