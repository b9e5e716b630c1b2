//! Scoped temporary-directory ownership for a validator run.
//!
//! [`RunTempRoot`] is acquired once per run and released (recursively
//! removed) when it drops. Each plugin gets its own [`PluginWorkdir`] inside
//! the root, destroyed independently of the root and of sibling workers.

use std::fs;
use std::path::{Path, PathBuf};

/// The single temp root for a validator run.
pub struct RunTempRoot {
    dir: tempfile::TempDir,
}

impl RunTempRoot {
    pub fn create() -> std::io::Result<Self> {
        Ok(Self {
            dir: tempfile::Builder::new().prefix("marketgate-run-").tempdir()?,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// Sanitize a plugin name into a filesystem-safe directory name: slashes and
/// colons (which could otherwise escape the run root or collide with OS
/// path separators) become underscores.
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c == '/' || c == ':' || c == '\\' { '_' } else { c })
        .collect()
}

/// One plugin's exclusive clone directory. Removed on drop regardless of how
/// the owning pipeline exits (success, validation failure, or panic
/// unwinding through `catch_unwind`).
pub struct PluginWorkdir {
    path: PathBuf,
}

impl PluginWorkdir {
    pub fn create(run_root: &Path, plugin_name: &str) -> std::io::Result<Self> {
        let path = run_root.join(sanitize(plugin_name));
        fs::create_dir_all(&path)?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PluginWorkdir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}
