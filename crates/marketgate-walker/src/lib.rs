//! Bounded, symlink-safe filesystem walk over a fetched plugin repository.
//!
//! The walker never executes or interprets file contents beyond a short
//! binary-detection probe; it exists purely to produce a capped, vetted list
//! of regular files for the scanner to read.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use walkdir::WalkDir;

/// 2 MiB — a single file above this size is rejected outright.
pub const MAX_FILE_SIZE: u64 = 2 * 1024 * 1024;
/// 20 MiB — sum of file sizes in the repo (excluding `.git`) above this is
/// rejected.
pub const MAX_REPO_SIZE: u64 = 20 * 1024 * 1024;
/// Hard cap on the number of files walked.
pub const MAX_FILES: usize = 2500;

const PROBE_BYTES: usize = 4096;
const NON_PRINTABLE_RATIO_THRESHOLD: f64 = 0.35;

const SKIP_DIRS: &[&str] = &[
    ".git",
    ".idea",
    ".vscode",
    "__pycache__",
    ".gradle",
    "build",
    "dist",
    "node_modules",
    ".tmp",
    ".cache",
];

const DISALLOWED_EXTENSIONS: &[&str] = &[
    // compiled objects / libraries / executables
    "o", "obj", "so", "dll", "dylib", "a", "lib", "exe", // archives
    "zip", "tar", "gz", "tgz", "bz2", "xz", "7z", "rar", // images
    "png", "jpg", "jpeg", "gif", "bmp", "ico", "webp", "tiff", // video
    "mp4", "mov", "avi", "mkv", "webm", // documents / binaries
    "pdf", "wasm",
];

const TEXT_EXTENSIONS: &[&str] = &[
    "md", "markdown", "txt", "rst", // structured config
    "json", "yaml", "yml", "toml", "ini", "cfg", // source
    "py", "js", "jsx", "ts", "tsx", "rb", "go", "rs", "java", "c", "h", "cpp", "hpp", "cs", "php",
    "swift", "kt", "scala", "lua", "sql", "html", "css", "xml", // shell
    "sh", "bash", "zsh", "ps1",
];

/// One file accepted by the walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkedFile {
    /// Path relative to the repo root.
    pub path: PathBuf,
    pub size: u64,
}

/// Output of a successful walk.
#[derive(Debug, Clone, Default)]
pub struct WalkResult {
    pub files: Vec<WalkedFile>,
    pub total_size: u64,
    pub warnings: Vec<String>,
}

#[derive(Debug, Error)]
pub enum WalkError {
    #[error("repository exceeds max size of {max} bytes (was {total} bytes)")]
    RepoTooLarge { total: u64, max: u64 },
    #[error("repository has more than {max} files")]
    TooManyFiles { max: usize },
    #[error("disallowed file extension at {path}", path = .path.display())]
    DisallowedExtension { path: PathBuf },
    #[error("file exceeds max size of {max} bytes: {path}", path = .path.display())]
    FileTooLarge { path: PathBuf, max: u64 },
    #[error("binary content detected at {path}", path = .path.display())]
    BinaryFile { path: PathBuf },
    #[error("I/O error walking repository: {0}")]
    Io(#[from] std::io::Error),
}

fn extension_lower(path: &Path) -> Option<String> {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
}

fn looks_binary(bytes: &[u8]) -> bool {
    if bytes.contains(&0) {
        return true;
    }
    if bytes.is_empty() {
        return false;
    }
    let non_printable = bytes
        .iter()
        .filter(|&&b| !(b == b'\t' || b == b'\n' || b == b'\r' || (0x20..=0x7E).contains(&b)))
        .count();
    (non_printable as f64 / bytes.len() as f64) > NON_PRINTABLE_RATIO_THRESHOLD
}

/// Walk `root`, enforcing the skip-dir list, symlink safety, and the
/// size/count/extension caps described in the module docs.
///
/// Returns a hard [`WalkError`] on the first cap violation or disallowed
/// content; non-fatal anomalies (symlinks encountered) are collected as
/// warnings in the returned [`WalkResult`] instead.
pub fn walk(root: &Path) -> Result<WalkResult, WalkError> {
    let skip: HashSet<&str> = SKIP_DIRS.iter().copied().collect();
    let mut result = WalkResult::default();

    let mut it = WalkDir::new(root).follow_links(false).into_iter();
    while let Some(entry) = it.next() {
        let entry = entry.map_err(|e| {
            WalkError::Io(e.into_io_error().unwrap_or_else(|| {
                std::io::Error::other("walk entry error")
            }))
        })?;

        if entry.path() == root {
            continue;
        }

        let file_type = entry.file_type();
        let name = entry.file_name().to_string_lossy();

        if file_type.is_dir() {
            if skip.contains(name.as_ref()) {
                it.skip_current_dir();
            }
            continue;
        }

        if entry.path_is_symlink() {
            result.warnings.push(format!(
                "symlink not followed: {}",
                entry.path().strip_prefix(root).unwrap_or(entry.path()).display()
            ));
            continue;
        }

        if !file_type.is_file() {
            continue;
        }

        let rel = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .to_path_buf();

        let metadata = entry.metadata()?;
        let size = metadata.len();

        if size > MAX_FILE_SIZE {
            return Err(WalkError::FileTooLarge {
                path: rel,
                max: MAX_FILE_SIZE,
            });
        }

        let ext = extension_lower(&rel);
        let is_disallowed = ext
            .as_deref()
            .is_some_and(|e| DISALLOWED_EXTENSIONS.contains(&e));
        if is_disallowed {
            return Err(WalkError::DisallowedExtension { path: rel });
        }

        let is_text = ext
            .as_deref()
            .is_some_and(|e| TEXT_EXTENSIONS.contains(&e));
        if !is_text {
            let probe = read_probe(entry.path())?;
            if looks_binary(&probe) {
                return Err(WalkError::BinaryFile { path: rel });
            }
        }

        result.total_size += size;
        if result.total_size > MAX_REPO_SIZE {
            return Err(WalkError::RepoTooLarge {
                total: result.total_size,
                max: MAX_REPO_SIZE,
            });
        }

        result.files.push(WalkedFile { path: rel, size });
        if result.files.len() > MAX_FILES {
            return Err(WalkError::TooManyFiles { max: MAX_FILES });
        }
    }

    Ok(result)
}

fn read_probe(path: &Path) -> std::io::Result<Vec<u8>> {
    use std::io::Read;
    let mut f = fs::File::open(path)?;
    let mut buf = vec![0u8; PROBE_BYTES];
    let n = f.read(&mut buf)?;
    buf.truncate(n);
    Ok(buf)
}
