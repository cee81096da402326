// Copyright 2018 Pants project contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use hashing::Digest;
use node_automata::ShapeKey;

use crate::error::Error;

/// One of the node-artifact cache's output subdirectories.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum OutputKind {
    Lnt,
    Bcg,
    Aut,
    /// The top-level parallel-composition script (`sync_composer::composition_script`'s
    /// `hide ... label par using ... end hide` output), keyed by the whole DFT's own shape
    /// rather than a per-node one.
    Svl,
}

impl OutputKind {
    fn dir_name(self) -> &'static str {
        match self {
            OutputKind::Lnt => "lntnodes",
            OutputKind::Bcg => "bcgnodes",
            OutputKind::Aut => "aut",
            OutputKind::Svl => "svl",
        }
    }

    fn extension(self) -> &'static str {
        match self {
            OutputKind::Lnt => "lnt",
            OutputKind::Bcg => "bcg",
            OutputKind::Aut => "aut",
            OutputKind::Svl => "svl",
        }
    }
}

/// The current format-version header this generator writes (`(** V<nnnnnn>`, §6); a cached
/// file whose header doesn't match forces regeneration rather than being trusted as-is.
pub const FORMAT_VERSION: u32 = 1;

/// A handle onto the on-disk node-artifact cache rooted at `Config::artifact_root`. Writes are
/// atomic (temp file + rename) so a killed subprocess never leaves a half-written file behind
/// wearing a `.valid` sentinel.
pub struct Cache {
    root: PathBuf,
}

impl Cache {
    pub fn new(root: PathBuf) -> Cache {
        Cache { root }
    }

    /// The canonical path for `shape_key`'s artifact of the given kind; two nodes with the same
    /// shape key resolve to the same path.
    pub fn path_for(&self, shape_key: &ShapeKey, kind: OutputKind) -> PathBuf {
        self.root.join(kind.dir_name()).join(format!("{shape_key}.{}", kind.extension()))
    }

    /// The path for a whole model's composition script, named after the model rather than a
    /// per-node shape key (the composition as a whole has no single shape).
    pub fn script_path(&self, model_name: &str) -> PathBuf {
        self.root.join(OutputKind::Svl.dir_name()).join(format!("{model_name}.{}", OutputKind::Svl.extension()))
    }

    fn valid_sentinel(path: &Path) -> PathBuf {
        let mut sentinel = path.as_os_str().to_owned();
        sentinel.push(".valid");
        PathBuf::from(sentinel)
    }

    fn digest_sentinel(path: &Path) -> PathBuf {
        let mut sentinel = path.as_os_str().to_owned();
        sentinel.push(".digest");
        PathBuf::from(sentinel)
    }

    /// True if `path` exists, its `.valid` sentinel is at least as new as it, its content still
    /// hashes to the `.digest` sentinel recorded at write time, and its format version header
    /// (if present) matches `FORMAT_VERSION`. The digest check catches truncation or corruption
    /// that an mtime comparison alone would miss.
    pub fn is_valid(&self, path: &Path) -> bool {
        let Ok(file_meta) = fs::metadata(path) else {
            return false;
        };
        let sentinel = Self::valid_sentinel(path);
        let Ok(sentinel_meta) = fs::metadata(&sentinel) else {
            return false;
        };
        let (Ok(file_mtime), Ok(sentinel_mtime)) = (file_meta.modified(), sentinel_meta.modified()) else {
            return false;
        };
        if sentinel_mtime < file_mtime {
            return false;
        }
        let Ok(contents) = fs::read(path) else {
            return false;
        };
        let Ok(recorded_digest) = fs::read_to_string(Self::digest_sentinel(path)) else {
            return false;
        };
        if Digest::of_bytes(&contents).hash.to_hex() != recorded_digest.trim() {
            return false;
        }
        match header_version(&String::from_utf8_lossy(&contents)) {
            Some(version) => version == FORMAT_VERSION,
            None => true,
        }
    }

    /// Writes `contents` to `path` atomically (temp file in the same directory, then rename)
    /// and stamps a fresh `.valid`/`.digest` sentinel pair, but only after the write itself
    /// succeeded.
    pub fn write_atomic(&self, path: &Path, contents: &str) -> Result<(), Error> {
        let dir = path.parent().ok_or_else(|| Error::Artifact(format!("no parent directory for {}", path.display())))?;
        fs::create_dir_all(dir).map_err(|e| artifact_io_error(path, e))?;

        let tmp_path = dir.join(format!(
            ".{}.tmp",
            path.file_name().and_then(|n| n.to_str()).unwrap_or("artifact")
        ));
        fs::write(&tmp_path, contents).map_err(|e| artifact_io_error(&tmp_path, e))?;
        fs::rename(&tmp_path, path).map_err(|e| artifact_io_error(path, e))?;

        let digest = Digest::of_bytes(contents.as_bytes());
        fs::write(Self::digest_sentinel(path), digest.hash.to_hex())
            .map_err(|e| artifact_io_error(path, e))?;

        let sentinel = Self::valid_sentinel(path);
        fs::write(&sentinel, b"").map_err(|e| artifact_io_error(&sentinel, e))?;
        // Ensure the sentinel's mtime is unambiguously >= the artifact's even on coarse
        // filesystem clock resolutions.
        let now = SystemTime::now();
        let _ = filetime_touch(&sentinel, now);
        Ok(())
    }
}

fn artifact_io_error(path: &Path, e: io::Error) -> Error {
    Error::Artifact(format!("{}: {}", path.display(), e))
}

fn filetime_touch(path: &Path, time: SystemTime) -> io::Result<()> {
    let file = fs::OpenOptions::new().write(true).open(path)?;
    file.set_modified(time)
}

fn header_version(contents: &str) -> Option<u32> {
    let first_line = contents.lines().next()?;
    let rest = first_line.strip_prefix("(** V")?;
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape() -> ShapeKey {
        ShapeKey::Voting { k: 2, n: 3, is_always_active: false }
    }

    #[test]
    fn path_for_same_shape_key_is_stable_across_kinds() {
        let cache = Cache::new(PathBuf::from("/tmp/dft-cache-test"));
        let p1 = cache.path_for(&shape(), OutputKind::Lnt);
        let p2 = cache.path_for(&shape(), OutputKind::Lnt);
        assert_eq!(p1, p2);
        assert!(p1.to_string_lossy().ends_with(".lnt"));
    }

    #[test]
    fn missing_file_is_never_valid() {
        let cache = Cache::new(PathBuf::from("/tmp/dft-cache-test-missing"));
        let path = cache.path_for(&shape(), OutputKind::Bcg);
        assert!(!cache.is_valid(&path));
    }

    #[test]
    fn header_version_parses_the_leading_v_nnnnnn_comment() {
        assert_eq!(header_version("(** V000001 *)\nrest"), Some(1));
        assert_eq!(header_version("no header here"), None);
    }

    #[test]
    fn write_then_validate_round_trip() {
        let dir = std::env::temp_dir().join(format!("dft-cache-test-{}", std::process::id()));
        let cache = Cache::new(dir.clone());
        let path = cache.path_for(&shape(), OutputKind::Lnt);
        cache.write_atomic(&path, "(** V000001 *)\nmodule\n").unwrap();
        assert!(cache.is_valid(&path));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn content_truncated_after_writing_fails_the_digest_check() {
        let dir = std::env::temp_dir().join(format!("dft-cache-test-corrupt-{}", std::process::id()));
        let cache = Cache::new(dir.clone());
        let path = cache.path_for(&shape(), OutputKind::Lnt);
        cache.write_atomic(&path, "(** V000001 *)\nmodule\n").unwrap();
        // Simulate a killed writer elsewhere truncating the file without going through
        // `write_atomic` (and so without updating the `.digest` sentinel to match).
        fs::write(&path, "(** V000001 *)\n").unwrap();
        assert!(!cache.is_valid(&path));
        let _ = fs::remove_dir_all(&dir);
    }
}
