//! Environment errors (spec §7): failures to load an on-disk artifact at
//! binary startup. Grounded in the pack's convention of a small,
//! hand-written `Display`/`Error` enum rather than pulling in a derive
//! crate for the one or two variants this crate actually needs (e.g.
//! `bkushigian-postflop-solver`'s own manual error enums).

use std::fmt;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum LoadError {
    Io { path: PathBuf, source: io::Error },
}

impl LoadError {
    pub fn path(&self) -> &Path {
        match self {
            Self::Io { path, .. } => path,
        }
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "failed to load '{}': {source}", path.display()),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
        }
    }
}

/// open `path` for buffered reading, wrapping any failure as an
/// environment error: every caller here treats the trained/clustered
/// artifacts on disk as a load-bearing contract, not incidental I/O, so a
/// missing file should read as "run `cluster`/`train` first", not a bare
/// `No such file or directory`.
pub fn open(path: impl AsRef<Path>) -> Result<BufReader<File>, LoadError> {
    let path = path.as_ref();
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| LoadError::Io { path: path.to_path_buf(), source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_reported_with_its_path() {
        let err = open("/nonexistent/path/for/tests.txt").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/path/for/tests.txt"));
        assert_eq!(err.path(), Path::new("/nonexistent/path/for/tests.txt"));
    }
}
