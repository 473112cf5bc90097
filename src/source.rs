//! Reading of WDL source files.

use std::io;
use std::path::Path;
use std::path::PathBuf;

/// The extension expected of WDL source files.
const WDL_EXTENSION: &str = "wdl";

/// An error reading a source file.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The source file does not exist.
    #[error("source file `{path}` does not exist", path = .0.display())]
    NotFound(PathBuf),
    /// The source file could not be read.
    #[error("failed to read source file `{path}`", path = .path.display())]
    Read {
        /// The path of the source file.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// Reads the bytes of a source file.
///
/// A warning is logged if the file does not have a `.wdl` extension; the file
/// is read regardless.
pub fn read_source(path: &Path) -> Result<Vec<u8>, SourceError> {
    if !path.exists() {
        return Err(SourceError::NotFound(path.to_path_buf()));
    }

    if path.extension().and_then(|e| e.to_str()) != Some(WDL_EXTENSION) {
        tracing::warn!(
            "source file `{path}` does not have a `.{WDL_EXTENSION}` extension",
            path = path.display()
        );
    }

    tracing::debug!("reading source file `{path}`", path = path.display());
    std::fs::read(path).map_err(|source| SourceError::Read {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.wdl");
        let e = read_source(&path).unwrap_err();
        assert!(matches!(e, SourceError::NotFound(_)));
        assert_eq!(
            e.to_string(),
            format!("source file `{path}` does not exist", path = path.display())
        );
    }

    #[test]
    fn reads_any_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("source.txt");
        std::fs::write(&path, "version 1.1").unwrap();
        assert_eq!(read_source(&path).unwrap(), b"version 1.1");
    }
}
