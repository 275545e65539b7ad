use std::fs;
use std::io;
use std::path::Path;

/// Content of a source file read into memory
#[derive(Debug, Clone)]
pub struct FileContent {
    /// Path the file was read from
    pub path: String,
    /// File content as valid UTF-8 text
    pub content: String,
    /// BLAKE3 hash of the content (hex-encoded)
    pub checksum: String,
}

/// Error types for file operations
#[derive(Debug)]
pub enum FileError {
    NotFound(String),
    IoError(String),
    InvalidUtf8(String),
    /// File content does not match the checksum the code model was built from
    ChecksumMismatch {
        path: String,
        expected: String,
        actual: String,
    },
}

impl std::fmt::Display for FileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileError::NotFound(p) => write!(f, "file not found: {}", p),
            FileError::IoError(e) => write!(f, "I/O error: {}", e),
            FileError::InvalidUtf8(p) => write!(f, "invalid UTF-8 in file: {}", p),
            FileError::ChecksumMismatch {
                path,
                expected,
                actual,
            } => write!(
                f,
                "source file '{}' does not match the text the code model was built from: \
                 expected checksum {}, got {}",
                path, expected, actual
            ),
        }
    }
}

impl std::error::Error for FileError {}

impl From<io::Error> for FileError {
    fn from(err: io::Error) -> Self {
        FileError::IoError(err.to_string())
    }
}

/// Read a source file from disk with UTF-8 validation
///
/// # Returns
/// * `Ok(FileContent)` - content plus its BLAKE3 checksum
/// * `Err(FileError)` - file not found, I/O error, or invalid UTF-8
pub fn read_file<P: AsRef<Path>>(path: P) -> Result<FileContent, FileError> {
    let path_ref = path.as_ref();

    if !path_ref.exists() {
        return Err(FileError::NotFound(path_ref.display().to_string()));
    }

    let bytes = fs::read(path_ref)?;

    let content = String::from_utf8(bytes)
        .map_err(|_| FileError::InvalidUtf8(path_ref.display().to_string()))?;

    let checksum = blake3::hash(content.as_bytes()).to_hex().to_string();

    Ok(FileContent {
        path: path_ref.display().to_string(),
        content,
        checksum,
    })
}

/// Verify that file content matches an expected BLAKE3 checksum
pub fn verify_checksum(content: &FileContent, expected: &str) -> Result<(), FileError> {
    if content.checksum == expected {
        Ok(())
    } else {
        Err(FileError::ChecksumMismatch {
            path: content.path.clone(),
            expected: expected.to_string(),
            actual: content.checksum.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_read_file_valid_utf8() {
        let temp_dir = std::env::temp_dir();
        let file_path = temp_dir.join("source_refactor_read_test.cpp");
        let content = "template <typename T>\nstruct box {};\n";

        fs::write(&file_path, content.as_bytes()).unwrap();

        let result = read_file(&file_path).unwrap();

        assert_eq!(result.content, content);
        assert_eq!(result.path, file_path.display().to_string());
        assert!(result.checksum.chars().all(|c| c.is_ascii_hexdigit()));

        fs::remove_file(&file_path).unwrap();
    }

    #[test]
    fn test_read_file_invalid_utf8() {
        let temp_dir = std::env::temp_dir();
        let file_path = temp_dir.join("source_refactor_utf8_test.cpp");

        fs::write(&file_path, [0xFF, 0xFE, 0xFD]).unwrap();

        let result = read_file(&file_path);
        assert!(matches!(result, Err(FileError::InvalidUtf8(_))));

        fs::remove_file(&file_path).unwrap();
    }

    #[test]
    fn test_read_file_not_found() {
        let result = read_file("/nonexistent/path/missing.cpp");

        assert!(matches!(result, Err(FileError::NotFound(_))));
    }

    #[test]
    fn test_verify_checksum() {
        let content = FileContent {
            path: "a.cpp".to_string(),
            content: "int x;\n".to_string(),
            checksum: blake3::hash(b"int x;\n").to_hex().to_string(),
        };

        let expected = content.checksum.clone();
        assert!(verify_checksum(&content, &expected).is_ok());

        let result = verify_checksum(&content, "deadbeef");
        assert!(matches!(result, Err(FileError::ChecksumMismatch { .. })));
    }
}
