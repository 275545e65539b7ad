use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Position in a source file (line and column numbers)
///
/// Positions are ordered lexicographically: first by line, then by column.
/// This matches the order in which a forward pass over the text visits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed, in bytes)
    pub column: usize,
}

impl Position {
    /// Create a new position
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(line {}, column {})", self.line, self.column)
    }
}

/// Half-open span in a source file: `[start, end)`
///
/// A zero-length range (`start == end`) is a pure insertion point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    /// Start position (inclusive)
    pub start: Position,
    /// End position (exclusive)
    pub end: Position,
}

impl Range {
    /// Create a new range from start to end
    ///
    /// Panics in debug builds if `start > end`.
    pub fn new(start: Position, end: Position) -> Self {
        debug_assert!(start <= end, "range start must not exceed range end");
        Self { start, end }
    }

    /// Create a zero-length range at the given position
    pub fn point(position: Position) -> Self {
        Self {
            start: position,
            end: position,
        }
    }

    /// Check whether the range contains the given position
    pub fn contains(&self, pos: Position) -> bool {
        self.start <= pos && pos < self.end
    }
}

impl std::fmt::Display for Range {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}..{})", self.start, self.end)
    }
}

/// A position qualified with the file it refers to
///
/// Parsed from the external descriptor grammar `<path>:<line>:<column>`,
/// where the two rightmost `:`-separated fields are the line and column and
/// everything before them is the path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePosition {
    /// Path to the source file
    pub path: PathBuf,
    /// Position within the file
    pub pos: Position,
}

impl std::fmt::Display for FilePosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.path.display(),
            self.pos.line,
            self.pos.column
        )
    }
}

/// Error types for position descriptor parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsePositionError {
    /// Descriptor does not have the `<path>:<line>:<column>` shape
    MissingField(String),
    /// Line or column field is not a positive integer
    InvalidNumber { descriptor: String, field: String },
}

impl std::fmt::Display for ParsePositionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParsePositionError::MissingField(d) => {
                write!(f, "invalid position descriptor '{}': expected <path>:<line>:<column>", d)
            }
            ParsePositionError::InvalidNumber { descriptor, field } => {
                write!(
                    f,
                    "invalid position descriptor '{}': '{}' is not a positive integer",
                    descriptor, field
                )
            }
        }
    }
}

impl std::error::Error for ParsePositionError {}

impl FromStr for FilePosition {
    type Err = ParsePositionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (rest, column) = s
            .rsplit_once(':')
            .ok_or_else(|| ParsePositionError::MissingField(s.to_string()))?;
        let (path, line) = rest
            .rsplit_once(':')
            .ok_or_else(|| ParsePositionError::MissingField(s.to_string()))?;

        if path.is_empty() {
            return Err(ParsePositionError::MissingField(s.to_string()));
        }

        let parse_field = |field: &str| -> Result<usize, ParsePositionError> {
            match field.parse::<usize>() {
                Ok(n) if n > 0 => Ok(n),
                _ => Err(ParsePositionError::InvalidNumber {
                    descriptor: s.to_string(),
                    field: field.to_string(),
                }),
            }
        };

        Ok(FilePosition {
            path: PathBuf::from(path),
            pos: Position::new(parse_field(line)?, parse_field(column)?),
        })
    }
}
