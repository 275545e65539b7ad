use crate::position::{Position, Range};
use std::collections::BTreeMap;
use std::collections::btree_map;
use std::path::{Path, PathBuf};

/// One textual replacement in a source file
///
/// An empty replacement string deletes the range. The range may be widened
/// before the edit is inserted into an edit set (e.g. to swallow a list
/// separator), but an edit is immutable once it is owned by a set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    range: Range,
    replacement: String,
}

impl Edit {
    /// Create an edit replacing `range` with `replacement`
    pub fn new(range: Range, replacement: impl Into<String>) -> Self {
        Self {
            range,
            replacement: replacement.into(),
        }
    }

    /// Create an edit deleting `range`
    pub fn delete(range: Range) -> Self {
        Self::new(range, String::new())
    }

    /// Range of source text this edit replaces
    pub fn range(&self) -> Range {
        self.range
    }

    /// Replacement text written in place of the range
    pub fn replacement(&self) -> &str {
        &self.replacement
    }
}

/// Error types for edit set construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    /// Two edits' ranges intersect
    ///
    /// Signals a bug in the refactoring algorithm's range math, not a user
    /// error: edit computations must never produce intersecting ranges.
    Overlap { existing: Range, rejected: Range },
}

impl std::fmt::Display for EditError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EditError::Overlap { existing, rejected } => {
                write!(
                    f,
                    "intersecting edits are not supported: {} overlaps existing edit {}",
                    rejected, existing
                )
            }
        }
    }
}

impl std::error::Error for EditError {}

/// Edits for a single source file, ordered by start position
///
/// The ordering lets the rewriter consume edits in one forward pass over the
/// source text. Insertion rejects any edit whose range intersects an edit
/// already in the set; edits whose ranges merely touch are accepted.
#[derive(Debug, Clone, Default)]
pub struct FileEdits {
    edits: BTreeMap<Position, Edit>,
}

impl FileEdits {
    /// Create an empty edit set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an edit to the set
    ///
    /// Fails with `EditError::Overlap` if the edit's range intersects an
    /// existing edit's range. An edit always overlaps itself, so re-adding
    /// an identical edit fails too, zero-length insertion points included.
    pub fn add(&mut self, edit: Edit) -> Result<(), EditError> {
        let range = edit.range();

        // Previous edit (greatest start <= new start) must end at or before
        // the new edit's start. A shared start position is always a conflict.
        if let Some((_, prev)) = self.edits.range(..=range.start).next_back() {
            if prev.range().start == range.start || prev.range().end > range.start {
                return Err(EditError::Overlap {
                    existing: prev.range(),
                    rejected: range,
                });
            }
        }

        // Next edit (least start > new start) must begin at or after the new
        // edit's end.
        if let Some((_, next)) = self.edits.range(range.start..).next() {
            if range.end > next.range().start {
                return Err(EditError::Overlap {
                    existing: next.range(),
                    rejected: range,
                });
            }
        }

        self.edits.insert(range.start, edit);
        Ok(())
    }

    /// Iterate over edits in ascending start-position order
    pub fn edits(&self) -> Edits<'_> {
        Edits {
            inner: self.edits.values(),
        }
    }

    /// Number of edits in the set
    pub fn len(&self) -> usize {
        self.edits.len()
    }

    /// Check whether the set contains no edits
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }
}

/// Iterator over a file's edits in ascending start-position order
#[derive(Debug, Clone)]
pub struct Edits<'a> {
    inner: btree_map::Values<'a, Position, Edit>,
}

impl<'a> Iterator for Edits<'a> {
    type Item = &'a Edit;

    fn next(&mut self) -> Option<&'a Edit> {
        self.inner.next()
    }
}

/// Edits grouped by the source file they apply to
///
/// One refactoring computation fills one of these; edits fan out across
/// files when the refactored entity is used outside its declaring file.
/// Each per-file set is rewritten independently, so no cross-file ordering
/// is maintained.
#[derive(Debug, Clone, Default)]
pub struct MultiFileEdits {
    files: BTreeMap<PathBuf, FileEdits>,
}

impl MultiFileEdits {
    /// Create an empty multi-file edit set
    pub fn new() -> Self {
        Self::default()
    }

    /// Route an edit into the edit set for `path`, creating it if absent
    pub fn add(&mut self, path: impl Into<PathBuf>, edit: Edit) -> Result<(), EditError> {
        self.files.entry(path.into()).or_default().add(edit)
    }

    /// Edit set for a specific file, if any edits were recorded for it
    pub fn get(&self, path: &Path) -> Option<&FileEdits> {
        self.files.get(path)
    }

    /// Iterate over `(path, edits)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&Path, &FileEdits)> {
        self.files.iter().map(|(p, e)| (p.as_path(), e))
    }

    /// Number of files with edits
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check whether no file has edits
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
