use crate::edit::MultiFileEdits;
use crate::position::Position;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Machine-readable report of the edits a refactoring action computed
///
/// Emitted instead of rewritten source when the caller asks for JSON
/// output. Unlike the rewrite path, the report carries edits for every
/// touched file, so downstream tooling can apply multi-file refactorings
/// this tool does not rewrite itself yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditReport {
    /// Unique id of this action invocation
    pub execution_id: String,
    /// Name of the action that produced the edits
    pub action: String,
    /// Per-file edit lists, ordered by path
    pub files: Vec<FileEditList>,
}

/// Edits computed for one file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileEditList {
    /// Path of the file the edits apply to
    pub path: String,
    /// Edits in ascending start-position order
    pub edits: Vec<EditRecord>,
}

/// One computed edit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditRecord {
    /// Start of the replaced range (inclusive)
    pub start: Position,
    /// End of the replaced range (exclusive)
    pub end: Position,
    /// Text to write in place of the range; empty means deletion
    pub replacement: String,
}

impl EditReport {
    /// Build a report from a computed multi-file edit set
    pub fn new(action: &str, edits: &MultiFileEdits) -> Self {
        let files = edits
            .iter()
            .map(|(path, file_edits)| FileEditList {
                path: path.display().to_string(),
                edits: file_edits
                    .edits()
                    .map(|e| EditRecord {
                        start: e.range().start,
                        end: e.range().end,
                        replacement: e.replacement().to_string(),
                    })
                    .collect(),
            })
            .collect();

        Self {
            execution_id: generate_execution_id(),
            action: action.to_string(),
            files,
        }
    }
}

/// Generate a unique execution id for a report
pub fn generate_execution_id() -> String {
    Uuid::new_v4().to_string()
}
