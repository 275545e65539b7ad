// Source positions, ranges and the position descriptor grammar
pub mod position;

// Edit model: single-file and multi-file edit sets
pub mod edit;

// Streaming source rewriter
pub mod rewrite;

// Source file reading with checksums
pub mod file;

// Read-only code model boundary
pub mod model;

// Refactoring action contract and registry
pub mod action;

// Concrete refactoring actions
pub mod find_definition;
pub mod remove_param;

// JSON edit report output
pub mod json;

// Re-exports
pub use position::{FilePosition, ParsePositionError, Position, Range};
pub use edit::{Edit, EditError, FileEdits, MultiFileEdits};
pub use rewrite::{RewriteError, rewrite, rewrite_to_string};
pub use file::{FileContent, FileError, read_file, verify_checksum};
pub use model::{
    AstNode, CodeModel, Definition, Entity, EntityId, EntityKind, FileId, MemoryCodeModel,
    ModelError, NodeId, NodeKind, SourceFile, Use,
};
pub use action::{
    ActionError, ActionOptions, ActionParam, ActionRegistry, ModificationAction, RefactorAction,
    perform_modification,
};
pub use find_definition::FindDefinitionAction;
pub use remove_param::TemplateParameterRemoveAction;
pub use json::{EditRecord, EditReport, FileEditList, generate_execution_id};
