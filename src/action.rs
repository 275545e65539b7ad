use crate::edit::{EditError, MultiFileEdits};
use crate::file::{FileError, read_file, verify_checksum};
use crate::json::EditReport;
use crate::model::CodeModel;
use crate::position::{FilePosition, Range};
use crate::rewrite::{RewriteError, rewrite};
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::PathBuf;

/// Declarative description of one action parameter
///
/// Actions describe their extra parameters instead of parsing them, so the
/// CLI shell can render help and validate presence uniformly.
#[derive(Debug, Clone, Copy)]
pub struct ActionParam {
    pub name: &'static str,
    pub required: bool,
    pub help: &'static str,
}

/// Parsed parameters of one action invocation
#[derive(Debug, Clone, Default)]
pub struct ActionOptions {
    /// Position of the symbol the action operates on
    pub position: Option<FilePosition>,
    /// Emit a JSON edit report instead of rewritten source
    pub json: bool,
}

/// Error types for refactoring actions
#[derive(Debug)]
pub enum ActionError {
    /// A declared required parameter was not supplied
    MissingParam(&'static str),
    /// No action with the requested name is registered
    UnknownAction(String),
    /// The position's file is not part of the code model
    FileNotInModel(PathBuf),
    /// No AST node exists at the given position
    NoNodeAtPosition(FilePosition),
    /// The AST node at the position is not an identifier
    NotAnIdentifier {
        pos: FilePosition,
        class_name: String,
        range: Range,
    },
    /// The identifier does not reference a resolved entity
    UnresolvedIdentifier(FilePosition),
    /// The resolved entity is not a template parameter
    NotATemplateParameter { pos: FilePosition, entity: String },
    /// The resolved entity has no recorded definition location
    NoDefinitionLocation(FilePosition),
    /// The code model violated its own contract
    InconsistentModel(String),
    /// The action computed no edits at all
    NoEdits,
    /// Edits span several files, which the rewriter does not support yet
    MultiFileUnsupported(usize),
    /// Two computed edits intersect
    Edit(EditError),
    /// Applying the edits to the source text failed
    Rewrite(RewriteError),
    /// Reading the source file failed
    File(FileError),
    /// Serializing the edit report failed
    Json(serde_json::Error),
    /// Writing action output failed
    Io(io::Error),
}

impl std::fmt::Display for ActionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionError::MissingParam(name) => {
                write!(f, "required action parameter '--{}' is not set", name)
            }
            ActionError::UnknownAction(name) => {
                write!(f, "can't find refactor action with name: {}", name)
            }
            ActionError::FileNotInModel(path) => {
                write!(f, "can't find source file '{}' in code model", path.display())
            }
            ActionError::NoNodeAtPosition(pos) => {
                write!(f, "can't find AST node located at source position {}", pos)
            }
            ActionError::NotAnIdentifier {
                pos,
                class_name,
                range,
            } => write!(
                f,
                "can't find symbol at source position {}: AST node located at specified \
                 position is not an identifier: {} {}",
                pos, class_name, range
            ),
            ActionError::UnresolvedIdentifier(pos) => write!(
                f,
                "can't find code model entity associated with identifier AST node \
                 located at source position {}",
                pos
            ),
            ActionError::NotATemplateParameter { pos, entity } => write!(
                f,
                "code model entity located at source position {} is not a template \
                 parameter: {}",
                pos, entity
            ),
            ActionError::NoDefinitionLocation(pos) => write!(
                f,
                "can't find definition location of entity referenced at source position {}",
                pos
            ),
            ActionError::InconsistentModel(what) => {
                write!(f, "code model is inconsistent: {}", what)
            }
            ActionError::NoEdits => {
                write!(f, "refactor action produced no source modifications")
            }
            ActionError::MultiFileUnsupported(count) => write!(
                f,
                "computed edits span {} files; rewriting more than one file is not \
                 supported yet (use --json to get the full edit set)",
                count
            ),
            ActionError::Edit(e) => write!(f, "{}", e),
            ActionError::Rewrite(e) => write!(f, "{}", e),
            ActionError::File(e) => write!(f, "{}", e),
            ActionError::Json(e) => write!(f, "can't serialize edit report: {}", e),
            ActionError::Io(e) => write!(f, "can't write action output: {}", e),
        }
    }
}

impl std::error::Error for ActionError {}

impl From<EditError> for ActionError {
    fn from(err: EditError) -> Self {
        ActionError::Edit(err)
    }
}

impl From<RewriteError> for ActionError {
    fn from(err: RewriteError) -> Self {
        ActionError::Rewrite(err)
    }
}

impl From<FileError> for ActionError {
    fn from(err: FileError) -> Self {
        ActionError::File(err)
    }
}

impl From<serde_json::Error> for ActionError {
    fn from(err: serde_json::Error) -> Self {
        ActionError::Json(err)
    }
}

impl From<io::Error> for ActionError {
    fn from(err: io::Error) -> Self {
        ActionError::Io(err)
    }
}

/// A named refactoring action
///
/// Implementations expose their name, a declarative description of their
/// parameters, and `perform`, which writes the action's result to `out`.
/// The CLI shell owns turning errors into exit codes.
pub trait RefactorAction {
    /// Action name as given on the command line
    fn name(&self) -> &'static str;

    /// Parameters this action accepts beyond the global ones
    fn params(&self) -> &'static [ActionParam];

    /// Perform the action against the code model
    fn perform(
        &self,
        model: &dyn CodeModel,
        opts: &ActionOptions,
        out: &mut dyn Write,
    ) -> Result<(), ActionError>;
}

pub(crate) const POSITION_PARAM: &[ActionParam] = &[ActionParam {
    name: "position",
    required: true,
    help: "Position of symbol in source code (<path>:<line>:<column>)",
}];

/// Resolve a source position to the entity its identifier references
///
/// The shared front half of position-based actions: locate the file, the
/// innermost AST node, require an identifier, require it to be resolved.
/// Each step failing is a distinct error naming the position.
pub(crate) fn resolve_entity_at(
    model: &dyn CodeModel,
    pos: &FilePosition,
) -> Result<crate::model::EntityId, ActionError> {
    let file = model
        .find_file(&pos.path)
        .ok_or_else(|| ActionError::FileNotInModel(pos.path.clone()))?;

    let node_id = model
        .find_node_at(file, pos.pos)
        .ok_or_else(|| ActionError::NoNodeAtPosition(pos.clone()))?;

    let node = model.node(node_id);
    let entity = match &node.kind {
        crate::model::NodeKind::Identifier { entity, .. } => *entity,
        other => {
            return Err(ActionError::NotAnIdentifier {
                pos: pos.clone(),
                class_name: other.class_name().to_string(),
                range: node.range,
            });
        }
    };

    entity.ok_or_else(|| ActionError::UnresolvedIdentifier(pos.clone()))
}

/// A refactoring action that computes source modifications
///
/// Implementors only compute edits; the shared `RefactorAction` impl
/// resolves the position parameter, runs the computation and renders the
/// result, either by rewriting the touched file or as a JSON edit report.
pub trait ModificationAction {
    /// Action name as given on the command line
    fn name(&self) -> &'static str;

    /// Compute the edit set realizing this refactoring at `pos`
    fn compute(
        &self,
        model: &dyn CodeModel,
        pos: &FilePosition,
    ) -> Result<MultiFileEdits, ActionError>;
}

/// Shared `perform` body for modification actions
///
/// Resolves the position parameter, runs the edit computation and renders
/// the result: a JSON edit report covering every touched file, or the
/// rewritten text of the single touched file. Concrete modification actions
/// implement `RefactorAction` by delegating here.
pub fn perform_modification(
    action: &dyn ModificationAction,
    model: &dyn CodeModel,
    opts: &ActionOptions,
    out: &mut dyn Write,
) -> Result<(), ActionError> {
    let pos = opts
        .position
        .as_ref()
        .ok_or(ActionError::MissingParam("position"))?;

    let edits = action.compute(model, pos)?;
    if edits.is_empty() {
        return Err(ActionError::NoEdits);
    }

    if opts.json {
        let report = EditReport::new(action.name(), &edits);
        let text = serde_json::to_string_pretty(&report)?;
        out.write_all(text.as_bytes())?;
        out.write_all(b"\n")?;
        return Ok(());
    }

    if edits.len() > 1 {
        return Err(ActionError::MultiFileUnsupported(edits.len()));
    }

    let (path, file_edits) = edits.iter().next().ok_or(ActionError::NoEdits)?;

    let content = read_file(path)?;
    if let Some(file_id) = model.find_file(path) {
        if let Some(expected) = &model.file(file_id).checksum {
            verify_checksum(&content, expected)?;
        }
    }

    rewrite(file_edits, &content.content, out)?;
    Ok(())
}

/// Registry of refactoring actions, looked up by name
#[derive(Default)]
pub struct ActionRegistry {
    actions: BTreeMap<&'static str, Box<dyn RefactorAction>>,
}

impl ActionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an action
    ///
    /// Registering two actions with the same name is a programming error.
    pub fn register(&mut self, action: Box<dyn RefactorAction>) {
        let previous = self.actions.insert(action.name(), action);
        debug_assert!(
            previous.is_none(),
            "refactor action with same name already registered"
        );
    }

    /// Find the action with the given name
    pub fn find(&self, name: &str) -> Result<&dyn RefactorAction, ActionError> {
        self.actions
            .get(name)
            .map(|a| a.as_ref())
            .ok_or_else(|| ActionError::UnknownAction(name.to_string()))
    }

    /// Iterate over all registered actions, ascending by name
    pub fn actions(&self) -> impl Iterator<Item = &dyn RefactorAction> {
        self.actions.values().map(|a| a.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit::Edit;
    use crate::model::MemoryCodeModel;
    use crate::position::{Position, Range};

    struct FixedEdits {
        edits_per_file: Vec<(&'static str, Range, &'static str)>,
    }

    impl ModificationAction for FixedEdits {
        fn name(&self) -> &'static str {
            "fixed-edits"
        }

        fn compute(
            &self,
            _model: &dyn CodeModel,
            _pos: &FilePosition,
        ) -> Result<MultiFileEdits, ActionError> {
            let mut edits = MultiFileEdits::new();
            for (path, range, replacement) in &self.edits_per_file {
                edits.add(*path, Edit::new(*range, *replacement))?;
            }
            Ok(edits)
        }
    }

    impl RefactorAction for FixedEdits {
        fn name(&self) -> &'static str {
            ModificationAction::name(self)
        }

        fn params(&self) -> &'static [ActionParam] {
            POSITION_PARAM
        }

        fn perform(
            &self,
            model: &dyn CodeModel,
            opts: &ActionOptions,
            out: &mut dyn Write,
        ) -> Result<(), ActionError> {
            perform_modification(self, model, opts, out)
        }
    }

    fn opts_at(descriptor: &str) -> ActionOptions {
        ActionOptions {
            position: Some(descriptor.parse().unwrap()),
            json: true,
        }
    }

    #[test]
    fn test_registry_find_and_order() {
        let mut registry = ActionRegistry::new();
        registry.register(Box::new(FixedEdits {
            edits_per_file: vec![],
        }));

        assert!(registry.find("fixed-edits").is_ok());
        assert!(matches!(
            registry.find("nope"),
            Err(ActionError::UnknownAction(_))
        ));

        let names: Vec<&str> = registry.actions().map(|a| a.name()).collect();
        assert_eq!(names, vec!["fixed-edits"]);
    }

    #[test]
    fn test_missing_position_param() {
        let action = FixedEdits {
            edits_per_file: vec![],
        };
        let model = MemoryCodeModel::default();
        let mut out = Vec::new();

        let result =
            perform_modification(&action, &model, &ActionOptions::default(), &mut out);

        assert!(matches!(result, Err(ActionError::MissingParam("position"))));
    }

    #[test]
    fn test_empty_computation_is_an_error() {
        let action = FixedEdits {
            edits_per_file: vec![],
        };
        let model = MemoryCodeModel::default();
        let mut out = Vec::new();

        let result = perform_modification(&action, &model, &opts_at("a.cpp:1:1"), &mut out);

        assert!(matches!(result, Err(ActionError::NoEdits)));
    }

    #[test]
    fn test_json_report_covers_all_files() {
        let range = Range::new(Position::new(1, 1), Position::new(1, 4));
        let action = FixedEdits {
            edits_per_file: vec![("a.cpp", range, "x"), ("b.cpp", range, "y")],
        };
        let model = MemoryCodeModel::default();
        let mut out = Vec::new();

        perform_modification(&action, &model, &opts_at("a.cpp:1:1"), &mut out).unwrap();

        let text = String::from_utf8_lossy(&out);
        assert!(text.contains("a.cpp"));
        assert!(text.contains("b.cpp"));
        assert!(text.contains("execution_id"));
    }

    #[test]
    fn test_multi_file_rewrite_rejected() {
        let range = Range::new(Position::new(1, 1), Position::new(1, 4));
        let action = FixedEdits {
            edits_per_file: vec![("a.cpp", range, "x"), ("b.cpp", range, "y")],
        };
        let model = MemoryCodeModel::default();
        let mut out = Vec::new();

        let mut opts = opts_at("a.cpp:1:1");
        opts.json = false;
        let result = perform_modification(&action, &model, &opts, &mut out);

        assert!(matches!(result, Err(ActionError::MultiFileUnsupported(2))));
    }
}
