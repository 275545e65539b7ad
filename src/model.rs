//! Read-only boundary to the semantic code model.
//!
//! The refactoring engine never parses source text itself: it consumes a
//! model of the program (AST nodes, resolved entities and the use graph
//! between them) produced by an external frontend and serialized as JSON.
//! Everything here is a query result; the engine never mutates it. The same
//! in-memory type doubles as the hand-built model used by unit tests.

use crate::position::{Position, Range};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Index of a source file in the code model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(pub usize);

/// Index of an AST node in the code model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub usize);

/// Index of a resolved entity in the code model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub usize);

/// A source file known to the code model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFile {
    /// Path of the file as recorded by the frontend
    pub path: PathBuf,
    /// BLAKE3 checksum of the text the model was built from, when recorded
    #[serde(default)]
    pub checksum: Option<String>,
}

/// An AST node: a syntactic element with a source extent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AstNode {
    /// File the node belongs to
    pub file: FileId,
    /// Source extent of the node
    pub range: Range,
    /// Syntactic classification
    pub kind: NodeKind,
}

/// Syntactic classification of an AST node
///
/// A closed union over the node kinds the engine understands. Kinds the
/// engine has no behavior for arrive as `Other` with the frontend's class
/// name preserved for diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeKind {
    /// A name referencing a resolved entity
    Identifier {
        name: String,
        #[serde(default)]
        entity: Option<EntityId>,
    },
    /// A template parameter inside a parameter-list declaration
    ///
    /// `prev`/`next` are the sibling declarations in the same list.
    TemplateParamDecl {
        #[serde(default)]
        prev: Option<NodeId>,
        #[serde(default)]
        next: Option<NodeId>,
    },
    /// A template parameter used as a type
    TemplateParamTypeSpec {
        name: String,
        #[serde(default)]
        parent: Option<NodeId>,
    },
    /// One argument inside a template substitution's argument list
    TemplateArgSpec {
        #[serde(default)]
        parent: Option<NodeId>,
    },
    /// The written-out argument list of a template substitution
    TemplateSubstitutionSpec {
        template: EntityId,
        arguments: Vec<NodeId>,
    },
    /// Any node kind the engine has no behavior for
    Other { class_name: String },
}

impl NodeKind {
    /// Frontend-style class name, used in diagnostics and error messages
    pub fn class_name(&self) -> &str {
        match self {
            NodeKind::Identifier { .. } => "identifier",
            NodeKind::TemplateParamDecl { .. } => "template_parameter_decl",
            NodeKind::TemplateParamTypeSpec { .. } => "template_param_type_spec",
            NodeKind::TemplateArgSpec { .. } => "template_argument_spec",
            NodeKind::TemplateSubstitutionSpec { .. } => "template_substitution_spec",
            NodeKind::Other { class_name } => class_name,
        }
    }
}

/// Where an entity is defined
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Definition {
    pub file: FileId,
    pub pos: Position,
}

/// A resolved semantic element: variable, type, template, template parameter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    /// Entity name; anonymous entities have none
    #[serde(default)]
    pub name: Option<String>,
    /// Definition location, when the frontend recorded one
    #[serde(default)]
    pub definition: Option<Definition>,
    /// Semantic classification
    pub kind: EntityKind,
    /// Every reference to this entity, from AST nodes or other entities
    #[serde(default)]
    pub uses: Vec<Use>,
}

/// Semantic classification of an entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntityKind {
    /// A template, owning an ordered parameter list
    Template { params: Vec<EntityId> },
    /// A parameter of a template
    TemplateParameter { template: EntityId },
    /// A concrete instantiation of a template
    TemplateSubstitution { template: EntityId },
    /// Any entity kind the engine has no behavior for
    Other { description: String },
}

impl Entity {
    /// Human-readable description for error messages
    pub fn describe(&self) -> String {
        let kind = match &self.kind {
            EntityKind::Template { .. } => "template",
            EntityKind::TemplateParameter { .. } => "template parameter",
            EntityKind::TemplateSubstitution { .. } => "template substitution",
            EntityKind::Other { description } => description,
        };

        match &self.name {
            Some(name) => format!("{} '{}'", kind, name),
            None => kind.to_string(),
        }
    }
}

/// A reference relationship in the use graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Use {
    /// An entity depending on the referenced entity
    Entity(EntityId),
    /// A syntactic site pointing at the referenced entity
    Node(NodeId),
}

/// Narrow query interface over the code model
///
/// Refactoring actions depend only on this trait, so they can be driven by
/// a hand-built model in tests just as well as by a deserialized one.
pub trait CodeModel {
    /// Look up a source file by its recorded path
    fn find_file(&self, path: &Path) -> Option<FileId>;

    /// Source file record for `id`
    fn file(&self, id: FileId) -> &SourceFile;

    /// Innermost AST node whose range contains `pos` in `file`
    fn find_node_at(&self, file: FileId, pos: Position) -> Option<NodeId>;

    /// AST node with the given id
    fn node(&self, id: NodeId) -> &AstNode;

    /// Entity with the given id
    fn entity(&self, id: EntityId) -> &Entity;
}

/// Error types for loading a serialized code model
#[derive(Debug)]
pub enum ModelError {
    /// Reading the model file failed
    Io(String),
    /// The model file is not valid JSON for the expected schema
    Json(String),
    /// The model references a file, node or entity id that does not exist
    InvalidReference { what: String },
}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelError::Io(e) => write!(f, "can't read code model: {}", e),
            ModelError::Json(e) => write!(f, "can't parse code model: {}", e),
            ModelError::InvalidReference { what } => {
                write!(f, "code model is inconsistent: {}", what)
            }
        }
    }
}

impl std::error::Error for ModelError {}

impl From<io::Error> for ModelError {
    fn from(err: io::Error) -> Self {
        ModelError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        ModelError::Json(err.to_string())
    }
}

/// In-memory code model, deserializable from the frontend's JSON dump
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryCodeModel {
    #[serde(default)]
    pub files: Vec<SourceFile>,
    #[serde(default)]
    pub nodes: Vec<AstNode>,
    #[serde(default)]
    pub entities: Vec<Entity>,
}

impl MemoryCodeModel {
    /// Load a code model from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
        let text = fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    /// Parse a code model from JSON text and validate its id references
    pub fn from_json_str(text: &str) -> Result<Self, ModelError> {
        let model: MemoryCodeModel = serde_json::from_str(text)?;
        model.validate()?;
        Ok(model)
    }

    /// Check that every id stored in the model is in bounds
    ///
    /// Queries index into the arenas without further checks, so every
    /// reference is verified once here at the trust boundary.
    fn validate(&self) -> Result<(), ModelError> {
        let check_file = |id: FileId, ctx: &str| {
            if id.0 < self.files.len() {
                Ok(())
            } else {
                Err(ModelError::InvalidReference {
                    what: format!("{} references missing file {}", ctx, id.0),
                })
            }
        };
        let check_node = |id: NodeId, ctx: &str| {
            if id.0 < self.nodes.len() {
                Ok(())
            } else {
                Err(ModelError::InvalidReference {
                    what: format!("{} references missing node {}", ctx, id.0),
                })
            }
        };
        let check_entity = |id: EntityId, ctx: &str| {
            if id.0 < self.entities.len() {
                Ok(())
            } else {
                Err(ModelError::InvalidReference {
                    what: format!("{} references missing entity {}", ctx, id.0),
                })
            }
        };

        for (i, node) in self.nodes.iter().enumerate() {
            let ctx = format!("node {}", i);
            check_file(node.file, &ctx)?;

            match &node.kind {
                NodeKind::Identifier { entity, .. } => {
                    if let Some(ent) = entity {
                        check_entity(*ent, &ctx)?;
                    }
                }
                NodeKind::TemplateParamDecl { prev, next } => {
                    if let Some(p) = prev {
                        check_node(*p, &ctx)?;
                    }
                    if let Some(n) = next {
                        check_node(*n, &ctx)?;
                    }
                }
                NodeKind::TemplateParamTypeSpec { parent, .. }
                | NodeKind::TemplateArgSpec { parent } => {
                    if let Some(p) = parent {
                        check_node(*p, &ctx)?;
                    }
                }
                NodeKind::TemplateSubstitutionSpec {
                    template,
                    arguments,
                } => {
                    check_entity(*template, &ctx)?;
                    for arg in arguments {
                        check_node(*arg, &ctx)?;
                    }
                }
                NodeKind::Other { .. } => {}
            }
        }

        for (i, entity) in self.entities.iter().enumerate() {
            let ctx = format!("entity {}", i);

            if let Some(def) = &entity.definition {
                check_file(def.file, &ctx)?;
            }

            match &entity.kind {
                EntityKind::Template { params } => {
                    for param in params {
                        check_entity(*param, &ctx)?;
                    }
                }
                EntityKind::TemplateParameter { template }
                | EntityKind::TemplateSubstitution { template } => {
                    check_entity(*template, &ctx)?;
                }
                EntityKind::Other { .. } => {}
            }

            for use_ in &entity.uses {
                match use_ {
                    Use::Entity(e) => check_entity(*e, &ctx)?,
                    Use::Node(n) => check_node(*n, &ctx)?,
                }
            }
        }

        Ok(())
    }
}

impl CodeModel for MemoryCodeModel {
    fn find_file(&self, path: &Path) -> Option<FileId> {
        self.files
            .iter()
            .position(|f| f.path == path)
            .map(FileId)
    }

    fn file(&self, id: FileId) -> &SourceFile {
        &self.files[id.0]
    }

    fn find_node_at(&self, file: FileId, pos: Position) -> Option<NodeId> {
        // Innermost containing node: among containing ranges of a well-nested
        // tree, the one starting last (ending first on ties) is the deepest.
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.file == file && n.range.contains(pos))
            .max_by(|(_, a), (_, b)| {
                a.range
                    .start
                    .cmp(&b.range.start)
                    .then(b.range.end.cmp(&a.range.end))
            })
            .map(|(i, _)| NodeId(i))
    }

    fn node(&self, id: NodeId) -> &AstNode {
        &self.nodes[id.0]
    }

    fn entity(&self, id: EntityId) -> &Entity {
        &self.entities[id.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(sl: usize, sc: usize, el: usize, ec: usize) -> Range {
        Range::new(Position::new(sl, sc), Position::new(el, ec))
    }

    fn model_with_nested_nodes() -> MemoryCodeModel {
        MemoryCodeModel {
            files: vec![SourceFile {
                path: PathBuf::from("box.cpp"),
                checksum: None,
            }],
            nodes: vec![
                AstNode {
                    file: FileId(0),
                    range: range(1, 1, 5, 1),
                    kind: NodeKind::Other {
                        class_name: "record_decl".to_string(),
                    },
                },
                AstNode {
                    file: FileId(0),
                    range: range(1, 11, 1, 12),
                    kind: NodeKind::Identifier {
                        name: "T".to_string(),
                        entity: Some(EntityId(0)),
                    },
                },
            ],
            entities: vec![Entity {
                name: Some("T".to_string()),
                definition: None,
                kind: EntityKind::Other {
                    description: "type".to_string(),
                },
                uses: vec![],
            }],
        }
    }

    #[test]
    fn test_find_node_at_prefers_innermost() {
        let model = model_with_nested_nodes();

        let id = model.find_node_at(FileId(0), Position::new(1, 11)).unwrap();
        assert_eq!(id, NodeId(1));

        // Outside the identifier but inside the record
        let id = model.find_node_at(FileId(0), Position::new(2, 1)).unwrap();
        assert_eq!(id, NodeId(0));

        assert!(model.find_node_at(FileId(0), Position::new(9, 1)).is_none());
    }

    #[test]
    fn test_find_file() {
        let model = model_with_nested_nodes();

        assert_eq!(model.find_file(Path::new("box.cpp")), Some(FileId(0)));
        assert_eq!(model.find_file(Path::new("missing.cpp")), None);
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "files": [{"path": "box.cpp"}],
            "nodes": [
                {
                    "file": 0,
                    "range": {
                        "start": {"line": 1, "column": 11},
                        "end": {"line": 1, "column": 12}
                    },
                    "kind": {"kind": "identifier", "name": "T", "entity": 0}
                }
            ],
            "entities": [
                {
                    "kind": {"kind": "other", "description": "type"},
                    "name": "T",
                    "uses": [{"node": 0}]
                }
            ]
        }"#;

        let model = MemoryCodeModel::from_json_str(json).unwrap();

        assert_eq!(model.files.len(), 1);
        assert_eq!(model.nodes.len(), 1);
        assert!(matches!(
            model.nodes[0].kind,
            NodeKind::Identifier { .. }
        ));
        assert_eq!(model.entities[0].uses, vec![Use::Node(NodeId(0))]);
    }

    #[test]
    fn test_invalid_reference_rejected() {
        let json = r#"{
            "files": [{"path": "box.cpp"}],
            "nodes": [
                {
                    "file": 0,
                    "range": {
                        "start": {"line": 1, "column": 1},
                        "end": {"line": 1, "column": 2}
                    },
                    "kind": {"kind": "identifier", "name": "T", "entity": 7}
                }
            ],
            "entities": []
        }"#;

        let result = MemoryCodeModel::from_json_str(json);

        assert!(matches!(result, Err(ModelError::InvalidReference { .. })));
    }

    #[test]
    fn test_entity_describe() {
        let entity = Entity {
            name: Some("vec".to_string()),
            definition: None,
            kind: EntityKind::Template { params: vec![] },
            uses: vec![],
        };

        assert_eq!(entity.describe(), "template 'vec'");

        let anon = Entity {
            name: None,
            definition: None,
            kind: EntityKind::Other {
                description: "lambda".to_string(),
            },
            uses: vec![],
        };

        assert_eq!(anon.describe(), "lambda");
    }
}
