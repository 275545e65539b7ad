//! Removal of a template parameter and its argument-list footprint.
//!
//! Given a position on a template parameter, computes the edits that delete
//! the parameter from every declaration list and every substitution's
//! argument list, and neutralizes remaining type uses with a placeholder.

use crate::action::{
    ActionError, ActionOptions, ActionParam, ModificationAction, POSITION_PARAM, RefactorAction,
    perform_modification, resolve_entity_at,
};
use crate::edit::{Edit, MultiFileEdits};
use crate::model::{CodeModel, EntityId, EntityKind, NodeId, NodeKind, Use};
use crate::position::{FilePosition, Range};
use std::io::Write;

/// Filler character for type uses that survive the removal
const PLACEHOLDER: char = '?';

/// Deletion range for removing one element from a delimited list
///
/// Exactly one separator goes with the element: with a previous sibling the
/// range is pulled back over the separator before the element, otherwise
/// with a next sibling it is pushed forward over the separator after it; a
/// sole element is deleted over its own extent.
fn removal_range(own: Range, prev: Option<Range>, next: Option<Range>) -> Range {
    if let Some(prev) = prev {
        debug_assert!(prev.end <= own.start, "invalid previous element range end");
        Range::new(prev.end, own.end)
    } else if let Some(next) = next {
        debug_assert!(next.start >= own.end, "invalid next element range start");
        Range::new(own.start, next.start)
    } else {
        own
    }
}

/// Edit deleting the argument at `index` from a substitution's argument list
fn argument_removal_edit(
    model: &dyn CodeModel,
    arguments: &[NodeId],
    index: usize,
) -> Result<Edit, ActionError> {
    let arg = arguments.get(index).ok_or_else(|| {
        ActionError::InconsistentModel(format!(
            "substitution has {} arguments but the removed parameter has index {}",
            arguments.len(),
            index
        ))
    })?;

    let own = model.node(*arg).range;
    let prev = index
        .checked_sub(1)
        .map(|i| model.node(arguments[i]).range);
    let next = arguments.get(index + 1).map(|id| model.node(*id).range);

    Ok(Edit::delete(removal_range(own, prev, next)))
}

/// Action removing a template parameter from its template
///
/// Two passes over the use graph: one over the owning template's
/// substitutions (dropping the argument at the parameter's index from every
/// written-out argument list), one over the parameter's own uses
/// (declaration lists, the template's self-reference inside its own body,
/// and ordinary type uses, which get a layout-preserving placeholder).
pub struct TemplateParameterRemoveAction;

impl ModificationAction for TemplateParameterRemoveAction {
    fn name(&self) -> &'static str {
        "template-parameter-remove"
    }

    fn compute(
        &self,
        model: &dyn CodeModel,
        pos: &FilePosition,
    ) -> Result<MultiFileEdits, ActionError> {
        let param_id = resolve_entity_at(model, pos)?;
        let param = model.entity(param_id);

        let template_id = match param.kind {
            EntityKind::TemplateParameter { template } => template,
            _ => {
                return Err(ActionError::NotATemplateParameter {
                    pos: pos.clone(),
                    entity: param.describe(),
                });
            }
        };

        let template = model.entity(template_id);
        let params = match &template.kind {
            EntityKind::Template { params } => params,
            _ => {
                return Err(ActionError::InconsistentModel(format!(
                    "owner of {} is not a template: {}",
                    param.describe(),
                    template.describe()
                )));
            }
        };

        // Index of the removed parameter in the declared list. The code
        // model guarantees every substitution's argument list shares this
        // length and ordering.
        let param_idx = params.iter().position(|p| *p == param_id).ok_or_else(|| {
            ActionError::InconsistentModel(format!(
                "{} is not in the parameter list of {}",
                param.describe(),
                template.describe()
            ))
        })?;

        let mut edits = MultiFileEdits::new();

        // Drop the argument from every substitution of the template
        for use_ in &template.uses {
            match use_ {
                Use::Entity(id) => {
                    let user = model.entity(*id);
                    if !matches!(user.kind, EntityKind::TemplateSubstitution { .. }) {
                        tracing::debug!("skipping entity use of template: {}", user.describe());
                        continue;
                    }

                    for subst_use in &user.uses {
                        let Use::Node(spec_id) = subst_use else {
                            continue;
                        };
                        let spec = model.node(*spec_id);
                        let NodeKind::TemplateSubstitutionSpec { arguments, .. } = &spec.kind
                        else {
                            continue;
                        };

                        let edit = argument_removal_edit(model, arguments, param_idx)?;
                        edits.add(model.file(spec.file).path.clone(), edit)?;
                    }
                }
                Use::Node(id) => {
                    let node = model.node(*id);
                    tracing::debug!(
                        "skipping node use of template: {} at {}",
                        node.kind.class_name(),
                        node.range
                    );
                }
            }
        }

        // Rewrite every remaining use of the parameter itself
        for use_ in &param.uses {
            let Use::Node(node_id) = use_ else {
                continue;
            };
            let node = model.node(*node_id);

            match &node.kind {
                NodeKind::TemplateParamDecl { prev, next } => {
                    let prev_range = prev.map(|id| model.node(id).range);
                    let next_range = next.map(|id| model.node(id).range);
                    let range = removal_range(node.range, prev_range, next_range);

                    edits.add(model.file(node.file).path.clone(), Edit::delete(range))?;
                }
                NodeKind::TemplateParamTypeSpec { name, parent } => {
                    // The parameter may reference the template record itself
                    // inside the template's own body; then the enclosing
                    // argument is dropped from that nested substitution.
                    if let Some((spec_id, edit)) =
                        self_reference_removal(model, template_id, *parent)?
                    {
                        let file = model.node(spec_id).file;
                        edits.add(model.file(file).path.clone(), edit)?;
                        continue;
                    }

                    // The parameter is still used as an ordinary type;
                    // replace it with a placeholder of the same length
                    let placeholder: String =
                        std::iter::repeat(PLACEHOLDER).take(name.len()).collect();
                    edits.add(
                        model.file(node.file).path.clone(),
                        Edit::new(node.range, placeholder),
                    )?;
                }
                other => {
                    tracing::warn!(
                        "skipping unrecognized template parameter use: {} at {}",
                        other.class_name(),
                        node.range
                    );
                }
            }
        }

        Ok(edits)
    }
}

impl RefactorAction for TemplateParameterRemoveAction {
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

/// Detect the self-reference case and build its argument-removal edit
///
/// Matches a type-spec whose parent is an argument spec whose parent is a
/// substitution spec of the same template. Returns the argument spec's node
/// id alongside the edit so the caller can route it to the right file.
fn self_reference_removal(
    model: &dyn CodeModel,
    template_id: EntityId,
    parent: Option<NodeId>,
) -> Result<Option<(NodeId, Edit)>, ActionError> {
    let Some(arg_spec_id) = parent else {
        return Ok(None);
    };
    let NodeKind::TemplateArgSpec { parent: spec_parent } = &model.node(arg_spec_id).kind else {
        return Ok(None);
    };
    let Some(subst_id) = spec_parent else {
        return Ok(None);
    };
    let NodeKind::TemplateSubstitutionSpec {
        template,
        arguments,
    } = &model.node(*subst_id).kind
    else {
        return Ok(None);
    };
    if *template != template_id {
        return Ok(None);
    }

    let index = arguments
        .iter()
        .position(|id| *id == arg_spec_id)
        .ok_or_else(|| {
            ActionError::InconsistentModel(
                "argument spec is not in its substitution's argument list".to_string(),
            )
        })?;

    let edit = argument_removal_edit(model, arguments, index)?;
    Ok(Some((arg_spec_id, edit)))
}
