use crate::action::{
    ActionError, ActionOptions, ActionParam, POSITION_PARAM, RefactorAction, resolve_entity_at,
};
use crate::model::CodeModel;
use std::io::Write;

/// Read-only action printing where the symbol at a position is defined
pub struct FindDefinitionAction;

impl RefactorAction for FindDefinitionAction {
    fn name(&self) -> &'static str {
        "find-definition"
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
        let pos = opts
            .position
            .as_ref()
            .ok_or(ActionError::MissingParam("position"))?;

        let entity_id = resolve_entity_at(model, pos)?;
        let entity = model.entity(entity_id);

        let def = entity
            .definition
            .as_ref()
            .ok_or_else(|| ActionError::NoDefinitionLocation(pos.clone()))?;

        let symbol_name = entity.name.as_deref().unwrap_or("<unnamed>");
        let def_path = &model.file(def.file).path;

        writeln!(
            out,
            "Symbol {} is defined at: {}:{}:{}",
            symbol_name,
            def_path.display(),
            def.pos.line,
            def.pos.column
        )?;

        Ok(())
    }
}
