//! AddCommand: menu entry on the UI, voice synonyms on VR. Both must confirm.

use super::{AwaitingReplies, Command, CommandContext, Dispatch, PendingCommand};
use crate::domain::application::{Application, CommandEntry};
use crate::domain::fanout::ReplySlots;
use crate::domain::reducer::{reduce_all_confirm, Outcome, SlotClass};
use crate::domain::result::ResultCode;
use crate::domain::subsystem::{MobileFunction, Subsystem};
use crate::domain::validation::{find_missing_image, is_blank};
use crate::error::{EngineError, EngineResult};
use crate::ipc::requests::{AddCommandParams, HmiPayload};
use std::collections::HashSet;

pub struct AddCommand {
    params: AddCommandParams,
}

impl AddCommand {
    pub fn new(params: AddCommandParams) -> Self {
        Self { params }
    }

    fn check_names(&self, app: &Application) -> EngineResult<()> {
        if let Some(menu) = &self.params.menu_params {
            if is_blank(&menu.menu_name) {
                return Err(EngineError::validation(
                    ResultCode::InvalidData,
                    "menu_name must not be empty",
                ));
            }
            if app.menu_name_in_use(&menu.menu_name) {
                return Err(EngineError::validation(
                    ResultCode::DuplicateName,
                    format!("Menu name '{}' is already in use", menu.menu_name),
                ));
            }
        }

        if let Some(synonyms) = &self.params.vr_commands {
            if synonyms.is_empty() || synonyms.iter().any(|s| is_blank(s)) {
                return Err(EngineError::validation(
                    ResultCode::InvalidData,
                    "VR synonyms must not be empty",
                ));
            }
            let mut seen = HashSet::new();
            for synonym in synonyms {
                if !seen.insert(synonym.to_lowercase()) || app.vr_synonym_in_use(synonym) {
                    return Err(EngineError::validation(
                        ResultCode::DuplicateName,
                        format!("VR synonym '{synonym}' is already in use"),
                    ));
                }
            }
        }
        Ok(())
    }
}

impl Command for AddCommand {
    fn function(&self) -> MobileFunction {
        MobileFunction::AddCommand
    }

    fn validate(&mut self, app: &Application, _ctx: &CommandContext<'_>) -> EngineResult<()> {
        let cmd_id = self
            .params
            .cmd_id
            .ok_or_else(|| EngineError::validation(ResultCode::InvalidData, "cmd_id is required"))?;
        if self.params.menu_params.is_none() && self.params.vr_commands.is_none() {
            return Err(EngineError::validation(
                ResultCode::InvalidData,
                "Either menu_params or vr_commands is required",
            ));
        }
        if app.command(cmd_id).is_some() || app.is_reserved(cmd_id) {
            return Err(EngineError::validation(
                ResultCode::InvalidId,
                format!("Command {cmd_id} already exists"),
            ));
        }
        self.check_names(app)?;
        if let Some(missing) = find_missing_image(app, self.params.cmd_icon.as_ref()) {
            return Err(EngineError::validation(
                ResultCode::InvalidData,
                format!("Image '{missing}' has not been uploaded"),
            ));
        }
        Ok(())
    }

    fn dispatch(self: Box<Self>, app: &mut Application, ctx: &CommandContext<'_>) -> Dispatch {
        let AddCommandParams {
            cmd_id,
            menu_params,
            vr_commands,
            cmd_icon,
        } = self.params;
        let Some(cmd_id) = cmd_id else {
            return Dispatch::Immediate(Outcome::failure(ResultCode::InvalidData));
        };

        let needed = [
            (Subsystem::Ui, menu_params.is_some()),
            (Subsystem::Vr, vr_commands.is_some()),
        ];
        if let Some((missing, _)) = needed
            .iter()
            .find(|(subsystem, needed)| *needed && !ctx.availability.is_available(*subsystem))
        {
            return Dispatch::Immediate(
                Outcome::failure(ResultCode::UnsupportedResource)
                    .with_info(format!("{missing} is not available")),
            );
        }

        let app_id = app.app_id().to_string();
        let mut calls = Vec::with_capacity(2);
        if let Some(menu) = &menu_params {
            calls.push(HmiPayload::UiAddCommand {
                app_id: app_id.clone(),
                cmd_id,
                menu_params: menu.clone(),
                cmd_icon: cmd_icon.clone(),
            });
        }
        if let Some(synonyms) = &vr_commands {
            calls.push(HmiPayload::VrAddCommand {
                app_id,
                cmd_id,
                vr_commands: synonyms.clone(),
            });
        }

        let entry = CommandEntry {
            cmd_id,
            menu_params,
            vr_commands,
            cmd_icon,
        };
        app.reserve_entry(entry.clone());
        Dispatch::FanOut {
            calls,
            pending: PendingCommand::Awaiting(Box::new(AwaitingAddCommand { entry })),
        }
    }
}

/// Catalogue entry held back until every addressed subsystem confirms
#[derive(Debug)]
pub struct AwaitingAddCommand {
    entry: CommandEntry,
}

#[cfg(test)]
impl AwaitingAddCommand {
    pub(crate) fn for_test(cmd_id: u32) -> Self {
        Self {
            entry: CommandEntry {
                cmd_id,
                menu_params: None,
                vr_commands: Some(vec![format!("command {cmd_id}")]),
                cmd_icon: None,
            },
        }
    }
}

impl AwaitingReplies for AwaitingAddCommand {
    fn reduce(&self, slots: &ReplySlots) -> Outcome {
        reduce_all_confirm([SlotClass::from(slots.ui), SlotClass::from(slots.vr)])
    }

    fn finalize(self: Box<Self>, _slots: &ReplySlots, outcome: &Outcome, app: &mut Application) {
        app.release_command(self.entry.cmd_id);
        if outcome.success && app.add_command(self.entry) {
            app.update_hash();
        }
    }

    fn release(self: Box<Self>, app: &mut Application) {
        app.release_command(self.entry.cmd_id);
    }
}
