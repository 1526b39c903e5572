//! SetGlobalProperties: UI is the primary subsystem, TTS an optional secondary.

use super::{AwaitingReplies, Command, CommandContext, Dispatch, PendingCommand};
use crate::domain::application::{Application, GlobalProperties};
use crate::domain::entities::VrHelpItem;
use crate::domain::fanout::ReplySlots;
use crate::domain::reducer::{reduce_primary_with_optional, Outcome, SlotClass};
use crate::domain::result::ResultCode;
use crate::domain::subsystem::{MobileFunction, Subsystem};
use crate::domain::validation::{check_sequential_positions, find_missing_image};
use crate::error::{EngineError, EngineResult};
use crate::ipc::requests::{
    HmiPayload, SetGlobalPropertiesParams, TtsGlobalProperties, UiGlobalProperties,
};
use tracing::debug;

const NO_PARAMETERS: &str = "There are no parameters present in request.";
const TOO_MANY_PARAMETERS: &str = "There are too many parameters for media/non-media application.";
const EMPTY_SYNONYMS: &str = "VR synonyms are empty";
const TTS_SKIPPED: &str = "TTS is not available, prompts were not applied";

pub struct SetGlobalProperties {
    params: SetGlobalPropertiesParams,
    /// VR help built from the catalogue when the request carries none
    generated_help: Option<(String, Vec<VrHelpItem>)>,
}

impl SetGlobalProperties {
    pub fn new(params: SetGlobalPropertiesParams) -> Self {
        Self {
            params,
            generated_help: None,
        }
    }

    fn check_images(&self, app: &Application) -> EngineResult<()> {
        let help_images = self
            .params
            .vr_help
            .iter()
            .flatten()
            .filter_map(|item| item.image.as_ref());
        let images = help_images.chain(self.params.menu_icon.as_ref());

        match find_missing_image(app, images) {
            Some(missing) => Err(EngineError::validation(
                ResultCode::InvalidData,
                format!("Image '{missing}' has not been uploaded"),
            )),
            None => Ok(()),
        }
    }

    fn check_vr_help(&self) -> EngineResult<()> {
        match (&self.params.vr_help_title, &self.params.vr_help) {
            (Some(_), Some(items)) => check_sequential_positions(items.iter().map(|i| i.position))
                .map_err(|e| {
                    EngineError::validation(ResultCode::Rejected, format!("vr_help: {e}"))
                }),
            (None, None) => Ok(()),
            _ => Err(EngineError::validation(
                ResultCode::Rejected,
                "vr_help_title and vr_help must be sent together",
            )),
        }
    }
}

/// One help item per catalogue command, in id order, titled with the app name.
fn generate_vr_help(app: &Application) -> EngineResult<Option<(String, Vec<VrHelpItem>)>> {
    if app.command_count() == 0 {
        return Ok(None);
    }
    let mut items = Vec::with_capacity(app.command_count());
    for (index, command) in app.commands().enumerate() {
        let text = command
            .vr_commands
            .as_ref()
            .and_then(|synonyms| synonyms.first())
            .ok_or_else(|| EngineError::validation(ResultCode::InvalidData, EMPTY_SYNONYMS))?;
        items.push(VrHelpItem {
            text: text.clone(),
            image: None,
            position: index as u32 + 1,
        });
    }
    Ok(Some((app.name().to_string(), items)))
}

impl Command for SetGlobalProperties {
    fn function(&self) -> MobileFunction {
        MobileFunction::SetGlobalProperties
    }

    fn validate(&mut self, app: &Application, _ctx: &CommandContext<'_>) -> EngineResult<()> {
        if self.params.is_empty() {
            return Err(EngineError::validation(ResultCode::InvalidData, NO_PARAMETERS));
        }
        self.check_images(app)?;

        let navigation_only = self.params.keyboard_properties.is_some()
            || self.params.menu_icon.is_some()
            || self.params.menu_title.is_some();
        if navigation_only && !app.allows_navigation() {
            return Err(EngineError::validation(
                ResultCode::InvalidData,
                TOO_MANY_PARAMETERS,
            ));
        }

        self.check_vr_help()?;
        if self.params.vr_help.is_none() {
            self.generated_help = generate_vr_help(app)?;
        }
        Ok(())
    }

    fn dispatch(self: Box<Self>, app: &mut Application, ctx: &CommandContext<'_>) -> Dispatch {
        if !ctx.availability.is_available(Subsystem::Ui) {
            return Dispatch::Immediate(
                Outcome::failure(ResultCode::UnsupportedResource).with_info("UI is not available"),
            );
        }

        let SetGlobalProperties {
            params,
            generated_help,
        } = *self;
        let has_prompt = params.has_prompt();
        let (vr_help_title, vr_help) = match generated_help {
            Some((title, items)) => (Some(title), Some(items)),
            None => (params.vr_help_title, params.vr_help),
        };

        let mut calls = vec![HmiPayload::UiSetGlobalProperties(UiGlobalProperties {
            app_id: app.app_id().to_string(),
            vr_help_title: vr_help_title.clone(),
            vr_help: vr_help.clone(),
            menu_title: params.menu_title.clone(),
            menu_icon: params.menu_icon.clone(),
            keyboard_properties: params.keyboard_properties.clone(),
        })];

        let tts_available = ctx.availability.is_available(Subsystem::Tts);
        if has_prompt && tts_available {
            calls.push(HmiPayload::TtsSetGlobalProperties(TtsGlobalProperties {
                app_id: app.app_id().to_string(),
                help_prompt: params.help_prompt.clone(),
                timeout_prompt: params.timeout_prompt.clone(),
            }));
        }
        let tts_skipped = has_prompt && !tts_available;
        if tts_skipped {
            debug!(app_id = app.app_id(), "TTS unavailable, prompts not sent");
        }

        let update = GlobalProperties {
            vr_help_title,
            vr_help,
            help_prompt: params.help_prompt,
            timeout_prompt: params.timeout_prompt,
            menu_title: params.menu_title,
            menu_icon: params.menu_icon,
            keyboard_properties: params.keyboard_properties,
        };

        Dispatch::FanOut {
            calls,
            pending: PendingCommand::Awaiting(Box::new(AwaitingGlobalProperties {
                update,
                tts_skipped,
            })),
        }
    }
}

/// Properties held back until the HMI has accepted them
#[derive(Debug)]
pub struct AwaitingGlobalProperties {
    update: GlobalProperties,
    /// Prompts were present but TTS was unavailable at dispatch
    tts_skipped: bool,
}

impl AwaitingReplies for AwaitingGlobalProperties {
    fn reduce(&self, slots: &ReplySlots) -> Outcome {
        let ui = SlotClass::from(slots.ui);
        let tts = if self.tts_skipped {
            SlotClass::Unsupported
        } else {
            SlotClass::from(slots.tts)
        };

        let outcome = reduce_primary_with_optional(ui, tts);
        if self.tts_skipped && outcome.result_code == ResultCode::Warnings {
            return outcome.with_info(TTS_SKIPPED);
        }
        outcome
    }

    fn finalize(self: Box<Self>, slots: &ReplySlots, outcome: &Outcome, app: &mut Application) {
        if !outcome.success {
            return;
        }
        let mut update = self.update;
        // Prompts only stick if TTS accepted them
        if SlotClass::from(slots.tts) != SlotClass::Success {
            update.help_prompt = None;
            update.timeout_prompt = None;
        }
        app.apply_global_properties(update);
        app.update_hash();
    }
}
