//! Inbound application requests and outbound HMI calls.
//!
//! All request parameters are optional at the type level: the transport only
//! guarantees well-formed JSON, and a missing required field is answered by
//! the command's own validation.

use crate::domain::correlation::CorrelationId;
use crate::domain::entities::{
    ConnectionKey, FileType, Image, KeyboardProperties, MenuParams, TtsChunk, VrHelpItem,
};
use crate::domain::subsystem::{HmiFunction, MobileFunction};
use serde::{Deserialize, Serialize};

// =============================================================================
// APPLICATION → ENGINE
// =============================================================================

/// Request envelope received from a connected application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MobileRequest {
    /// Session the request arrived on
    pub connection_key: ConnectionKey,
    /// Correlation id chosen by the application, echoed in the response
    pub correlation_id: u32,
    pub payload: MobilePayload,
}

impl MobileRequest {
    pub fn new(connection_key: ConnectionKey, correlation_id: u32, payload: MobilePayload) -> Self {
        Self {
            connection_key,
            correlation_id,
            payload,
        }
    }

    pub fn function(&self) -> MobileFunction {
        self.payload.function()
    }
}

/// All supported application requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "function", content = "params")]
pub enum MobilePayload {
    SetGlobalProperties(SetGlobalPropertiesParams),
    AddCommand(AddCommandParams),
    DeleteCommand(DeleteCommandParams),
    PutFile(PutFileParams),
}

impl MobilePayload {
    pub fn function(&self) -> MobileFunction {
        match self {
            Self::SetGlobalProperties(_) => MobileFunction::SetGlobalProperties,
            Self::AddCommand(_) => MobileFunction::AddCommand,
            Self::DeleteCommand(_) => MobileFunction::DeleteCommand,
            Self::PutFile(_) => MobileFunction::PutFile,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetGlobalPropertiesParams {
    pub help_prompt: Option<Vec<TtsChunk>>,
    pub timeout_prompt: Option<Vec<TtsChunk>>,
    pub vr_help_title: Option<String>,
    pub vr_help: Option<Vec<VrHelpItem>>,
    pub menu_title: Option<String>,
    pub menu_icon: Option<Image>,
    pub keyboard_properties: Option<KeyboardProperties>,
}

impl SetGlobalPropertiesParams {
    pub fn is_empty(&self) -> bool {
        self.help_prompt.is_none()
            && self.timeout_prompt.is_none()
            && self.vr_help_title.is_none()
            && self.vr_help.is_none()
            && self.menu_title.is_none()
            && self.menu_icon.is_none()
            && self.keyboard_properties.is_none()
    }

    pub fn has_prompt(&self) -> bool {
        self.help_prompt.is_some() || self.timeout_prompt.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddCommandParams {
    pub cmd_id: Option<u32>,
    pub menu_params: Option<MenuParams>,
    pub vr_commands: Option<Vec<String>>,
    pub cmd_icon: Option<Image>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeleteCommandParams {
    pub cmd_id: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PutFileParams {
    pub sync_file_name: Option<String>,
    pub file_type: Option<FileType>,
    pub persistent_file: Option<bool>,
    pub system_file: Option<bool>,
    /// Byte offset of this chunk
    pub offset: Option<u64>,
    /// Declared total size of the file
    pub length: Option<u64>,
    pub binary_data: Option<Vec<u8>>,
}

// =============================================================================
// ENGINE → HMI
// =============================================================================

/// Call sent to an HMI subsystem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HmiRequest {
    /// Engine-minted id the reply must carry
    pub correlation_id: CorrelationId,
    pub payload: HmiPayload,
}

impl HmiRequest {
    pub fn new(correlation_id: CorrelationId, payload: HmiPayload) -> Self {
        Self {
            correlation_id,
            payload,
        }
    }

    pub fn function(&self) -> HmiFunction {
        self.payload.function()
    }
}

/// All HMI calls the engine makes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", content = "params")]
pub enum HmiPayload {
    #[serde(rename = "UI.SetGlobalProperties")]
    UiSetGlobalProperties(UiGlobalProperties),
    #[serde(rename = "TTS.SetGlobalProperties")]
    TtsSetGlobalProperties(TtsGlobalProperties),
    #[serde(rename = "UI.AddCommand")]
    UiAddCommand {
        app_id: String,
        cmd_id: u32,
        menu_params: MenuParams,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cmd_icon: Option<Image>,
    },
    #[serde(rename = "VR.AddCommand")]
    VrAddCommand {
        app_id: String,
        cmd_id: u32,
        vr_commands: Vec<String>,
    },
    #[serde(rename = "UI.DeleteCommand")]
    UiDeleteCommand(DeleteCommandCall),
    #[serde(rename = "VR.DeleteCommand")]
    VrDeleteCommand(DeleteCommandCall),
}

impl HmiPayload {
    pub fn function(&self) -> HmiFunction {
        match self {
            Self::UiSetGlobalProperties(_) => HmiFunction::UiSetGlobalProperties,
            Self::TtsSetGlobalProperties(_) => HmiFunction::TtsSetGlobalProperties,
            Self::UiAddCommand { .. } => HmiFunction::UiAddCommand,
            Self::VrAddCommand { .. } => HmiFunction::VrAddCommand,
            Self::UiDeleteCommand(_) => HmiFunction::UiDeleteCommand,
            Self::VrDeleteCommand(_) => HmiFunction::VrDeleteCommand,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiGlobalProperties {
    pub app_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vr_help_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vr_help: Option<Vec<VrHelpItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub menu_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub menu_icon: Option<Image>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyboard_properties: Option<KeyboardProperties>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TtsGlobalProperties {
    pub app_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_prompt: Option<Vec<TtsChunk>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_prompt: Option<Vec<TtsChunk>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteCommandCall {
    pub app_id: String,
    pub cmd_id: u32,
}
