//! HMI subsystems and the function identifiers that address them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

/// Independent HMI-side module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Subsystem {
    #[serde(rename = "UI")]
    Ui,
    #[serde(rename = "VR")]
    Vr,
    #[serde(rename = "TTS")]
    Tts,
}

impl Subsystem {
    pub const ALL: [Subsystem; 3] = [Subsystem::Ui, Subsystem::Vr, Subsystem::Tts];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ui => "UI",
            Self::Vr => "VR",
            Self::Tts => "TTS",
        }
    }
}

impl fmt::Display for Subsystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Function identifier of an HMI call and of its reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HmiFunction {
    #[serde(rename = "UI.SetGlobalProperties")]
    UiSetGlobalProperties,
    #[serde(rename = "TTS.SetGlobalProperties")]
    TtsSetGlobalProperties,
    #[serde(rename = "UI.AddCommand")]
    UiAddCommand,
    #[serde(rename = "VR.AddCommand")]
    VrAddCommand,
    #[serde(rename = "UI.DeleteCommand")]
    UiDeleteCommand,
    #[serde(rename = "VR.DeleteCommand")]
    VrDeleteCommand,
}

impl HmiFunction {
    /// The subsystem tag this function addresses
    pub fn subsystem(self) -> Subsystem {
        match self {
            Self::UiSetGlobalProperties | Self::UiAddCommand | Self::UiDeleteCommand => {
                Subsystem::Ui
            }
            Self::VrAddCommand | Self::VrDeleteCommand => Subsystem::Vr,
            Self::TtsSetGlobalProperties => Subsystem::Tts,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::UiSetGlobalProperties => "UI.SetGlobalProperties",
            Self::TtsSetGlobalProperties => "TTS.SetGlobalProperties",
            Self::UiAddCommand => "UI.AddCommand",
            Self::VrAddCommand => "VR.AddCommand",
            Self::UiDeleteCommand => "UI.DeleteCommand",
            Self::VrDeleteCommand => "VR.DeleteCommand",
        }
    }
}

impl fmt::Display for HmiFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Function identifier of an application request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MobileFunction {
    SetGlobalProperties,
    AddCommand,
    DeleteCommand,
    PutFile,
}

impl MobileFunction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SetGlobalProperties => "SetGlobalProperties",
            Self::AddCommand => "AddCommand",
            Self::DeleteCommand => "DeleteCommand",
            Self::PutFile => "PutFile",
        }
    }
}

impl fmt::Display for MobileFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which subsystems are currently reachable.
///
/// The HMI reports readiness per interface; commands consult this before
/// addressing a subsystem. Every subsystem starts available.
#[derive(Debug)]
pub struct SubsystemAvailability {
    ui: AtomicBool,
    vr: AtomicBool,
    tts: AtomicBool,
}

impl SubsystemAvailability {
    pub fn new() -> Self {
        Self {
            ui: AtomicBool::new(true),
            vr: AtomicBool::new(true),
            tts: AtomicBool::new(true),
        }
    }

    fn flag(&self, subsystem: Subsystem) -> &AtomicBool {
        match subsystem {
            Subsystem::Ui => &self.ui,
            Subsystem::Vr => &self.vr,
            Subsystem::Tts => &self.tts,
        }
    }

    pub fn is_available(&self, subsystem: Subsystem) -> bool {
        self.flag(subsystem).load(Ordering::Acquire)
    }

    pub fn set_available(&self, subsystem: Subsystem, available: bool) {
        self.flag(subsystem).store(available, Ordering::Release);
    }
}

impl Default for SubsystemAvailability {
    fn default() -> Self {
        Self::new()
    }
}
