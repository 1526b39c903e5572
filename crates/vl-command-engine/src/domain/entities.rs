//! Value types shared by application requests, HMI calls and application state.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Session identity of a connected application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionKey(pub u32);

impl fmt::Display for ConnectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where an image comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImageType {
    /// Built into the head unit
    Static,
    /// Uploaded by the application through PutFile
    Dynamic,
}

/// Image reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    /// File name for dynamic images, symbol id for static ones
    pub value: String,
    pub image_type: ImageType,
}

impl Image {
    pub fn dynamic(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            image_type: ImageType::Dynamic,
        }
    }
}

/// Menu placement of a command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
    pub menu_name: String,
}

/// One entry of the voice help list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VrHelpItem {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<Image>,
    pub position: u32,
}

/// How a TTS chunk is spoken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SpeechCapability {
    Text,
    Sapi,
    Lhplus,
    Prerecorded,
    Silence,
}

/// One piece of a spoken prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TtsChunk {
    pub text: String,
    #[serde(rename = "type")]
    pub chunk_type: SpeechCapability,
}

impl TtsChunk {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            chunk_type: SpeechCapability::Text,
        }
    }
}

/// On-screen keyboard configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyboardProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyboard_layout: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keypress_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limited_character_list: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_complete_text: Option<String>,
}

/// Declared type of an uploaded file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileType {
    GraphicBmp,
    GraphicJpeg,
    GraphicPng,
    AudioWave,
    AudioMp3,
    AudioAac,
    Binary,
    Json,
}
