//! Domain layer: correlation bookkeeping, reduction rules and application state.

pub mod application;
pub mod config;
pub mod correlation;
pub mod entities;
pub mod fanout;
pub mod reducer;
pub mod registry;
pub mod result;
pub mod subsystem;
pub mod table;
pub mod validation;

pub use application::{AppFile, Application, ApplicationInfo, CommandEntry, GlobalProperties};
pub use config::{ConfigError, EngineConfig, StorageConfig};
pub use correlation::{CorrelationId, CorrelationIdGenerator};
pub use entities::{
    ConnectionKey, FileType, Image, ImageType, KeyboardProperties, MenuParams, SpeechCapability,
    TtsChunk, VrHelpItem,
};
pub use fanout::{CommandOwner, FanOutRecord, ReplySlot, ReplySlots};
pub use reducer::{Outcome, SlotClass};
pub use registry::{ApplicationRegistry, SharedApplication};
pub use result::ResultCode;
pub use subsystem::{HmiFunction, MobileFunction, Subsystem, SubsystemAvailability};
pub use table::{CorrelationTable, RegisterError, ReplyOutcome, TableStats};
