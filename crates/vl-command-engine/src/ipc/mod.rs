//! IPC module: message shapes exchanged with applications and the HMI, and
//! the listener loops that feed them into the engine.

pub mod handler;
pub mod requests;
pub mod responses;

pub use handler::{IpcError, ReplyListener, ReplyReceiver, RequestListener, RequestReceiver};
pub use requests::{
    AddCommandParams, DeleteCommandCall, DeleteCommandParams, HmiPayload, HmiRequest,
    MobilePayload, MobileRequest, PutFileParams, SetGlobalPropertiesParams, TtsGlobalProperties,
    UiGlobalProperties,
};
pub use responses::{HmiReply, MobileResponse};
