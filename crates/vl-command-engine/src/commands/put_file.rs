//! PutFile: chunked upload through the storage collaborator. No subsystem call.
//!
//! | chunk | before | after save |
//! |---|---|---|
//! | offset 0 | file unknown | registered, incomplete |
//! | offset 0 | file known | GENERIC_ERROR, nothing written |
//! | offset + len == length | any | marked complete (unknown file: INVALID_DATA) |
//! | other offset | unknown | written, never registered |

use super::{Command, CommandContext, Dispatch};
use crate::domain::application::{AppFile, Application};
use crate::domain::reducer::Outcome;
use crate::domain::result::ResultCode;
use crate::domain::subsystem::MobileFunction;
use crate::domain::validation::is_blank;
use crate::error::{EngineError, EngineResult};
use crate::ipc::requests::PutFileParams;
use tracing::{debug, warn};
use vl_telemetry::metrics::STORAGE_WRITES;

pub struct PutFile {
    params: PutFileParams,
}

impl PutFile {
    pub fn new(params: PutFileParams) -> Self {
        Self { params }
    }
}

impl Command for PutFile {
    fn function(&self) -> MobileFunction {
        MobileFunction::PutFile
    }

    fn may_fan_out(&self) -> bool {
        false
    }

    fn validate(&mut self, app: &Application, _ctx: &CommandContext<'_>) -> EngineResult<()> {
        if self.params.binary_data.is_none() {
            return Err(EngineError::validation(
                ResultCode::InvalidData,
                "binary_data is required",
            ));
        }
        let name = match self.params.sync_file_name.as_deref() {
            Some(name) if !is_blank(name) => name,
            _ => {
                return Err(EngineError::validation(
                    ResultCode::InvalidData,
                    "sync_file_name is required",
                ))
            }
        };
        if self.params.file_type.is_none() {
            return Err(EngineError::validation(
                ResultCode::InvalidData,
                "file_type is required",
            ));
        }
        if self.params.offset.unwrap_or(0) == 0 && app.has_file(name) {
            return Err(EngineError::validation(
                ResultCode::GenericError,
                format!("File '{name}' already exists"),
            ));
        }
        Ok(())
    }

    fn dispatch(self: Box<Self>, app: &mut Application, ctx: &CommandContext<'_>) -> Dispatch {
        let PutFileParams {
            sync_file_name,
            file_type,
            persistent_file,
            offset,
            length,
            binary_data,
            ..
        } = self.params;
        let (Some(name), Some(file_type), Some(data)) = (sync_file_name, file_type, binary_data)
        else {
            return Dispatch::Immediate(Outcome::failure(ResultCode::InvalidData));
        };
        let offset = offset.unwrap_or(0);
        let chunk_len = data.len() as u64;
        let length = length.unwrap_or(chunk_len);

        if let Err(e) = ctx.storage.save(app.app_id(), &data, &name, offset) {
            vl_telemetry::metric_inc!(STORAGE_WRITES, &["error"]);
            warn!(
                app_id = app.app_id(),
                file = %name,
                offset,
                error = %e,
                "Failed to store file chunk"
            );
            return Dispatch::Immediate(Outcome::failure(e.result_code()).with_info(e.to_string()));
        }
        vl_telemetry::metric_inc!(STORAGE_WRITES, &["ok"]);

        if offset == 0 {
            app.add_file(AppFile {
                name: name.clone(),
                file_type,
                persistent: persistent_file.unwrap_or(false),
                download_complete: false,
            });
        }

        if offset.checked_add(chunk_len) == Some(length) {
            if !app.mark_file_complete(&name) {
                return Dispatch::Immediate(
                    Outcome::failure(ResultCode::InvalidData)
                        .with_info(format!("File '{name}' was never started")),
                );
            }
            debug!(app_id = app.app_id(), file = %name, length, "Upload complete");
        }

        Dispatch::Immediate(Outcome::success())
    }
}
