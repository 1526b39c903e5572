//! # Command Flows
//!
//! Each command driven from `MobileRequest` to `MobileResponse` through the
//! engine's public surface:
//!
//! 1. **SetGlobalProperties**: ordered-list validation, UI primary with TTS optional
//! 2. **AddCommand**: id reservation and the zero-destination rule
//! 3. **DeleteCommand**: removal confirmed only by the response-only reader
//! 4. **PutFile**: chunked upload registration and completion
//! 5. **Lifecycle**: forced timeouts and application disconnects

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use vl_command_engine::adapters::{FsFileStorage, RecordingDispatch, RecordingSink};
    use vl_command_engine::domain::{CommandEntry, FileType, TtsChunk, VrHelpItem};
    use vl_command_engine::ipc::{HmiPayload, MobilePayload, PutFileParams, SetGlobalPropertiesParams};
    use vl_command_engine::{
        ApplicationInfo, CommandEngine, ConnectionKey, EngineConfig, HmiFunction, MobileFunction,
        ResultCode, Subsystem,
    };

    use crate::integration::fixture::{add_command, delete_command, Fixture, APP};

    // =========================================================================
    // SetGlobalProperties
    // =========================================================================

    fn help_items(positions: &[u32]) -> Vec<VrHelpItem> {
        positions
            .iter()
            .map(|&position| VrHelpItem {
                text: format!("help {position}"),
                image: None,
                position,
            })
            .collect()
    }

    fn vr_help(positions: &[u32]) -> MobilePayload {
        MobilePayload::SetGlobalProperties(SetGlobalPropertiesParams {
            vr_help_title: Some("Help".into()),
            vr_help: Some(help_items(positions)),
            ..Default::default()
        })
    }

    fn prompts() -> MobilePayload {
        MobilePayload::SetGlobalProperties(SetGlobalPropertiesParams {
            help_prompt: Some(vec![TtsChunk::text("Say a command")]),
            menu_title: Some("Main".into()),
            ..Default::default()
        })
    }

    #[test]
    fn test_vr_help_wrong_start_rejected_without_calls() {
        let f = Fixture::new();
        f.submit(1, vr_help(&[2, 3]));

        let response = f.single_response();
        assert!(!response.success);
        assert_eq!(response.result_code, ResultCode::Rejected);
        assert_eq!(f.dispatch.count(), 0);
        assert_eq!(f.engine.pending_fan_outs(), 0);
    }

    #[test]
    fn test_vr_help_gap_rejected_without_calls() {
        let f = Fixture::new();
        f.submit(1, vr_help(&[1, 2, 4]));

        assert_eq!(f.single_response().result_code, ResultCode::Rejected);
        assert_eq!(f.dispatch.count(), 0);
    }

    #[test]
    fn test_vr_help_sequential_goes_to_ui_only() {
        let f = Fixture::new();
        f.submit(1, vr_help(&[1, 2, 3]));

        let calls = f.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].function(), HmiFunction::UiSetGlobalProperties);
        f.reply(&calls[0], ResultCode::Success);

        let response = f.single_response();
        assert!(response.success);
        assert_eq!(response.correlation_id, 1);
        assert_eq!(response.function, MobileFunction::SetGlobalProperties);
        let app = f.app();
        let app = app.lock();
        assert_eq!(app.global_properties().vr_help_title.as_deref(), Some("Help"));
        assert_eq!(app.global_properties().vr_help.as_ref().map(Vec::len), Some(3));
    }

    #[test]
    fn test_prompts_confirmed_by_ui_and_tts() {
        let f = Fixture::new();
        let hash_before = f.app().lock().hash();
        f.submit(1, prompts());

        let calls = f.calls();
        assert_eq!(calls.len(), 2);
        assert!(f.sink.responses().is_empty());
        // TTS answers first; the UI reply completes the request
        f.reply(&calls[1], ResultCode::Success);
        assert_eq!(f.sink.count(), 0);
        f.reply(&calls[0], ResultCode::Success);

        let response = f.single_response();
        assert!(response.success);
        assert_eq!(response.result_code, ResultCode::Success);
        let app = f.app();
        let app = app.lock();
        assert!(app.global_properties().help_prompt.is_some());
        assert_ne!(app.hash(), hash_before);
    }

    #[test]
    fn test_prompts_with_tts_unavailable_warn() {
        let f = Fixture::new();
        f.engine.set_subsystem_available(Subsystem::Tts, false);
        f.submit(1, prompts());

        let calls = f.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].function(), HmiFunction::UiSetGlobalProperties);
        f.reply(&calls[0], ResultCode::Success);

        let response = f.single_response();
        assert!(response.success);
        assert_eq!(response.result_code, ResultCode::Warnings);
        assert!(response.info.is_some());
        let app = f.app();
        let app = app.lock();
        assert_eq!(app.global_properties().menu_title.as_deref(), Some("Main"));
        assert!(app.global_properties().help_prompt.is_none());
    }

    #[test]
    fn test_ui_unavailable_answers_immediately() {
        let f = Fixture::new();
        f.engine.set_subsystem_available(Subsystem::Ui, false);
        f.submit(1, prompts());

        let response = f.single_response();
        assert!(!response.success);
        assert_eq!(response.result_code, ResultCode::UnsupportedResource);
        assert_eq!(f.dispatch.count(), 0);
        assert_eq!(f.engine.pending_fan_outs(), 0);
    }

    #[test]
    fn test_ui_failure_keeps_cached_properties() {
        let f = Fixture::new();
        let hash_before = f.app().lock().hash();
        f.submit(1, prompts());
        for call in f.calls() {
            let code = match call.function() {
                HmiFunction::UiSetGlobalProperties => ResultCode::Rejected,
                _ => ResultCode::Success,
            };
            f.reply(&call, code);
        }

        let response = f.single_response();
        assert!(!response.success);
        assert_eq!(response.result_code, ResultCode::Rejected);
        let app = f.app();
        let app = app.lock();
        assert!(app.global_properties().menu_title.is_none());
        assert_eq!(app.hash(), hash_before);
    }

    #[test]
    fn test_generated_help_lists_catalogue() {
        let f = Fixture::new();
        f.add_confirmed(1, 20);
        f.add_confirmed(2, 10);
        f.submit(
            3,
            MobilePayload::SetGlobalProperties(SetGlobalPropertiesParams {
                menu_title: Some("Main".into()),
                ..Default::default()
            }),
        );

        let calls = f.calls();
        assert_eq!(calls.len(), 1);
        let HmiPayload::UiSetGlobalProperties(ui) = &calls[0].payload else {
            panic!("expected a UI call, got {:?}", calls[0].payload);
        };
        assert_eq!(ui.vr_help_title.as_deref(), Some("Navigator"));
        let items = ui.vr_help.as_ref().expect("generated help");
        let texts: Vec<_> = items.iter().map(|i| i.text.as_str()).collect();
        assert_eq!(texts, ["command 10", "command 20"]);
        let positions: Vec<_> = items.iter().map(|i| i.position).collect();
        assert_eq!(positions, [1, 2]);
    }

    #[test]
    fn test_generated_help_needs_synonyms() {
        let f = Fixture::new();
        f.submit(1, add_command(5, true, false));
        for call in f.calls() {
            f.reply(&call, ResultCode::Success);
        }
        assert!(f.single_response().success);

        f.submit(
            2,
            MobilePayload::SetGlobalProperties(SetGlobalPropertiesParams {
                menu_title: Some("Main".into()),
                ..Default::default()
            }),
        );
        let response = f.single_response();
        assert_eq!(response.result_code, ResultCode::InvalidData);
        assert_eq!(response.info.as_deref(), Some("VR synonyms are empty"));
        assert_eq!(f.dispatch.count(), 0);
    }

    #[test]
    fn test_navigation_parameters_need_permission() {
        let dispatch = Arc::new(RecordingDispatch::new());
        let sink = Arc::new(RecordingSink::new());
        let engine = CommandEngine::new(
            EngineConfig::default(),
            dispatch.clone(),
            sink.clone(),
            Arc::new(vl_command_engine::adapters::InMemoryFileStorage::new()),
        )
        .unwrap();
        let key = ConnectionKey(3);
        engine.register_application(key, ApplicationInfo::new("media", "Player"));

        engine.submit_application_request(vl_command_engine::MobileRequest::new(key, 1, prompts()));
        let responses = sink.take();
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].result_code, ResultCode::InvalidData);
        assert_eq!(dispatch.count(), 0);
    }

    // =========================================================================
    // AddCommand
    // =========================================================================

    #[test]
    fn test_add_command_reserves_until_complete() {
        let f = Fixture::new();
        f.submit(1, add_command(10, true, true));
        let calls = f.calls();
        assert_eq!(calls.len(), 2);
        assert!(f.app().lock().is_reserved(10));

        // Same id while the first is in flight
        f.submit(2, add_command(10, true, false));
        assert_eq!(f.single_response().result_code, ResultCode::InvalidId);

        for call in &calls {
            f.reply(call, ResultCode::Success);
        }
        let response = f.single_response();
        assert_eq!(response.correlation_id, 1);
        assert!(response.success);
        let app = f.app();
        let app = app.lock();
        assert!(!app.is_reserved(10));
        let entry = app.command(10).expect("command added");
        assert!(entry.has_menu() && entry.has_vr());
    }

    #[test]
    fn test_add_command_partial_failure_adds_nothing() {
        let f = Fixture::new();
        f.submit(1, add_command(10, true, true));
        for call in f.calls() {
            let code = match call.function() {
                HmiFunction::VrAddCommand => ResultCode::GenericError,
                _ => ResultCode::Success,
            };
            f.reply(&call, code);
        }

        let response = f.single_response();
        assert!(!response.success);
        assert_eq!(response.result_code, ResultCode::GenericError);
        let app = f.app();
        assert!(app.lock().command(10).is_none());
        assert!(!app.lock().is_reserved(10));
    }

    #[test]
    fn test_add_command_subsystem_unavailable_sends_nothing() {
        let f = Fixture::new();
        f.engine.set_subsystem_available(Subsystem::Vr, false);
        f.submit(1, add_command(10, true, true));

        let response = f.single_response();
        assert!(!response.success);
        assert_eq!(response.result_code, ResultCode::UnsupportedResource);
        assert_eq!(f.dispatch.count(), 0);
        assert!(!f.app().lock().is_reserved(10));

        // Menu-only commands still reach the UI
        f.submit(2, add_command(11, true, false));
        assert_eq!(f.calls().len(), 1);
    }

    #[test]
    fn test_add_command_duplicate_name() {
        let f = Fixture::new();
        f.add_confirmed(1, 10);

        let mut payload = add_command(11, true, false);
        if let MobilePayload::AddCommand(params) = &mut payload {
            if let Some(menu) = params.menu_params.as_mut() {
                menu.menu_name = "COMMAND 10".into();
            }
        }
        f.submit(2, payload);
        assert_eq!(f.single_response().result_code, ResultCode::DuplicateName);
        assert_eq!(f.dispatch.count(), 0);
    }

    fn renamed(cmd_id: u32, menu_name: Option<&str>, synonym: Option<&str>) -> MobilePayload {
        let mut payload = add_command(cmd_id, menu_name.is_some(), synonym.is_some());
        if let MobilePayload::AddCommand(params) = &mut payload {
            if let (Some(menu), Some(name)) = (params.menu_params.as_mut(), menu_name) {
                menu.menu_name = name.into();
            }
            if let Some(synonym) = synonym {
                params.vr_commands = Some(vec![synonym.into()]);
            }
        }
        payload
    }

    #[test]
    fn test_add_command_in_flight_names_are_taken() {
        let f = Fixture::new();
        f.submit(1, renamed(10, Some("Play"), Some("play music")));
        let first = f.calls();
        assert_eq!(first.len(), 2);

        // Same menu name under another id while the first is unanswered
        f.submit(2, renamed(11, Some("Play"), None));
        assert_eq!(f.single_response().result_code, ResultCode::DuplicateName);
        // Same synonym, different case
        f.submit(3, renamed(12, None, Some("PLAY MUSIC")));
        assert_eq!(f.single_response().result_code, ResultCode::DuplicateName);
        assert_eq!(f.dispatch.count(), 0);

        // A failed add frees its names
        for call in &first {
            f.reply(call, ResultCode::Rejected);
        }
        assert!(!f.single_response().success);
        f.submit(4, renamed(11, Some("Play"), None));
        let calls = f.calls();
        assert_eq!(calls.len(), 1);
        f.reply(&calls[0], ResultCode::Success);
        assert!(f.single_response().success);

        let app = f.app();
        let app = app.lock();
        assert!(app.command(10).is_none());
        assert_eq!(
            app.command(11).and_then(|c| c.menu_params.as_ref()).map(|m| m.menu_name.as_str()),
            Some("Play")
        );
    }

    // =========================================================================
    // DeleteCommand
    // =========================================================================

    #[test]
    fn test_delete_needs_both_confirmations() {
        let f = Fixture::new();
        f.add_confirmed(1, 10);
        f.submit(2, delete_command(10));

        let calls = f.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].correlation_id, calls[1].correlation_id);

        f.reply(&calls[0], ResultCode::Success);
        assert_eq!(f.sink.count(), 0);
        assert!(f.app().lock().command(10).is_some());

        f.reply(&calls[1], ResultCode::Success);
        let response = f.single_response();
        assert_eq!(response.correlation_id, 2);
        assert_eq!(response.function, MobileFunction::DeleteCommand);
        assert!(response.success);
        assert!(f.app().lock().command(10).is_none());

        // A repeated confirmation finds no chain
        f.reply(&calls[1], ResultCode::Success);
        assert_eq!(f.sink.count(), 0);
    }

    #[test]
    fn test_delete_partial_failure_drops_confirmed_capability() {
        let f = Fixture::new();
        f.add_confirmed(1, 10);
        let hash_before = f.app().lock().hash();
        f.submit(2, delete_command(10));
        for call in f.calls() {
            let code = match call.function() {
                HmiFunction::UiDeleteCommand => ResultCode::Success,
                _ => ResultCode::Rejected,
            };
            f.reply(&call, code);
        }

        let response = f.single_response();
        assert!(!response.success);
        assert_eq!(response.result_code, ResultCode::Rejected);
        {
            let app = f.app();
            let app = app.lock();
            let entry = app.command(10).expect("VR capability remains");
            assert!(!entry.has_menu());
            assert!(entry.has_vr());
            assert!(!app.is_reserved(10));
            assert_ne!(app.hash(), hash_before);
        }

        // The retry only asks VR, then the entry is gone
        f.submit(3, delete_command(10));
        let calls = f.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].function(), HmiFunction::VrDeleteCommand);
        f.reply(&calls[0], ResultCode::Success);
        assert!(f.single_response().success);
        assert!(f.app().lock().command(10).is_none());
    }

    #[test]
    fn test_delete_without_destinations_answers_immediately() {
        let f = Fixture::new();
        let hash_before = f.app().lock().hash();
        f.app().lock().add_command(CommandEntry {
            cmd_id: 4,
            menu_params: None,
            vr_commands: None,
            cmd_icon: None,
        });
        f.submit(1, delete_command(4));

        let response = f.single_response();
        assert!(response.success);
        assert_eq!(response.result_code, ResultCode::Success);
        assert_eq!(f.dispatch.count(), 0);
        assert_eq!(f.engine.pending_fan_outs(), 0);
        let app = f.app();
        assert!(app.lock().command(4).is_none());
        assert_ne!(app.lock().hash(), hash_before);
    }

    #[test]
    fn test_delete_validation_order() {
        let f = Fixture::new();
        f.submit(1, MobilePayload::DeleteCommand(Default::default()));
        assert_eq!(f.single_response().result_code, ResultCode::InvalidData);

        f.submit(2, delete_command(99));
        assert_eq!(f.single_response().result_code, ResultCode::InvalidId);

        f.add_confirmed(3, 10);
        f.submit(4, delete_command(10));
        let calls = f.calls();
        f.submit(5, delete_command(10));
        assert_eq!(f.single_response().result_code, ResultCode::InUse);
        for call in &calls {
            f.reply(call, ResultCode::Success);
        }
        assert!(f.single_response().success);
    }

    // =========================================================================
    // PutFile
    // =========================================================================

    fn put_file(name: &str, offset: Option<u64>, length: Option<u64>, data: &[u8]) -> MobilePayload {
        MobilePayload::PutFile(PutFileParams {
            sync_file_name: Some(name.into()),
            file_type: Some(FileType::GraphicPng),
            offset,
            length,
            binary_data: Some(data.to_vec()),
            ..Default::default()
        })
    }

    #[test]
    fn test_put_file_chunks_register_then_complete() {
        let f = Fixture::new();
        f.submit(1, put_file("icon.png", Some(0), Some(6), b"abc"));
        assert!(f.single_response().success);
        {
            let app = f.app();
            let app = app.lock();
            let file = app.file("icon.png").expect("registered at offset 0");
            assert!(!file.download_complete);
        }

        f.submit(2, put_file("icon.png", Some(3), Some(6), b"def"));
        assert!(f.single_response().success);
        assert!(f.app().lock().file("icon.png").unwrap().download_complete);
        assert_eq!(
            f.storage.contents("nav-app", "icon.png").as_deref(),
            Some(&b"abcdef"[..])
        );
        assert_eq!(f.dispatch.count(), 0);
    }

    #[test]
    fn test_put_file_single_chunk_completes() {
        let f = Fixture::new();
        f.submit(1, put_file("a.json", None, None, b"{}"));
        assert!(f.single_response().success);
        assert!(f.app().lock().file("a.json").unwrap().download_complete);
    }

    #[test]
    fn test_put_file_out_of_order_never_creates() {
        let f = Fixture::new();
        f.submit(1, put_file("late.png", Some(3), Some(9), b"def"));
        assert!(f.single_response().success);
        assert!(!f.app().lock().has_file("late.png"));

        f.submit(2, put_file("late.png", Some(6), Some(9), b"ghi"));
        let response = f.single_response();
        assert!(!response.success);
        assert_eq!(response.result_code, ResultCode::InvalidData);
        assert!(!f.app().lock().has_file("late.png"));
    }

    #[test]
    fn test_put_file_restart_on_existing_file() {
        let f = Fixture::new();
        f.submit(1, put_file("icon.png", Some(0), Some(6), b"abc"));
        assert!(f.single_response().success);

        f.submit(2, put_file("icon.png", Some(0), Some(3), b"xyz"));
        assert_eq!(f.single_response().result_code, ResultCode::GenericError);
        assert_eq!(
            f.storage.contents("nav-app", "icon.png").as_deref(),
            Some(&b"abc"[..])
        );
    }

    #[test]
    fn test_put_file_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let sink = Arc::new(RecordingSink::new());
        let engine = CommandEngine::new(
            EngineConfig::default(),
            Arc::new(RecordingDispatch::new()),
            sink.clone(),
            Arc::new(FsFileStorage::new(dir.path())),
        )
        .unwrap();
        engine.register_application(APP, ApplicationInfo::new("nav-app", "Navigator"));

        for (id, offset, data) in [(1, 0, &b"he"[..]), (2, 2, &b"llo"[..])] {
            engine.submit_application_request(vl_command_engine::MobileRequest::new(
                APP,
                id,
                put_file("greeting.txt", Some(offset), Some(5), data),
            ));
        }

        let responses = sink.take();
        assert_eq!(responses.len(), 2);
        assert!(responses.iter().all(|r| r.success));
        let stored = std::fs::read(dir.path().join("nav-app").join("greeting.txt")).unwrap();
        assert_eq!(stored, b"hello");

        // Path components that escape the owner directory are refused
        engine.submit_application_request(vl_command_engine::MobileRequest::new(
            APP,
            3,
            put_file("../escape.txt", None, None, b"x"),
        ));
        let responses = sink.take();
        assert!(!responses[0].success);
        assert!(!dir.path().join("escape.txt").exists());
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    #[test]
    fn test_force_timeout_then_late_reply() {
        let f = Fixture::new();
        f.submit(1, add_command(10, true, true));
        let calls = f.calls();
        f.reply(&calls[0], ResultCode::Success);

        f.engine.force_timeout(calls[0].correlation_id);
        let response = f.single_response();
        assert!(!response.success);
        assert_eq!(response.result_code, ResultCode::TimedOut);
        assert!(!f.app().lock().is_reserved(10));
        assert!(f.app().lock().command(10).is_none());

        f.reply(&calls[1], ResultCode::Success);
        assert_eq!(f.sink.count(), 0);
    }

    #[test]
    fn test_disconnect_abandons_without_response() {
        let f = Fixture::new();
        f.submit(1, add_command(10, true, true));
        f.submit(2, prompts());
        let calls = f.calls();
        assert_eq!(f.engine.pending_fan_outs(), 2);

        f.engine.disconnect_application(APP);
        assert_eq!(f.engine.pending_fan_outs(), 0);
        for call in &calls {
            f.reply(call, ResultCode::Success);
        }
        assert_eq!(f.sink.count(), 0);
        assert!(f.engine.application(APP).is_none());
    }
}
