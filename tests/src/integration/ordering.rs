//! # Reply Ordering and Concurrency
//!
//! The combined result of a fan-out depends only on the set of replies, and
//! exactly one response leaves no matter how replies interleave.

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::{Arc, Barrier};
    use std::thread;

    use proptest::prelude::*;
    use vl_command_engine::domain::TtsChunk;
    use vl_command_engine::ipc::{MobilePayload, SetGlobalPropertiesParams};
    use vl_command_engine::{CorrelationId, HmiFunction, HmiReply, ResultCode};

    use crate::integration::fixture::{add_command, delete_command, Fixture};

    fn reply_code() -> impl Strategy<Value = ResultCode> {
        prop_oneof![
            Just(ResultCode::Success),
            Just(ResultCode::Warnings),
            Just(ResultCode::UnsupportedResource),
            Just(ResultCode::Rejected),
            Just(ResultCode::TimedOut),
            Just(ResultCode::GenericError),
        ]
    }

    fn reply_function() -> impl Strategy<Value = HmiFunction> {
        prop_oneof![
            Just(HmiFunction::UiAddCommand),
            Just(HmiFunction::VrAddCommand),
            Just(HmiFunction::TtsSetGlobalProperties),
        ]
    }

    /// Add a command, answer UI and VR in the given order, return the response.
    fn add_with_replies(ui: ResultCode, vr: ResultCode, vr_first: bool) -> (bool, ResultCode) {
        let f = Fixture::new();
        f.submit(1, add_command(10, true, true));
        let calls = f.calls();
        let code_for = |function| match function {
            HmiFunction::UiAddCommand => ui,
            _ => vr,
        };
        let mut order: Vec<_> = calls.iter().collect();
        if vr_first {
            order.reverse();
        }
        for call in order {
            f.reply(call, code_for(call.function()));
        }
        let response = f.single_response();
        assert_eq!(
            f.app().lock().command(10).is_some(),
            response.success,
            "catalogue must follow the outcome"
        );
        (response.success, response.result_code)
    }

    proptest! {
        #[test]
        fn prop_add_command_result_ignores_reply_order(ui in reply_code(), vr in reply_code()) {
            prop_assert_eq!(add_with_replies(ui, vr, false), add_with_replies(ui, vr, true));
        }

        #[test]
        fn prop_delete_result_ignores_reply_order(ui in reply_code(), vr in reply_code()) {
            let run = |vr_first: bool| {
                let f = Fixture::new();
                f.add_confirmed(1, 10);
                f.submit(2, delete_command(10));
                let mut calls = f.calls();
                if vr_first {
                    calls.reverse();
                }
                for call in &calls {
                    let code = match call.function() {
                        HmiFunction::UiDeleteCommand => ui,
                        _ => vr,
                    };
                    f.reply(call, code);
                }
                let response = f.single_response();
                let remaining = f.app().lock().command(10).map(|c| (c.has_menu(), c.has_vr()));
                (response.success, response.result_code, remaining)
            };
            prop_assert_eq!(run(false), run(true));
        }

        #[test]
        fn prop_set_global_properties_result_ignores_reply_order(
            ui in reply_code(),
            tts in reply_code(),
        ) {
            let run = |tts_first: bool| {
                let f = Fixture::new();
                f.submit(
                    1,
                    MobilePayload::SetGlobalProperties(SetGlobalPropertiesParams {
                        help_prompt: Some(vec![TtsChunk::text("Say a command")]),
                        menu_title: Some("Main".into()),
                        ..Default::default()
                    }),
                );
                let mut calls = f.calls();
                assert_eq!(calls.len(), 2);
                if tts_first {
                    calls.reverse();
                }
                for call in &calls {
                    let code = match call.function() {
                        HmiFunction::UiSetGlobalProperties => ui,
                        _ => tts,
                    };
                    f.reply(call, code);
                }
                let response = f.single_response();
                let app = f.app();
                let app = app.lock();
                let cached = (
                    app.global_properties().menu_title.clone(),
                    app.global_properties().help_prompt.is_some(),
                );
                (response.success, response.result_code, response.info, cached)
            };
            prop_assert_eq!(run(false), run(true));
        }

        #[test]
        fn prop_any_reply_sequence_answers_at_most_once(
            replies in prop::collection::vec((reply_function(), reply_code()), 0..8)
        ) {
            let f = Fixture::new();
            f.submit(1, add_command(10, true, true));
            let id = f.calls()[0].correlation_id;

            let mut answered = HashSet::new();
            for (function, code) in &replies {
                f.engine.deliver_subsystem_reply(HmiReply::new(id, *function, *code));
                if *function != HmiFunction::TtsSetGlobalProperties {
                    answered.insert(*function);
                }
                let expected = usize::from(answered.len() == 2);
                prop_assert_eq!(f.sink.count(), expected);
                prop_assert_eq!(f.engine.table().contains(id), expected == 0);
            }
        }
    }

    #[test]
    fn test_concurrent_replies_finalize_once() {
        for _ in 0..50 {
            let f = Fixture::new();
            f.submit(1, add_command(10, true, true));
            let calls = f.calls();
            let id = calls[0].correlation_id;

            let threads = 8;
            let barrier = Arc::new(Barrier::new(threads));
            thread::scope(|scope| {
                for n in 0..threads {
                    let barrier = barrier.clone();
                    let engine = f.engine.clone();
                    let function = if n % 2 == 0 {
                        HmiFunction::UiAddCommand
                    } else {
                        HmiFunction::VrAddCommand
                    };
                    scope.spawn(move || {
                        barrier.wait();
                        engine.deliver_subsystem_reply(HmiReply::new(
                            id,
                            function,
                            ResultCode::Success,
                        ));
                    });
                }
            });

            assert!(f.single_response().success);
            assert!(!f.engine.table().contains(id));
            let app = f.app();
            assert!(app.lock().command(10).is_some());
            assert!(!app.lock().is_reserved(10));
        }
    }

    #[test]
    fn test_concurrent_requests_get_distinct_ids() {
        let f = Fixture::new();
        thread::scope(|scope| {
            for n in 0..8u32 {
                let engine = f.engine.clone();
                scope.spawn(move || {
                    engine.submit_application_request(vl_command_engine::MobileRequest::new(
                        crate::integration::fixture::APP,
                        n,
                        add_command(100 + n, true, false),
                    ));
                });
            }
        });

        let calls = f.calls();
        assert_eq!(calls.len(), 8);
        let ids: HashSet<_> = calls.iter().map(|c| c.correlation_id).collect();
        assert_eq!(ids.len(), 8);
        assert_eq!(f.engine.pending_fan_outs(), 8);
    }

    #[test]
    fn test_unknown_id_is_a_no_op() {
        let f = Fixture::new();
        f.submit(1, add_command(10, true, true));
        let calls = f.calls();
        let id = calls[0].correlation_id;
        f.reply(&calls[0], ResultCode::Success);

        let stranger = CorrelationId::new(id.as_u32().wrapping_add(1_000));
        for function in [HmiFunction::UiAddCommand, HmiFunction::UiDeleteCommand] {
            f.engine
                .deliver_subsystem_reply(HmiReply::new(stranger, function, ResultCode::Success));
        }
        f.engine.force_timeout(stranger);

        assert_eq!(f.sink.count(), 0);
        assert_eq!(f.engine.pending_fan_outs(), 1);
        let record = f.engine.table().lookup(id).expect("record untouched");
        assert_eq!(record.outstanding(), 1);
        assert_eq!(record.responded(), 1);
    }
}
