//! Property tests for timing classification and state invariants

use barcy_core::test_utils::key_sequence::KeySequence;
use barcy_core::test_utils::recording::{Recorded, RecordingHandler};
use barcy_core::test_utils::scenarios::basic_config;
use barcy_core::{Duration, ErrorReason, Instant, KeyEvent, ScanConfig, ScannerEngine, Target, KEY_ENTER};
use proptest::prelude::*;

const ORIGIN: Instant = Instant::from_millis(10_000);
const SCAN_BUTTON: u32 = 0x7F;

fn started(config: ScanConfig) -> ScannerEngine<64> {
    let mut engine = ScannerEngine::new(config);
    engine.start();
    engine
}

fn any_target() -> impl Strategy<Value = Target> {
    prop_oneof![
        Just(Target::Document),
        Just(Target::Element),
        Just(Target::TextInput),
        Just(Target::TextArea),
        Just(Target::ContentEditable),
    ]
}

fn any_event() -> impl Strategy<Value = KeyEvent> {
    let code = prop_oneof![
        8 => (0x20u32..0x7F).prop_map(Some),
        1 => Just(Some(KEY_ENTER)),
        1 => Just(Some(SCAN_BUTTON)),
        1 => Just(None),
    ];
    (code, any_target()).prop_map(|(code, target)| KeyEvent { code, target })
}

proptest! {
    #[test]
    fn fast_bursts_are_scans(payload in "[A-Z0-9]{6,40}", gap in 0u64..30) {
        let mut engine = started(basic_config());
        let mut handler = RecordingHandler::new();

        KeySequence::new()
            .text(&payload, Duration::from_millis(gap))
            .replay_and_settle(&mut engine, ORIGIN, &mut handler);

        prop_assert_eq!(handler.outcomes, vec![Recorded::scan(&payload, 1)]);
    }

    #[test]
    fn slow_sequences_are_too_slow(payload in "[a-z]{6,20}", gap in 61u64..150) {
        let config = ScanConfig::builder()
            .end_chars(&[])
            .time_before_scan_test(Duration::from_millis(1_000))
            .build()
            .unwrap();
        let mut engine = started(config);
        let mut handler = RecordingHandler::new();

        KeySequence::new()
            .text(&payload, Duration::from_millis(gap))
            .replay_and_settle(&mut engine, ORIGIN, &mut handler);

        prop_assert_eq!(
            handler.outcomes,
            vec![Recorded::error(&payload, ErrorReason::TooSlow { average_ms: 30 })]
        );
    }

    #[test]
    fn short_sequences_are_too_short(payload in "[A-Z0-9]{1,5}", gap in 0u64..99) {
        let mut engine = started(basic_config());
        let mut handler = RecordingHandler::new();

        KeySequence::new()
            .text(&payload, Duration::from_millis(gap))
            .replay_and_settle(&mut engine, ORIGIN, &mut handler);

        prop_assert_eq!(
            handler.outcomes,
            vec![Recorded::error(&payload, ErrorReason::TooShort { min_length: 6 })]
        );
    }

    #[test]
    fn editable_targets_never_reach_the_engine(
        payload in "[ -~]{1,40}",
        target in prop_oneof![Just(Target::TextInput), Just(Target::TextArea), Just(Target::ContentEditable)],
    ) {
        let mut engine = started(basic_config());
        let mut handler = RecordingHandler::new();

        KeySequence::new()
            .typed_into(&payload, target, Duration::from_millis(1))
            .replay_and_settle(&mut engine, ORIGIN, &mut handler);

        prop_assert!(handler.is_untouched());
        prop_assert!(engine.state().is_empty());
        prop_assert_eq!(engine.state().last_event_time(), None);
    }

    #[test]
    fn state_invariants_hold_for_any_stream(
        events in prop::collection::vec((any_event(), 0u64..200), 1..80),
    ) {
        let config = ScanConfig::builder()
            .scan_button_key_code(SCAN_BUTTON)
            .build()
            .unwrap();
        let mut engine = started(config);
        let mut handler = RecordingHandler::new();
        let mut now = ORIGIN;

        for (event, gap) in events {
            now = now + Duration::from_millis(gap);
            engine.poll(now, &mut handler);
            engine.handle_key(&event, now, &mut handler);

            let state = engine.state();
            prop_assert_eq!(state.first_event_time().is_some(), !state.is_empty());
            if state.deadline().is_some() {
                prop_assert!(state.has_activity());
            }
        }

        // Once the last deadline passes everything is back to idle
        engine.poll(now + Duration::from_millis(1_000), &mut handler);
        prop_assert!(engine.state().is_empty());
        prop_assert_eq!(engine.state().button_press_count(), 0);
        prop_assert_eq!(engine.next_deadline(), None);
    }
}
