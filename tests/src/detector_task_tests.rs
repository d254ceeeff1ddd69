//! Async detector tests: embassy channel and timers under tokio

use std::time::{Duration, Instant};

use barcy_core::test_utils::recording::{Recorded, RecordingHandler};
use barcy_core::test_utils::scenarios::{basic_config, enter_terminated_config};
use barcy_core::{detector_task, DetectorCommand, ErrorReason, KeyEvent, ScannerEngine, Target, KEY_ENTER};
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::channel::Channel;
use tokio::time::sleep;

type Commands = Channel<NoopRawMutex, DetectorCommand, 32>;

async fn type_text(commands: &Commands, text: &str, gap: Duration) {
    for c in text.chars() {
        commands.send(DetectorCommand::Key(KeyEvent::char(c))).await;
        sleep(gap).await;
    }
}

/// Quiet period ends the scan without any delimiter
#[tokio::test]
async fn test_quiet_period_completes_scan() {
    println!("⏱️ Testing quiet period evaluation...");

    let commands = Commands::new();
    let engine = ScannerEngine::<64>::new(basic_config());

    let feeder = async {
        commands.send(DetectorCommand::Start).await;
        type_text(&commands, "ABCDEF", Duration::from_millis(2)).await;
        // Well past the 100 ms quiet period
        sleep(Duration::from_millis(250)).await;
        commands.send(DetectorCommand::Shutdown).await;
    };

    let ((engine, handler), ()) = tokio::join!(
        detector_task(commands.receiver(), engine, RecordingHandler::new()),
        feeder
    );

    assert_eq!(handler.outcomes, [Recorded::scan("ABCDEF", 1)]);
    assert!(!engine.is_running());

    println!("  ✅ Scan emitted after quiet period");
}

/// Enter evaluates at once, no quiet period needed
#[tokio::test]
async fn test_end_delimiter_is_immediate() {
    println!("⏎ Testing end delimiter...");

    let commands = Commands::new();
    let engine = ScannerEngine::<64>::new(enter_terminated_config());

    let feeder = async {
        commands.send(DetectorCommand::Start).await;
        type_text(&commands, "123456", Duration::from_millis(2)).await;
        commands.send(DetectorCommand::Key(KeyEvent::key(KEY_ENTER))).await;
        // Shutdown right behind the delimiter: the quiet period never elapses
        commands.send(DetectorCommand::Shutdown).await;
    };

    let start = Instant::now();
    let ((_, handler), ()) = tokio::join!(
        detector_task(commands.receiver(), engine, RecordingHandler::new()),
        feeder
    );
    let elapsed = start.elapsed();

    assert_eq!(handler.outcomes, [Recorded::scan("123456", 1)]);
    assert!(elapsed < Duration::from_millis(100));

    println!("  ✅ Scan emitted in {}ms", elapsed.as_millis());
}

/// Slow typing through the driver is rejected
#[tokio::test]
async fn test_human_typing_is_rejected() {
    let commands = Commands::new();
    let engine = ScannerEngine::<64>::new(basic_config());

    let feeder = async {
        commands.send(DetectorCommand::Start).await;
        // 50 ms per character stays inside the quiet period but over the average
        type_text(&commands, "ABCDEF", Duration::from_millis(50)).await;
        sleep(Duration::from_millis(200)).await;
        commands.send(DetectorCommand::Shutdown).await;
    };

    let ((_, handler), ()) = tokio::join!(
        detector_task(commands.receiver(), engine, RecordingHandler::new()),
        feeder
    );

    assert_eq!(
        handler.outcomes,
        [Recorded::error("ABCDEF", ErrorReason::TooSlow { average_ms: 30 })]
    );
}

/// Stop cancels the pending evaluation deterministically
#[tokio::test]
async fn test_stop_cancels_pending_timer() {
    let commands = Commands::new();
    let engine = ScannerEngine::<64>::new(basic_config());

    let feeder = async {
        commands.send(DetectorCommand::Start).await;
        type_text(&commands, "ABCDEF", Duration::from_millis(2)).await;
        commands.send(DetectorCommand::Stop).await;
        sleep(Duration::from_millis(250)).await;
        // Detached: ignored
        type_text(&commands, "GHIJKL", Duration::from_millis(2)).await;
        sleep(Duration::from_millis(250)).await;
        commands.send(DetectorCommand::Shutdown).await;
    };

    let ((engine, handler), ()) = tokio::join!(
        detector_task(commands.receiver(), engine, RecordingHandler::new()),
        feeder
    );

    assert!(handler.outcomes.is_empty());
    assert_eq!(handler.received.len(), 6);
    assert_eq!(engine.next_deadline(), None);
}

/// Two scans separated by a pause come out as two outcomes
#[tokio::test]
async fn test_consecutive_scans() {
    let commands = Commands::new();
    let engine = ScannerEngine::<64>::new(basic_config());

    let feeder = async {
        commands.send(DetectorCommand::Start).await;
        type_text(&commands, "FIRST1", Duration::from_millis(2)).await;
        sleep(Duration::from_millis(200)).await;
        commands
            .send(DetectorCommand::Key(KeyEvent::char('x').in_target(Target::TextInput)))
            .await;
        type_text(&commands, "SECOND", Duration::from_millis(2)).await;
        sleep(Duration::from_millis(200)).await;
        commands.send(DetectorCommand::Shutdown).await;
    };

    let ((_, handler), ()) = tokio::join!(
        detector_task(commands.receiver(), engine, RecordingHandler::new()),
        feeder
    );

    assert_eq!(
        handler.outcomes,
        [Recorded::scan("FIRST1", 1), Recorded::scan("SECOND", 1)]
    );
    assert_eq!(handler.received.len(), 12);
}

/// Commands queued before the task runs are processed in order
#[test]
fn test_prequeued_commands() {
    let commands = Commands::new();
    let mut queued = vec![DetectorCommand::Start];
    queued.extend("0123456789".chars().map(|c| DetectorCommand::Key(KeyEvent::char(c))));
    queued.push(DetectorCommand::Key(KeyEvent::key(KEY_ENTER)));
    queued.push(DetectorCommand::Key(KeyEvent::char('9')));
    queued.push(DetectorCommand::Shutdown);
    for command in queued {
        commands.try_send(command).unwrap();
    }

    let (engine, handler) = tokio_test::block_on(detector_task(
        commands.receiver(),
        ScannerEngine::<64>::new(enter_terminated_config()),
        RecordingHandler::new(),
    ));

    // The trailing '9' was pending when Shutdown dropped it
    assert_eq!(handler.outcomes, [Recorded::scan("0123456789", 1)]);
    assert_eq!(handler.received.len(), 12);
    assert!(engine.state().is_empty());
}
