//! Test utilities for scan detector functionality

pub mod key_sequence {
    //! Scripted, timed key event sequences

    use std::vec::Vec;

    use crate::engine::ScannerEngine;
    use crate::hal::{Duration, Instant};
    use crate::handler::ScanHandler;
    use crate::types::{Disposition, KeyCode, KeyEvent, Target};

    /// Key event scheduled at an offset from the start of the sequence
    #[derive(Debug, Clone, PartialEq)]
    pub struct TimedKey {
        pub offset: Duration,
        pub event: KeyEvent,
    }

    /// Ordered key events with arrival offsets
    ///
    /// The first event of a sequence sits at offset zero; every later event is
    /// placed `gap` after the previous one, plus any pending [`pause`](Self::pause).
    #[derive(Debug, Clone)]
    pub struct KeySequence {
        pub events: Vec<TimedKey>,
        cursor: Option<Duration>,
        pending_pause: Duration,
    }

    impl KeySequence {
        pub fn new() -> Self {
            Self {
                events: Vec::new(),
                cursor: None,
                pending_pause: Duration::from_millis(0),
            }
        }

        /// Append an arbitrary event
        pub fn event(mut self, event: KeyEvent, gap: Duration) -> Self {
            let offset = match self.cursor {
                Some(last) => last + self.pending_pause + gap,
                None => self.pending_pause,
            };
            self.pending_pause = Duration::from_millis(0);
            self.cursor = Some(offset);
            self.events.push(TimedKey { offset, event });
            self
        }

        /// Append a key code on the document
        pub fn key(self, code: KeyCode, gap: Duration) -> Self {
            self.event(KeyEvent::key(code), gap)
        }

        /// Append one event per character of `text`, `gap` apart
        pub fn text(self, text: &str, gap: Duration) -> Self {
            text.chars().fold(self, |seq, c| seq.event(KeyEvent::char(c), gap))
        }

        /// Append one event per character of `text` from an editable target
        pub fn typed_into(self, text: &str, target: Target, gap: Duration) -> Self {
            text.chars()
                .fold(self, |seq, c| seq.event(KeyEvent::char(c).in_target(target), gap))
        }

        /// Append `presses` scan-button events, `gap` apart
        pub fn button(self, code: KeyCode, presses: u32, gap: Duration) -> Self {
            (0..presses).fold(self, |seq, _| seq.key(code, gap))
        }

        /// Delay the next event by `duration` on top of its gap
        pub fn pause(mut self, duration: Duration) -> Self {
            self.pending_pause = self.pending_pause + duration;
            self
        }

        /// Offset of the last event
        pub fn duration(&self) -> Duration {
            self.cursor.unwrap_or(Duration::from_millis(0))
        }

        /// Feed every event to `engine`, polling expired deadlines in between
        ///
        /// Returns the arrival instant of the last event and the dispositions in order.
        pub fn replay<const N: usize, H: ScanHandler>(
            &self,
            engine: &mut ScannerEngine<N>,
            origin: Instant,
            handler: &mut H,
        ) -> (Instant, Vec<Disposition>) {
            let mut last = origin;
            let mut dispositions = Vec::with_capacity(self.events.len());
            for timed in &self.events {
                let at = origin + timed.offset;
                engine.poll(at, handler);
                dispositions.push(engine.handle_key(&timed.event, at, handler));
                last = at;
            }
            (last, dispositions)
        }

        /// Replay, then let the quiet period elapse
        pub fn replay_and_settle<const N: usize, H: ScanHandler>(
            &self,
            engine: &mut ScannerEngine<N>,
            origin: Instant,
            handler: &mut H,
        ) -> Instant {
            let (last, _) = self.replay(engine, origin, handler);
            let settled = last + engine.config().time_before_scan_test;
            engine.poll(settled, handler);
            settled
        }
    }

    impl Default for KeySequence {
        fn default() -> Self {
            Self::new()
        }
    }
}

pub mod recording {
    //! Handler capturing every output for later assertions

    use std::string::{String, ToString};
    use std::vec::Vec;

    use crate::handler::ScanHandler;
    use crate::types::{ErrorReason, KeyEvent};

    /// Captured classification outcome
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Recorded {
        Scan { text: String, count: u32 },
        LongPress { text: String, count: u32 },
        Error { text: String, reason: ErrorReason },
    }

    impl Recorded {
        pub fn scan(text: &str, count: u32) -> Self {
            Recorded::Scan {
                text: text.to_string(),
                count,
            }
        }

        pub fn long_press(text: &str, count: u32) -> Self {
            Recorded::LongPress {
                text: text.to_string(),
                count,
            }
        }

        pub fn error(text: &str, reason: ErrorReason) -> Self {
            Recorded::Error {
                text: text.to_string(),
                reason,
            }
        }
    }

    /// Every handler call, in order
    #[derive(Debug, Default)]
    pub struct RecordingHandler {
        pub outcomes: Vec<Recorded>,
        pub detected: Vec<KeyEvent>,
        pub received: Vec<KeyEvent>,
    }

    impl RecordingHandler {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn scans(&self) -> impl Iterator<Item = &Recorded> {
            self.outcomes
                .iter()
                .filter(|r| matches!(r, Recorded::Scan { .. }))
        }

        pub fn errors(&self) -> impl Iterator<Item = &Recorded> {
            self.outcomes
                .iter()
                .filter(|r| matches!(r, Recorded::Error { .. }))
        }

        /// True if no handler method was ever called
        pub fn is_untouched(&self) -> bool {
            self.outcomes.is_empty() && self.detected.is_empty() && self.received.is_empty()
        }

        pub fn clear(&mut self) {
            self.outcomes.clear();
            self.detected.clear();
            self.received.clear();
        }
    }

    impl ScanHandler for RecordingHandler {
        fn on_scan(&mut self, text: &str, count: u32) {
            self.outcomes.push(Recorded::scan(text, count));
        }

        fn on_scan_button_long_pressed(&mut self, text: &str, count: u32) {
            self.outcomes.push(Recorded::long_press(text, count));
        }

        fn on_error(&mut self, text: &str, reason: &ErrorReason) {
            self.outcomes.push(Recorded::error(text, *reason));
        }

        fn on_key_detect(&mut self, event: &KeyEvent) {
            self.detected.push(*event);
        }

        fn on_receive(&mut self, event: &KeyEvent) {
            self.received.push(*event);
        }
    }
}

pub mod scenarios {
    //! Common configurations and inputs

    use crate::hal::Duration;
    use crate::types::{ScanConfig, KEY_ENTER};

    /// min_length 6, 30 ms per character, 100 ms quiet period, no delimiters
    pub fn basic_config() -> ScanConfig {
        ScanConfig::builder()
            .min_length(6)
            .average_time_by_char(Duration::from_millis(30))
            .time_before_scan_test(Duration::from_millis(100))
            .end_chars(&[])
            .build()
            .expect("valid scenario config")
    }

    /// Basic configuration terminated by Enter
    pub fn enter_terminated_config() -> ScanConfig {
        let mut config = basic_config();
        config.end_chars.clear();
        config.end_chars.push(KEY_ENTER).expect("room for one delimiter");
        config
    }

    /// EAN-13 sample payload
    pub const EAN13: &str = "4006381333931";
}
