//! Scan detection engine: event ingestion, delimiter routing, debounce and classification
//!
//! The engine is synchronous and clock-agnostic. Callers pass the arrival instant
//! of every event and call [`ScannerEngine::poll`] once the deadline reported by
//! [`ScannerEngine::next_deadline`] has passed. The `task` module (feature
//! `embassy-time`) drives it from an async channel.
//!
//! Resolved behaviours:
//! - The payload character is the Unicode scalar value of the key code.
//! - An end delimiter evaluates the buffer exactly as accumulated, then resets.
//!   The delimiter is never appended and nothing is carried into the next cycle.
//! - Scan-button events are counted, never appended. A press keeps the quiet
//!   period running; presses with no payload behind them expire silently.
//! - Elapsed time equal to `length * average_time_by_char` fails with
//!   [`ErrorReason::AtLimit`].

use crate::handler::ScanHandler;
use crate::hal::Instant;
use crate::state::ScanState;
use crate::types::{
    ConfigError, Disposition, ErrorReason, KeyCode, KeyEvent, ScanConfig, ScanOutcome, ScanPhase,
};

/// Default buffer capacity in bytes
pub const DEFAULT_CAPACITY: usize = 256;

/// Where a key event goes once it passed the editable-target filter
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum Route {
    /// End delimiter with something buffered: evaluate now
    End,
    /// Start delimiter with nothing buffered: swallow
    Start,
    /// Scan button: counted elsewhere, not payload
    Button,
    /// Payload character
    Payload(char),
    /// No usable character
    Unresolved,
}

/// Barcode scanner detector
///
/// `N` bounds the payload in UTF-8 bytes. A scan that does not fit fails with
/// [`ErrorReason::Overflow`]; pick a larger `N` for long 2D codes.
#[derive(Debug)]
pub struct ScannerEngine<const N: usize = DEFAULT_CAPACITY> {
    config: ScanConfig,
    state: ScanState<N>,
    running: bool,
}

impl<const N: usize> ScannerEngine<N> {
    /// Create a stopped engine with the given configuration
    ///
    /// The configuration is taken as is. Configurations assembled by hand rather
    /// than through [`ScanConfig::builder`] should go through [`try_new`](Self::try_new).
    pub fn new(config: ScanConfig) -> Self {
        Self {
            config,
            state: ScanState::new(),
            running: false,
        }
    }

    /// Create a stopped engine after validating `config`
    pub fn try_new(config: ScanConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(config))
    }

    /// Attach: start accepting events from a clean state
    pub fn start(&mut self) {
        self.state.reset();
        self.running = true;

        #[cfg(feature = "defmt")]
        defmt::debug!("scanner started");
    }

    /// Detach: cancel the pending deadline and drop any partial accumulation
    ///
    /// No outcome is emitted for the dropped characters.
    pub fn stop(&mut self) {
        let _cancelled = self.state.disarm();
        self.state.reset();
        self.running = false;

        #[cfg(feature = "defmt")]
        defmt::debug!("scanner stopped, pending deadline cancelled: {}", _cancelled.is_some());
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn state(&self) -> &ScanState<N> {
        &self.state
    }

    /// Current detector phase
    pub fn phase(&self) -> ScanPhase {
        if self.state.is_empty() {
            ScanPhase::Idle
        } else {
            ScanPhase::Accumulating
        }
    }

    /// Instant at which [`poll`](Self::poll) will classify the buffer
    pub fn next_deadline(&self) -> Option<Instant> {
        self.state.deadline()
    }

    /// Process one key event received at `now`
    ///
    /// Returns what the host should do with its event. Events from text-editable
    /// targets are ignored entirely and always pass.
    pub fn handle_key<H: ScanHandler>(
        &mut self,
        event: &KeyEvent,
        now: Instant,
        handler: &mut H,
    ) -> Disposition {
        if !self.running || event.target.is_text_editable() {
            return Disposition::PASS;
        }

        let mut disposition = Disposition::PASS;

        let is_button = event.code.is_some_and(|code| self.config.is_scan_button(code));
        if is_button {
            self.state.record_button_press();
            disposition = Disposition::SUPPRESS;
        }

        handler.on_key_detect(event);

        disposition = disposition.merge(Disposition {
            prevent_default: self.config.prevent_default,
            stop_propagation: self.config.stop_propagation,
        });

        let route = self.route(event.code, is_button);

        #[cfg(feature = "defmt")]
        defmt::trace!("key {:?} routed to {:?}", event.code, route);

        match route {
            Route::End | Route::Start => disposition = disposition.merge(Disposition::SUPPRESS),
            Route::Payload(c) => self.append(c),
            Route::Button | Route::Unresolved => {}
        }

        self.state.touch(now);
        self.schedule(route == Route::End, now, handler);

        handler.on_receive(event);
        disposition
    }

    /// Classify the buffer if the quiet period ended at or before `now`
    ///
    /// A quiet period that ends with only scan-button presses recorded clears
    /// them and reports nothing.
    pub fn poll<H: ScanHandler>(&mut self, now: Instant, handler: &mut H) -> Option<ScanOutcome> {
        match self.state.deadline() {
            Some(deadline) if self.running && deadline <= now => {
                self.state.disarm();
                if self.state.is_empty() {
                    #[cfg(feature = "defmt")]
                    defmt::trace!(
                        "{} button presses expired without payload",
                        self.state.button_press_count()
                    );

                    self.state.reset();
                    return None;
                }
                Some(self.classify(handler))
            }
            _ => None,
        }
    }

    /// Evaluate `text` as if it had been scanned in a single instant
    ///
    /// Any partial accumulation is discarded first. Useful for wiring tests and
    /// demos without a physical scanner. Returns `None` while stopped.
    pub fn simulate<H: ScanHandler>(
        &mut self,
        text: &str,
        now: Instant,
        handler: &mut H,
    ) -> Option<ScanOutcome> {
        if !self.running {
            return None;
        }

        self.state.reset();
        for c in text.chars() {
            self.append(c);
        }
        self.state.touch(now);
        Some(self.classify(handler))
    }

    /// Decide what the character behind `code` means in the current phase
    fn route(&self, code: Option<KeyCode>, is_button: bool) -> Route {
        let Some(code) = code else {
            return Route::Unresolved;
        };

        if !self.state.is_empty() && self.config.is_end_char(code) {
            Route::End
        } else if self.state.is_empty() && self.config.is_start_char(code) {
            Route::Start
        } else if is_button {
            Route::Button
        } else {
            char::from_u32(code).map_or(Route::Unresolved, Route::Payload)
        }
    }

    fn append(&mut self, c: char) {
        if !self.state.push_char(c) {
            #[cfg(feature = "defmt")]
            defmt::warn!("scan buffer full ({} bytes), dropping character", N);
        }
    }

    /// Cancel the pending deadline, then either classify now or re-arm
    fn schedule<H: ScanHandler>(&mut self, force: bool, now: Instant, handler: &mut H) {
        self.state.disarm();

        if force {
            self.classify(handler);
        } else if self.state.has_activity() {
            self.state.arm(now + self.config.time_before_scan_test);
        }
    }

    /// Apply the scan heuristic, emit the outcome and reset
    fn classify<H: ScanHandler>(&mut self, handler: &mut H) -> ScanOutcome {
        let outcome = self.evaluate();
        let text = self.state.text();

        match outcome {
            ScanOutcome::Scan { count } => handler.on_scan(text, count),
            ScanOutcome::LongPress { count } => handler.on_scan_button_long_pressed(text, count),
            ScanOutcome::Error(ref reason) => handler.on_error(text, reason),
        }

        #[cfg(feature = "defmt")]
        defmt::debug!("classified {} chars: {:?}", self.state.len(), outcome);

        self.state.reset();
        outcome
    }

    fn evaluate(&self) -> ScanOutcome {
        let len = self.state.len();
        let average = self.config.average_time_by_char;
        let limit = average * u32::try_from(len).unwrap_or(u32::MAX);
        let elapsed = self.state.elapsed();

        if self.state.overflowed() {
            return ScanOutcome::Error(ErrorReason::Overflow { capacity: N });
        }

        if len >= self.config.min_length && elapsed < limit {
            let count = self.state.button_press_count();
            return if count > self.config.scan_button_long_press_threshold {
                ScanOutcome::LongPress { count }
            } else {
                // A scan implies at least one trigger
                ScanOutcome::Scan { count: count.max(1) }
            };
        }

        let reason = if len < self.config.min_length {
            ErrorReason::TooShort {
                min_length: self.config.min_length,
            }
        } else if elapsed > limit {
            ErrorReason::TooSlow {
                average_ms: average.as_millis(),
            }
        } else {
            ErrorReason::AtLimit {
                average_ms: average.as_millis(),
            }
        };
        ScanOutcome::Error(reason)
    }
}

impl<const N: usize> Default for ScannerEngine<N> {
    fn default() -> Self {
        Self::new(ScanConfig::default())
    }
}
