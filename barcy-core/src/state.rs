//! Scan accumulator owned by the engine

use heapless::String;

use crate::hal::{Duration, Instant};

/// Mutable state of one scan cycle
///
/// Holds the characters received since the last classification, the arrival times
/// of the first payload character and of the latest event, the hardware-button
/// counter and the single pending quiet-period deadline.
#[derive(Debug)]
pub struct ScanState<const N: usize> {
    buffer: String<N>,
    char_count: usize,
    overflowed: bool,
    first_event_time: Option<Instant>,
    last_event_time: Option<Instant>,
    button_press_count: u32,
    deadline: Option<Instant>,
}

impl<const N: usize> ScanState<N> {
    /// Create an idle state
    pub const fn new() -> Self {
        Self {
            buffer: String::new(),
            char_count: 0,
            overflowed: false,
            first_event_time: None,
            last_event_time: None,
            button_press_count: 0,
            deadline: None,
        }
    }

    /// Accumulated payload
    pub fn text(&self) -> &str {
        self.buffer.as_str()
    }

    /// Payload length in characters
    pub fn len(&self) -> usize {
        self.char_count
    }

    pub fn is_empty(&self) -> bool {
        self.char_count == 0
    }

    /// True once a character had to be dropped for lack of room
    pub fn overflowed(&self) -> bool {
        self.overflowed
    }

    /// Append a payload character
    ///
    /// Returns false if the buffer is full; the character is dropped and the
    /// cycle is marked overflowed. The character still counts towards the length.
    /// Once overflowed, every later character is dropped too, so the buffer
    /// always holds a prefix of the input.
    pub fn push_char(&mut self, c: char) -> bool {
        self.char_count += 1;
        if self.overflowed || self.buffer.push(c).is_err() {
            self.overflowed = true;
            return false;
        }
        true
    }

    /// Record an event arrival
    ///
    /// The first arrival with a non-empty buffer also fixes the start of the scan.
    pub fn touch(&mut self, now: Instant) {
        self.last_event_time = Some(now);
        if self.first_event_time.is_none() && !self.is_empty() {
            self.first_event_time = Some(now);
        }
    }

    pub fn first_event_time(&self) -> Option<Instant> {
        self.first_event_time
    }

    pub fn last_event_time(&self) -> Option<Instant> {
        self.last_event_time
    }

    /// Time between the first payload character and the latest event
    pub fn elapsed(&self) -> Duration {
        match (self.first_event_time, self.last_event_time) {
            (Some(first), Some(last)) => last.saturating_duration_since(first),
            _ => Duration::from_millis(0),
        }
    }

    pub fn button_press_count(&self) -> u32 {
        self.button_press_count
    }

    /// True while there is payload or an unexpired scan-button press
    pub fn has_activity(&self) -> bool {
        !self.is_empty() || self.button_press_count > 0
    }

    pub fn record_button_press(&mut self) {
        self.button_press_count = self.button_press_count.saturating_add(1);
    }

    /// Pending quiet-period deadline
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Replace the pending deadline
    pub fn arm(&mut self, deadline: Instant) {
        self.deadline = Some(deadline);
    }

    /// Cancel the pending deadline, returning it if there was one
    pub fn disarm(&mut self) -> Option<Instant> {
        self.deadline.take()
    }

    /// Return to idle: empty buffer, no timestamps, no button presses, no deadline
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.char_count = 0;
        self.overflowed = false;
        self.first_event_time = None;
        self.last_event_time = None;
        self.button_press_count = 0;
        self.deadline = None;
    }
}

impl<const N: usize> Default for ScanState<N> {
    fn default() -> Self {
        Self::new()
    }
}
