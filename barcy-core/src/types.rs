//! Core data types for the scan detector

use core::fmt;

use heapless::Vec;

use crate::hal::Duration;

/// Numeric key code as reported by the host (`which` in browser terms)
pub type KeyCode = u32;

/// Tab, one of the default end delimiters
pub const KEY_TAB: KeyCode = 9;
/// Enter, one of the default end delimiters
pub const KEY_ENTER: KeyCode = 13;

/// Maximum number of start or end delimiters
pub const MAX_DELIMITERS: usize = 8;

/// Kind of UI element that had focus when a key event occurred
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Target {
    /// Document body or window, no element focused
    #[default]
    Document,
    /// Any other element that does not accept text entry
    Element,
    /// Single-line text input
    TextInput,
    /// Multi-line text area
    TextArea,
    /// Element marked content-editable
    ContentEditable,
}

impl Target {
    /// Returns true if human text entry happens in this target
    pub const fn is_text_editable(&self) -> bool {
        match self {
            Target::TextInput | Target::TextArea | Target::ContentEditable => true,
            Target::Document | Target::Element => false,
        }
    }
}

/// Raw key-press event forwarded by the host
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyEvent {
    /// Key code, `None` if the host could not resolve one
    pub code: Option<KeyCode>,
    /// Focused element
    pub target: Target,
}

impl KeyEvent {
    /// Key event on the document
    pub const fn key(code: KeyCode) -> Self {
        Self {
            code: Some(code),
            target: Target::Document,
        }
    }

    /// Key event carrying the code point of `c`
    pub const fn char(c: char) -> Self {
        Self::key(c as KeyCode)
    }

    /// Key event the host could not map to a code
    pub const fn unresolved() -> Self {
        Self {
            code: None,
            target: Target::Document,
        }
    }

    /// Same event, originating from `target`
    pub const fn in_target(self, target: Target) -> Self {
        Self { target, ..self }
    }
}

/// What the host should do with the event after the engine has seen it
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Disposition {
    /// Suppress the host's default handling
    pub prevent_default: bool,
    /// Stop further propagation to other listeners
    pub stop_propagation: bool,
}

impl Disposition {
    /// Leave the event alone
    pub const PASS: Disposition = Disposition {
        prevent_default: false,
        stop_propagation: false,
    };

    /// Swallow the event entirely
    pub const SUPPRESS: Disposition = Disposition {
        prevent_default: true,
        stop_propagation: true,
    };

    /// Union of two dispositions
    pub const fn merge(self, other: Disposition) -> Disposition {
        Disposition {
            prevent_default: self.prevent_default || other.prevent_default,
            stop_propagation: self.stop_propagation || other.stop_propagation,
        }
    }

    pub const fn is_pass(&self) -> bool {
        !self.prevent_default && !self.stop_propagation
    }
}

/// Detector phases
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScanPhase {
    /// Buffer empty, nothing pending
    Idle,
    /// At least one payload character buffered, evaluation pending
    Accumulating,
}

/// Why an accumulation was not accepted as a scan
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ErrorReason {
    /// Fewer characters than `min_length`
    TooShort { min_length: usize },
    /// Elapsed time exceeded `length * average_time_by_char`
    TooSlow { average_ms: u64 },
    /// Elapsed time equal to `length * average_time_by_char`; the limit is exclusive
    AtLimit { average_ms: u64 },
    /// More characters arrived than the buffer can hold
    Overflow { capacity: usize },
}

impl fmt::Display for ErrorReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorReason::TooShort { min_length } => {
                write!(f, "string length should be greater or equal to {}", min_length)
            }
            ErrorReason::TooSlow { average_ms } => write!(
                f,
                "average key character time should be less or equal to {}ms",
                average_ms
            ),
            ErrorReason::AtLimit { average_ms } => write!(
                f,
                "average key character time should be strictly less than {}ms",
                average_ms
            ),
            ErrorReason::Overflow { capacity } => {
                write!(f, "scanned string exceeds buffer capacity of {} bytes", capacity)
            }
        }
    }
}

/// Result of one classification
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScanOutcome {
    /// Ordinary successful scan
    Scan { count: u32 },
    /// Successful scan with the hardware button held past the threshold
    LongPress { count: u32 },
    /// Rejected accumulation
    Error(ErrorReason),
}

impl ScanOutcome {
    pub const fn is_success(&self) -> bool {
        matches!(self, ScanOutcome::Scan { .. } | ScanOutcome::LongPress { .. })
    }
}

/// Configuration validation failures
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// `min_length` must be at least 1
    ZeroMinLength,
    /// `average_time_by_char` must be non-zero
    ZeroAverageTime,
    /// `time_before_scan_test` must be non-zero
    ZeroQuietPeriod,
    /// More than `MAX_DELIMITERS` start or end codes
    TooManyDelimiters,
    /// A code listed as both start and end delimiter
    AmbiguousDelimiter(KeyCode),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroMinLength => write!(f, "min_length must be at least 1"),
            ConfigError::ZeroAverageTime => write!(f, "average_time_by_char must be non-zero"),
            ConfigError::ZeroQuietPeriod => write!(f, "time_before_scan_test must be non-zero"),
            ConfigError::TooManyDelimiters => {
                write!(f, "at most {} start and {} end characters", MAX_DELIMITERS, MAX_DELIMITERS)
            }
            ConfigError::AmbiguousDelimiter(code) => {
                write!(f, "key code {} is both a start and an end character", code)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

/// Scan detector configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScanConfig {
    /// Maximum average time between two characters of a scan
    pub average_time_by_char: Duration,
    /// Minimum payload length, in characters
    pub min_length: usize,
    /// Codes that end a scan and force evaluation
    pub end_chars: Vec<KeyCode, MAX_DELIMITERS>,
    /// Codes swallowed while nothing is buffered
    pub start_chars: Vec<KeyCode, MAX_DELIMITERS>,
    /// Key code emitted by the scanner's hardware trigger, if it acts as a key
    pub scan_button_key_code: Option<KeyCode>,
    /// Button presses above which a successful scan counts as a long press
    pub scan_button_long_press_threshold: u32,
    /// Quiet period after the last event before the buffer is evaluated
    pub time_before_scan_test: Duration,
    /// Suppress the host's default handling of every observed event
    pub prevent_default: bool,
    /// Stop propagation of every observed event
    pub stop_propagation: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        let mut end_chars = Vec::new();
        // Capacity is MAX_DELIMITERS, two always fit
        let _ = end_chars.push(KEY_TAB);
        let _ = end_chars.push(KEY_ENTER);
        Self {
            average_time_by_char: Duration::from_millis(30),
            min_length: 6,
            end_chars,
            start_chars: Vec::new(),
            scan_button_key_code: None,
            scan_button_long_press_threshold: 3,
            time_before_scan_test: Duration::from_millis(100),
            prevent_default: false,
            stop_propagation: false,
        }
    }
}

impl ScanConfig {
    /// Create a new configuration with validation
    pub fn new(
        average_time_by_char: Duration,
        min_length: usize,
        end_chars: &[KeyCode],
        start_chars: &[KeyCode],
        time_before_scan_test: Duration,
    ) -> Result<Self, ConfigError> {
        Self::builder()
            .average_time_by_char(average_time_by_char)
            .min_length(min_length)
            .end_chars(end_chars)
            .start_chars(start_chars)
            .time_before_scan_test(time_before_scan_test)
            .build()
    }

    /// Builder starting from the defaults
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder::default()
    }

    /// Check every invariant of the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_length == 0 {
            return Err(ConfigError::ZeroMinLength);
        }
        if self.average_time_by_char.as_millis() == 0 {
            return Err(ConfigError::ZeroAverageTime);
        }
        if self.time_before_scan_test.as_millis() == 0 {
            return Err(ConfigError::ZeroQuietPeriod);
        }
        if let Some(code) = self.start_chars.iter().find(|c| self.end_chars.contains(*c)) {
            return Err(ConfigError::AmbiguousDelimiter(*code));
        }
        Ok(())
    }

    pub fn is_end_char(&self, code: KeyCode) -> bool {
        self.end_chars.contains(&code)
    }

    pub fn is_start_char(&self, code: KeyCode) -> bool {
        self.start_chars.contains(&code)
    }

    pub fn is_scan_button(&self, code: KeyCode) -> bool {
        self.scan_button_key_code == Some(code)
    }
}

/// Builder for [`ScanConfig`]; delimiter overflow is reported by `build`
#[derive(Clone, Debug, Default)]
pub struct ScanConfigBuilder {
    config: ScanConfig,
    delimiter_overflow: bool,
}

impl ScanConfigBuilder {
    pub fn average_time_by_char(mut self, value: Duration) -> Self {
        self.config.average_time_by_char = value;
        self
    }

    pub fn min_length(mut self, value: usize) -> Self {
        self.config.min_length = value;
        self
    }

    /// Replace the end delimiters
    pub fn end_chars(mut self, codes: &[KeyCode]) -> Self {
        match Vec::from_slice(codes) {
            Ok(codes) => self.config.end_chars = codes,
            Err(()) => self.delimiter_overflow = true,
        }
        self
    }

    /// Replace the start delimiters
    pub fn start_chars(mut self, codes: &[KeyCode]) -> Self {
        match Vec::from_slice(codes) {
            Ok(codes) => self.config.start_chars = codes,
            Err(()) => self.delimiter_overflow = true,
        }
        self
    }

    pub fn scan_button_key_code(mut self, code: KeyCode) -> Self {
        self.config.scan_button_key_code = Some(code);
        self
    }

    pub fn scan_button_long_press_threshold(mut self, value: u32) -> Self {
        self.config.scan_button_long_press_threshold = value;
        self
    }

    pub fn time_before_scan_test(mut self, value: Duration) -> Self {
        self.config.time_before_scan_test = value;
        self
    }

    pub fn prevent_default(mut self, value: bool) -> Self {
        self.config.prevent_default = value;
        self
    }

    pub fn stop_propagation(mut self, value: bool) -> Self {
        self.config.stop_propagation = value;
        self
    }

    pub fn build(self) -> Result<ScanConfig, ConfigError> {
        if self.delimiter_overflow {
            return Err(ConfigError::TooManyDelimiters);
        }
        self.config.validate()?;
        Ok(self.config)
    }
}
