//! Output surface of the detector

use crate::types::{ErrorReason, KeyEvent};

/// Receiver of detector outputs
///
/// Every method has a no-op default, so implementors only override what they
/// care about. An unhandled outcome is not an error.
pub trait ScanHandler {
    /// Successful ordinary scan
    fn on_scan(&mut self, _text: &str, _count: u32) {}

    /// Successful scan with the scan button pressed more than the threshold
    fn on_scan_button_long_pressed(&mut self, _text: &str, _count: u32) {}

    /// Rejected accumulation; `text` is whatever was buffered
    fn on_error(&mut self, _text: &str, _reason: &ErrorReason) {}

    /// Every event from a non-editable target, before routing
    fn on_key_detect(&mut self, _event: &KeyEvent) {}

    /// Every event from a non-editable target, after all processing
    fn on_receive(&mut self, _event: &KeyEvent) {}
}

impl<H: ScanHandler + ?Sized> ScanHandler for &mut H {
    fn on_scan(&mut self, text: &str, count: u32) {
        (**self).on_scan(text, count)
    }

    fn on_scan_button_long_pressed(&mut self, text: &str, count: u32) {
        (**self).on_scan_button_long_pressed(text, count)
    }

    fn on_error(&mut self, text: &str, reason: &ErrorReason) {
        (**self).on_error(text, reason)
    }

    fn on_key_detect(&mut self, event: &KeyEvent) {
        (**self).on_key_detect(event)
    }

    fn on_receive(&mut self, event: &KeyEvent) {
        (**self).on_receive(event)
    }
}

/// Handler that ignores everything
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopHandler;

impl ScanHandler for NoopHandler {}

#[cfg(feature = "std")]
pub use self::callbacks::Callbacks;

#[cfg(feature = "std")]
mod callbacks {
    use std::boxed::Box;

    use super::ScanHandler;
    use crate::types::{ErrorReason, KeyEvent};

    type TextSlot = Option<Box<dyn FnMut(&str, u32)>>;
    type ErrorSlot = Option<Box<dyn FnMut(&str, &ErrorReason)>>;
    type EventSlot = Option<Box<dyn FnMut(&KeyEvent)>>;

    /// Optional closure slots, one per output
    ///
    /// ```
    /// use barcy_core::{Callbacks, ScanHandler};
    ///
    /// let mut callbacks = Callbacks::new().with_scan(|text, count| {
    ///     println!("scanned {text} ({count})");
    /// });
    /// callbacks.on_scan("4006381333931", 1);
    /// // No error slot set: nothing happens
    /// callbacks.on_error("12", &barcy_core::ErrorReason::TooShort { min_length: 6 });
    /// ```
    #[derive(Default)]
    pub struct Callbacks {
        pub on_scan: TextSlot,
        pub on_scan_button_long_pressed: TextSlot,
        pub on_error: ErrorSlot,
        pub on_key_detect: EventSlot,
        pub on_receive: EventSlot,
    }

    impl Callbacks {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_scan(mut self, f: impl FnMut(&str, u32) + 'static) -> Self {
            self.on_scan = Some(Box::new(f));
            self
        }

        pub fn with_scan_button_long_pressed(mut self, f: impl FnMut(&str, u32) + 'static) -> Self {
            self.on_scan_button_long_pressed = Some(Box::new(f));
            self
        }

        pub fn with_error(mut self, f: impl FnMut(&str, &ErrorReason) + 'static) -> Self {
            self.on_error = Some(Box::new(f));
            self
        }

        pub fn with_key_detect(mut self, f: impl FnMut(&KeyEvent) + 'static) -> Self {
            self.on_key_detect = Some(Box::new(f));
            self
        }

        pub fn with_receive(mut self, f: impl FnMut(&KeyEvent) + 'static) -> Self {
            self.on_receive = Some(Box::new(f));
            self
        }
    }

    impl ScanHandler for Callbacks {
        fn on_scan(&mut self, text: &str, count: u32) {
            if let Some(f) = self.on_scan.as_mut() {
                f(text, count);
            }
        }

        fn on_scan_button_long_pressed(&mut self, text: &str, count: u32) {
            if let Some(f) = self.on_scan_button_long_pressed.as_mut() {
                f(text, count);
            }
        }

        fn on_error(&mut self, text: &str, reason: &ErrorReason) {
            if let Some(f) = self.on_error.as_mut() {
                f(text, reason);
            }
        }

        fn on_key_detect(&mut self, event: &KeyEvent) {
            if let Some(f) = self.on_key_detect.as_mut() {
                f(event);
            }
        }

        fn on_receive(&mut self, event: &KeyEvent) {
            if let Some(f) = self.on_receive.as_mut() {
                f(event);
            }
        }
    }

    impl core::fmt::Debug for Callbacks {
        fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
            f.debug_struct("Callbacks")
                .field("on_scan", &self.on_scan.is_some())
                .field("on_scan_button_long_pressed", &self.on_scan_button_long_pressed.is_some())
                .field("on_error", &self.on_error.is_some())
                .field("on_key_detect", &self.on_key_detect.is_some())
                .field("on_receive", &self.on_receive.is_some())
                .finish()
        }
    }

}
