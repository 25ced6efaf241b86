//! Buffered terminal output with a single in-flight reveal.

use std::time::Duration;

use game_core::Surface;

use crate::events::OutputEvent;

/// Pause after each revealed line.
pub const REVEAL_CUSHION: Duration = Duration::from_millis(80);

/// Collects output produced while the session handles one request.
///
/// Only one gradual reveal runs at a time. A reveal requested while another
/// is still in flight is emitted as a plain line so the two never interleave.
pub struct OutputSink {
    pending: Vec<OutputEvent>,
    char_delay: Duration,
    now: Duration,
    busy_until: Duration,
}

impl OutputSink {
    pub fn new(char_delay: Duration) -> Self {
        Self {
            pending: Vec::new(),
            char_delay,
            now: Duration::ZERO,
            busy_until: Duration::ZERO,
        }
    }

    pub fn char_delay(&self) -> Duration {
        self.char_delay
    }

    /// Syncs the sink with the session clock.
    pub fn set_now(&mut self, now: Duration) {
        self.now = now;
    }

    pub fn is_revealing(&self) -> bool {
        self.now < self.busy_until
    }

    pub fn line(&mut self, text: impl Into<String>) {
        self.pending.push(OutputEvent::Line(text.into()));
    }

    /// Starts a gradual reveal and returns how long it will take.
    ///
    /// Returns zero when the text was printed immediately instead.
    pub fn reveal(&mut self, text: impl Into<String>) -> Duration {
        let text = text.into();
        if self.is_revealing() || self.char_delay.is_zero() {
            self.line(text);
            return Duration::ZERO;
        }

        let duration = self.reveal_time(&text);
        self.busy_until = self.now + duration;
        self.pending.push(OutputEvent::Reveal {
            text,
            char_delay: self.char_delay,
        });
        duration
    }

    /// Time a reveal of `text` occupies, cushion included.
    pub fn reveal_time(&self, text: &str) -> Duration {
        self.char_delay * text.chars().count() as u32 + REVEAL_CUSHION
    }

    pub fn clear(&mut self) {
        self.busy_until = self.now;
        self.pending.push(OutputEvent::Clear);
    }

    pub fn status(&mut self, status: String) {
        self.pending.push(OutputEvent::Status(status));
    }

    pub fn take(&mut self) -> Vec<OutputEvent> {
        std::mem::take(&mut self.pending)
    }
}

impl Surface for OutputSink {
    fn print_line(&mut self, text: &str) {
        self.line(text);
    }

    fn narrate_line(&mut self, speaker: &str, text: &str) {
        self.reveal(format!("{speaker}: {text}"));
    }
}
