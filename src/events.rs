//! Inbound command queue.
//!
//! Transports never call into the domain on their own schedule.  Whatever
//! they receive is buffered here and drained by the coordinator once per
//! tick, in arrival order, so commands interleave with timeout checks and
//! PIR sampling deterministically.
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ MQTT cb     │────▶│              │     │              │
//! │ UDP socket  │────▶│    Inbox     │────▶│  Coordinator │
//! │ Serial      │────▶│  (bounded)   │     │  (consumer)  │
//! └─────────────┘     └──────────────┘     └──────────────┘
//! ```
//!
//! Fixed capacity, no heap: a line that does not fit, or arrives while the
//! queue is full, is refused with a [`CommandError`] the caller turns into
//! an `error` response.

use heapless::Deque;

use crate::error::CommandError;

/// Maximum number of pending lines.
pub const INBOX_CAP: usize = 8;
/// Maximum bytes per line.  `GHAFEER_NAME:` plus a 64-byte name fits.
pub const LINE_CAP: usize = 128;

pub type Line = heapless::String<LINE_CAP>;

#[derive(Default)]
pub struct Inbox {
    queue: Deque<Line, INBOX_CAP>,
}

impl Inbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one line (trimmed).  Blank lines are ignored.
    pub fn push(&mut self, text: &str) -> Result<(), CommandError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(());
        }
        let mut line = Line::new();
        line.push_str(text)
            .map_err(|()| CommandError::LineTooLong(text.len()))?;
        self.queue
            .push_back(line)
            .map_err(|_| CommandError::QueueFull)
    }

    /// Next line, FIFO.
    pub fn pop(&mut self) -> Option<Line> {
        self.queue.pop_front()
    }

    /// Hand every pending line to `handler`, FIFO.
    pub fn drain(&mut self, mut handler: impl FnMut(Line)) {
        while let Some(line) = self.pop() {
            handler(line);
        }
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
