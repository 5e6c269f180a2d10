//! Extraction of event records from iCalendar-style feed text.
//!
//! Only `VEVENT` blocks are looked at, and only six properties inside them
//! (`SUMMARY`, `DESCRIPTION`, `LOCATION`, `DTSTART`, `DTEND`, `UID`). Everything
//! else is skipped. Extraction never fails: malformed lines are ignored.
//!
//! A property value is only written into the event when the *next* property
//! line begins, so the property sitting right before `END:VEVENT` is lost
//! unless the parser is built with [`EndOfBlock::FlushPending`].

use std::mem;

use crate::models::Event;

const BEGIN_EVENT: &str = "BEGIN:VEVENT";
const END_EVENT: &str = "END:VEVENT";

/// What happens to the pending property when `END:VEVENT` is reached
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EndOfBlock {
    /// Discard it (the feed bridge's historical behaviour)
    #[default]
    DropPending,
    /// Store it into the event before the event is emitted
    FlushPending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    Outside,
    InEvent,
}

/// Property whose value may still grow through folded continuation lines
#[derive(Debug, Clone)]
struct PendingProperty {
    key: String,
    value: String,
}

/// Line-by-line scanner turning calendar text into [`Event`]s
#[derive(Debug)]
pub struct EventParser {
    state: ParserState,
    current: Event,
    pending: Option<PendingProperty>,
    end_of_block: EndOfBlock,
    events: Vec<Event>,
}

impl EventParser {
    pub fn new() -> Self {
        Self::with_end_of_block(EndOfBlock::default())
    }

    /// Parser that keeps the last property of each block
    pub fn flushing_on_end() -> Self {
        Self::with_end_of_block(EndOfBlock::FlushPending)
    }

    pub fn with_end_of_block(end_of_block: EndOfBlock) -> Self {
        Self {
            state: ParserState::Outside,
            current: Event::default(),
            pending: None,
            end_of_block,
            events: Vec::new(),
        }
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    /// Consume one physical line (a trailing CR is ignored)
    pub fn feed(&mut self, line: &str) {
        let line = line.strip_suffix('\r').unwrap_or(line);

        if line == BEGIN_EVENT {
            self.state = ParserState::InEvent;
            self.current = Event::default();
            self.pending = None;
            return;
        }

        if line == END_EVENT {
            if self.state == ParserState::InEvent {
                if self.end_of_block == EndOfBlock::FlushPending {
                    self.store_pending();
                }
                self.pending = None;
                self.events.push(mem::take(&mut self.current));
                self.state = ParserState::Outside;
            }
            return;
        }

        if self.state == ParserState::Outside {
            return;
        }

        // Folded continuation of the pending value
        if let Some(rest) = line.strip_prefix(' ') {
            if let Some(pending) = self.pending.as_mut() {
                pending.value.push_str(rest);
            }
            return;
        }

        self.store_pending();

        let Some((key, value)) = line.split_once(':') else {
            return;
        };
        let key = key.split_once(';').map_or(key, |(name, _params)| name);

        self.pending = Some(PendingProperty {
            key: key.to_string(),
            value: value.to_string(),
        });
    }

    /// Events completed so far, in block order. An unterminated block is dropped.
    pub fn finalize(self) -> Vec<Event> {
        self.events
    }

    fn store_pending(&mut self) {
        let Some(pending) = &self.pending else {
            return;
        };
        if let Some(field) = event_field(&mut self.current, &pending.key) {
            *field = clean_value(&pending.value);
        }
    }
}

impl Default for EventParser {
    fn default() -> Self {
        Self::new()
    }
}

fn event_field<'a>(event: &'a mut Event, key: &str) -> Option<&'a mut String> {
    match key {
        "SUMMARY" => Some(&mut event.summary),
        "DESCRIPTION" => Some(&mut event.description),
        "LOCATION" => Some(&mut event.location),
        "DTSTART" => Some(&mut event.start),
        "DTEND" => Some(&mut event.end),
        "UID" => Some(&mut event.uid),
        _ => None,
    }
}

/// Decode `\n` and `\,` escapes, then trim. No other escapes are decoded.
pub fn clean_value(raw: &str) -> String {
    raw.replace("\\n", "\n")
        .replace("\\,", ",")
        .trim()
        .to_string()
}

/// Extract every `VEVENT` block from raw feed bytes
pub fn extract(raw: &[u8]) -> Vec<Event> {
    extract_with(raw, EndOfBlock::default())
}

pub fn extract_with(raw: &[u8], end_of_block: EndOfBlock) -> Vec<Event> {
    let text = String::from_utf8_lossy(raw);
    let mut parser = EventParser::with_end_of_block(end_of_block);
    for line in text.lines() {
        parser.feed(line);
    }
    parser.finalize()
}
