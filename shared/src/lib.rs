pub mod ical;
pub mod models;

pub use ical::{extract, extract_with, EndOfBlock, EventParser, ParserState};
pub use models::{Event, Resource};
