//! CLI command implementations.

pub mod extract;
pub mod scrape;

pub use extract::ExtractCommand;
pub use scrape::{
    CancelFlag, ConsoleSink, EventSink, NoticeKind, NullSink, RunState, ScrapeCommand,
    ScrapeEvent, ScrapeRun,
};
