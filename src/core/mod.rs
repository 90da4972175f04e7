/// Log alignment
///
/// Realigns access rows, pairs telemetry POSTs with bot-detection records,
/// and writes the combined log.

pub mod aligner;
pub mod cursor;
pub mod realign;

pub use aligner::{AlignReport, Combined, LogAligner, Pairing, DEFAULT_POST_MARKER};
pub use cursor::{BotCursor, BotLog};
pub use realign::Realigner;
