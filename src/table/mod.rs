/// Comma-separated text I/O
///
/// Both logs are written by ordinary CSV writers, so reading follows the
/// usual quoting rules. Writing uses minimal quoting and `\n` line endings so
/// the same records always produce the same bytes.

pub mod reader;
pub mod writer;

pub use reader::{parse_line, RecordReader};
pub use writer::write_record;

/// Field delimiter shared by every file this crate touches
pub const DELIMITER: char = ',';

/// One parsed row: an ordered list of string fields
pub type Record = Vec<String>;
