/// Bot-detection log and its single-pass cursor
///
/// The bot-detection log carries no request id, so pairing is positional:
/// the Nth bot-detection POST in the access log takes the Nth bot record.
/// The cursor owns that position and never rewinds.

use crate::error::{BotdError, Result};
use crate::table::{Record, RecordReader};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Bot-detection log held fully in memory
#[derive(Debug, Clone, Default)]
pub struct BotLog {
    pub header: Record,
    pub records: Vec<Record>,
}

impl BotLog {
    /// Read a header plus every data record, preserving file order
    pub fn read<R: BufRead>(reader: R) -> std::io::Result<Self> {
        let mut reader = RecordReader::new(reader);
        let header = reader.read_header()?;
        let records = reader.collect::<std::io::Result<Vec<_>>>()?;
        Ok(Self { header, records })
    }

    /// Load the log from disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| BotdError::file(path, e))?;
        Self::read(BufReader::new(file)).map_err(|e| BotdError::file(path, e))
    }

    /// Number of header fields; every bot half of a combined row is padded to this
    pub fn width(&self) -> usize {
        self.header.len()
    }

    pub fn cursor(&self) -> BotCursor<'_> {
        BotCursor {
            records: &self.records,
            next: 0,
        }
    }
}

/// Position in the bot-detection log; each record is handed out at most once
#[derive(Debug)]
pub struct BotCursor<'a> {
    records: &'a [Record],
    next: usize,
}

impl<'a> BotCursor<'a> {
    /// Hand out the next unconsumed record, or `None` once the log is exhausted
    pub fn take(&mut self) -> Option<&'a Record> {
        let record = self.records.get(self.next)?;
        self.next += 1;
        Some(record)
    }

    pub fn consumed(&self) -> usize {
        self.next
    }

    pub fn remaining(&self) -> usize {
        self.records.len() - self.next
    }
}
