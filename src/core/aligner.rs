// Joins the access log with the bot-detection log
//
// Every access row produces exactly one combined row, in access-log order:
// the access fields (realigned when needed) followed by the bot record that
// belongs to it, or by empty fields when there is none.

use crate::config::{Config, LogPaths};
use crate::core::cursor::{BotCursor, BotLog};
use crate::core::realign::{Realigner, REQUEST_FIELD};
use crate::error::{BotdError, Result};
use crate::table::{write_record, Record, RecordReader};
use serde::Serialize;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use tracing::{debug, info, warn};

/// Request line of the telemetry ingestion route, as it shows up in the access log
pub const DEFAULT_POST_MARKER: &str = "POST /botdetected/json";

/// Rows with this many fields or fewer are passed through without realignment
const MALFORMED_MAX_FIELDS: usize = 4;

/// How an access row was paired with the bot-detection log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pairing {
    /// Too few fields to inspect
    Malformed,
    /// Not a telemetry POST
    NotBotPost,
    /// Telemetry POST that took the next bot record
    Paired,
    /// Telemetry POST, but every bot record was already taken
    Exhausted,
}

/// One output row plus what happened while building it
#[derive(Debug, Clone)]
pub struct Combined {
    pub fields: Record,
    pub pairing: Pairing,
    pub realigned: bool,
}

/// Summary of one alignment run
///
/// Purely informational: none of these counts change what gets written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AlignReport {
    pub access_rows: usize,
    pub malformed_rows: usize,
    pub realigned_rows: usize,
    pub bot_posts: usize,
    pub paired_rows: usize,
    pub exhausted_rows: usize,
    pub unconsumed_bot_records: usize,
    pub width_mismatches: usize,
}

impl AlignReport {
    fn tally(&mut self, combined: &Combined, expected_width: usize) {
        self.access_rows += 1;
        if combined.realigned {
            self.realigned_rows += 1;
        }
        match combined.pairing {
            Pairing::Malformed => self.malformed_rows += 1,
            Pairing::NotBotPost => {}
            Pairing::Paired => {
                self.bot_posts += 1;
                self.paired_rows += 1;
            }
            Pairing::Exhausted => {
                self.bot_posts += 1;
                self.exhausted_rows += 1;
            }
        }
        if combined.fields.len() != expected_width {
            self.width_mismatches += 1;
        }
    }

    /// True when the two logs did not line up one-to-one
    pub fn out_of_sync(&self) -> bool {
        self.exhausted_rows > 0 || self.unconsumed_bot_records > 0
    }
}

/// Pad with empty fields up to `width`; never truncates
fn pad_to(fields: &mut Record, width: usize) {
    if fields.len() < width {
        fields.resize(width, String::new());
    }
}

pub struct LogAligner {
    realigner: Realigner,
    post_marker: String,
}

impl LogAligner {
    /// Create an aligner that pairs rows whose request field contains `post_marker`
    pub fn new<S: Into<String>>(post_marker: S) -> Result<Self> {
        let post_marker = post_marker.into();
        if post_marker.is_empty() {
            return Err(BotdError::Config("post marker must not be empty".to_string()));
        }

        Ok(Self {
            realigner: Realigner::new()?,
            post_marker,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.post_marker.clone())
    }

    pub fn post_marker(&self) -> &str {
        &self.post_marker
    }

    /// Does this (already realigned) row record a telemetry POST?
    pub fn is_bot_post(&self, fields: &[String]) -> bool {
        fields
            .get(REQUEST_FIELD)
            .is_some_and(|request| request.contains(&self.post_marker))
    }

    /// Build the combined row for one access record
    ///
    /// The access half is padded to `access_width` and the bot half to
    /// `bot_width`. Neither half is ever cut short, so an access row that is
    /// still too long after realignment keeps its extra fields and the result
    /// is wider than `access_width + bot_width`. Such rows are counted in
    /// [`AlignReport::width_mismatches`], and `run` warns when that count is
    /// non-zero.
    pub fn combine_record(
        &self,
        access: Record,
        cursor: &mut BotCursor<'_>,
        access_width: usize,
        bot_width: usize,
    ) -> Combined {
        let (mut fields, realigned, pairing, bot) = if access.len() <= MALFORMED_MAX_FIELDS {
            (access, false, Pairing::Malformed, None)
        } else {
            let (fields, realigned) = self.realigner.realign(access);
            let (pairing, bot) = if self.is_bot_post(&fields) {
                match cursor.take() {
                    Some(record) => (Pairing::Paired, Some(record)),
                    None => (Pairing::Exhausted, None),
                }
            } else {
                (Pairing::NotBotPost, None)
            };
            (fields, realigned, pairing, bot)
        };

        pad_to(&mut fields, access_width);
        let bot_start = fields.len();
        if let Some(record) = bot {
            fields.extend(record.iter().cloned());
        }
        pad_to(&mut fields, bot_start + bot_width);

        Combined {
            fields,
            pairing,
            realigned,
        }
    }

    /// Combine an access log stream with an already loaded bot-detection log
    pub fn align<R, W>(&self, bot: &BotLog, access: R, out: &mut W) -> Result<AlignReport>
    where
        R: BufRead,
        W: Write,
    {
        let mut access = RecordReader::new(access);
        let access_header = access.read_header()?;

        let access_width = access_header.len();
        let bot_width = bot.width();
        let expected_width = access_width + bot_width;

        let header: Record = access_header
            .iter()
            .chain(bot.header.iter())
            .cloned()
            .collect();
        write_record(out, &header)?;

        let mut cursor = bot.cursor();
        let mut report = AlignReport::default();

        for (index, record) in access.enumerate() {
            let record = record?;
            // 1-based, header is record 1
            let row = index + 2;

            let combined = self.combine_record(record, &mut cursor, access_width, bot_width);
            match combined.pairing {
                Pairing::Malformed => debug!(row, "malformed access row passed through"),
                Pairing::Exhausted => warn!(row, "telemetry POST with no bot record left"),
                Pairing::Paired | Pairing::NotBotPost => {}
            }
            if combined.realigned {
                debug!(row, "access row realigned");
            }
            if combined.fields.len() != expected_width {
                debug!(
                    row,
                    width = combined.fields.len(),
                    expected = expected_width,
                    "combined row width differs from header"
                );
            }

            report.tally(&combined, expected_width);
            write_record(out, &combined.fields)?;
        }

        report.unconsumed_bot_records = cursor.remaining();
        Ok(report)
    }

    /// Read both logs and (re)write the combined log
    ///
    /// The bot-detection log is read before the output is touched, so a
    /// missing input leaves any previous combined log in place.
    pub fn run(&self, paths: &LogPaths) -> Result<AlignReport> {
        let bot = BotLog::load(&paths.bot_detections_path)?;
        info!(
            path = %paths.bot_detections_path.display(),
            records = bot.records.len(),
            width = bot.width(),
            "loaded bot-detection log"
        );

        let access_file = File::open(&paths.access_log_path)
            .map_err(|e| BotdError::file(&paths.access_log_path, e))?;
        let out_file = File::create(&paths.combined_log_path)
            .map_err(|e| BotdError::file(&paths.combined_log_path, e))?;

        let mut out = BufWriter::new(out_file);
        let report = self.align(&bot, BufReader::new(access_file), &mut out)?;
        out.flush()
            .map_err(|e| BotdError::file(&paths.combined_log_path, e))?;

        info!(
            path = %paths.combined_log_path.display(),
            rows = report.access_rows,
            realigned = report.realigned_rows,
            malformed = report.malformed_rows,
            paired = report.paired_rows,
            "combined log written"
        );
        if report.out_of_sync() {
            warn!(
                exhausted = report.exhausted_rows,
                unconsumed = report.unconsumed_bot_records,
                "access log and bot-detection log are out of step; pairing may be shifted"
            );
        }
        if report.width_mismatches > 0 {
            warn!(
                rows = report.width_mismatches,
                "rows wider than the combined header after realignment"
            );
        }

        Ok(report)
    }
}
