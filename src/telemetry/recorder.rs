// Appends telemetry payloads to the bot-detections file
//
// The file gets its header on first write and one row per payload after
// that. Rows are never rewritten or removed.

use crate::error::{BotdError, Result};
use crate::table::{write_record, Record};
use crate::telemetry::fields;
use crate::telemetry::flatten::{flatten, project};
use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub struct TelemetryRecorder {
    path: PathBuf,
}

impl TelemetryRecorder {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Turn a payload into a bot-detection row without writing it
    pub fn shape(payload: &Value) -> Result<Record> {
        let flat = flatten(payload)?;
        Ok(project(&flat))
    }

    /// Parse JSON text and append it
    pub fn record_json(&self, text: &str) -> Result<Record> {
        let payload: Value = serde_json::from_str(text)?;
        self.append(&payload)
    }

    /// Append one payload, creating the file with its header if needed
    ///
    /// Returns the row that was written.
    pub fn append(&self, payload: &Value) -> Result<Record> {
        let row = Self::shape(payload)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| BotdError::file(parent, e))?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| BotdError::file(&self.path, e))?;

        // An existing but empty file also gets the header
        let needs_header = file
            .metadata()
            .map_err(|e| BotdError::file(&self.path, e))?
            .len()
            == 0;

        let mut out = BufWriter::new(file);
        if needs_header {
            info!(path = %self.path.display(), "creating bot-detections file");
            write_record(&mut out, &fields::header())?;
        }
        write_record(&mut out, &row)?;
        out.flush().map_err(|e| BotdError::file(&self.path, e))?;

        debug!(path = %self.path.display(), is_bot = %row[0], "telemetry recorded");
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::BotLog;
    use crate::telemetry::fields::BOT_FIELDS;
    use serde_json::json;
    use tempfile::TempDir;

    fn sample(is_bot: bool) -> Value {
        json!({
            "isBot": is_bot,
            "botKind": if is_bot { "headless_chrome" } else { "" },
            "browserDetails": {
                "userAgent": "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko)",
                "languages": ["en-US", "en"]
            },
            "detectionTime": "Tue, 05 Mar 2024 10:04:09 +0000"
        })
    }

    #[test]
    fn test_first_write_creates_header() {
        let temp = TempDir::new().unwrap();
        let recorder = TelemetryRecorder::new(temp.path().join("logs").join("bot_detections.csv"));

        recorder.append(&sample(true)).unwrap();

        let text = fs::read_to_string(recorder.path()).unwrap();
        let first_line = text.lines().next().unwrap();
        assert!(first_line.starts_with("isBot,botKind,detectedRules,browserDetails.userAgent"));
        assert_eq!(text.lines().count(), 2);
    }

    #[test]
    fn test_header_written_once() {
        let temp = TempDir::new().unwrap();
        let recorder = TelemetryRecorder::new(temp.path().join("bot_detections.csv"));

        recorder.append(&sample(true)).unwrap();
        recorder.append(&sample(false)).unwrap();
        recorder.append(&sample(true)).unwrap();

        let log = BotLog::load(recorder.path()).unwrap();
        assert_eq!(log.width(), BOT_FIELDS.len());
        assert_eq!(log.records.len(), 3);
        assert_eq!(log.records[1][0], "false");
    }

    #[test]
    fn test_rows_read_back_intact() {
        let temp = TempDir::new().unwrap();
        let recorder = TelemetryRecorder::new(temp.path().join("bot_detections.csv"));

        let written = recorder.append(&sample(true)).unwrap();
        let log = BotLog::load(recorder.path()).unwrap();

        // The user agent holds a comma; it must stay one column
        assert_eq!(log.records[0], written);
        assert_eq!(log.records[0].len(), BOT_FIELDS.len());
        assert_eq!(log.records[0][3], written[3]);
        assert!(written[3].contains("KHTML, like Gecko"));
    }

    #[test]
    fn test_empty_existing_file_gets_header() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bot_detections.csv");
        fs::write(&path, "").unwrap();

        TelemetryRecorder::new(&path).append(&sample(false)).unwrap();
        let log = BotLog::load(&path).unwrap();
        assert_eq!(log.header[0], "isBot");
        assert_eq!(log.records.len(), 1);
    }

    #[test]
    fn test_record_json_text() {
        let temp = TempDir::new().unwrap();
        let recorder = TelemetryRecorder::new(temp.path().join("bot_detections.csv"));

        let row = recorder
            .record_json(r#"{"isBot": true, "detectionTime": "2024-03-05T10:04:09Z"}"#)
            .unwrap();
        assert_eq!(row[0], "true");
        assert!(row.contains(&"[05/Mar/2024:10:04:09 +0000]".to_string()));

        assert!(matches!(
            recorder.record_json("{not json"),
            Err(BotdError::Serialization(_))
        ));
    }

    #[test]
    fn test_rejected_payload_writes_nothing() {
        let temp = TempDir::new().unwrap();
        let recorder = TelemetryRecorder::new(temp.path().join("bot_detections.csv"));

        assert!(matches!(
            recorder.append(&json!([1, 2, 3])),
            Err(BotdError::InvalidPayload(_))
        ));
        assert!(!recorder.path().exists());
    }
}
