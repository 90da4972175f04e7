/// Bot-detection telemetry
///
/// Shapes the JSON payload posted by the in-browser detector into the fixed
/// bot-detections column layout and appends it to disk.

pub mod fields;
pub mod flatten;
pub mod recorder;

pub use fields::BOT_FIELDS;
pub use flatten::{flatten, normalize_detection_time, project};
pub use recorder::TelemetryRecorder;
