// Record writer with minimal quoting

use super::DELIMITER;
use std::io::{self, Write};

fn needs_quotes(field: &str) -> bool {
    field.contains(DELIMITER) || field.contains('"') || field.contains('\n') || field.contains('\r')
}

/// Write a single record followed by `\n`
///
/// A record made of exactly one empty field is written as `""`, otherwise it
/// would read back as an empty record.
pub fn write_record<W, S>(w: &mut W, fields: &[S]) -> io::Result<()>
where
    W: Write,
    S: AsRef<str>,
{
    if let [only] = fields {
        if only.as_ref().is_empty() {
            return writeln!(w, "\"\"");
        }
    }

    let mut first = true;
    for field in fields {
        let field = field.as_ref();
        if !first {
            write!(w, "{}", DELIMITER)?;
        } else {
            first = false;
        }
        if needs_quotes(field) {
            write!(w, "\"{}\"", field.replace('"', "\"\""))?;
        } else {
            w.write_all(field.as_bytes())?;
        }
    }
    writeln!(w)
}
