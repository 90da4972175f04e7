/// Access-row realignment
///
/// Request lines and user agents often carry commas that were never quoted,
/// which splits one logical value across several fields. The status code is
/// the only reliable landmark in the row, so everything between the request
/// field and the status code is folded back into the request field.

use crate::error::Result;
use crate::table::{Record, DELIMITER};
use regex::Regex;

/// Index of the request-line field in a well-formed access row
pub const REQUEST_FIELD: usize = 4;

/// Number of fields that precede the status code in a well-formed row
pub const LEADING_FIELDS: usize = 5;

/// Exactly three decimal digits, e.g. `200` or `404`
///
/// `\d` matches any Unicode decimal digit (`Nd`), so `٢٠٠` qualifies.
/// Superscripts and circled digits such as `²` or `①` do not.
const STATUS_CODE_PATTERN: &str = r"^\d{3}$";

/// Replacement for delimiters that turned out to be part of a value
const JOINER: char = '-';

pub struct Realigner {
    status_code: Regex,
}

impl Realigner {
    pub fn new() -> Result<Self> {
        Ok(Self {
            status_code: Regex::new(STATUS_CODE_PATTERN)?,
        })
    }

    /// Position of the first status-code candidate in the row
    pub fn status_anchor(&self, fields: &[String]) -> Option<usize> {
        fields.iter().position(|f| self.status_code.is_match(f))
    }

    /// Fold stray delimiters back into the request field
    ///
    /// Returns the (possibly rebuilt) row and whether it was changed. Rows
    /// whose anchor sits at or before the request field, and rows that have
    /// no more than five delimiters ahead of the anchor, come back untouched.
    pub fn realign(&self, fields: Record) -> (Record, bool) {
        let Some(anchor) = self.status_anchor(&fields) else {
            return (fields, false);
        };
        if anchor <= REQUEST_FIELD {
            return (fields, false);
        }

        // Delimiters in the joined prefix: the separators plus any that sit inside fields
        let prefix_commas = anchor - 1
            + fields[..anchor]
                .iter()
                .map(|f| f.matches(DELIMITER).count())
                .sum::<usize>();
        if prefix_commas <= LEADING_FIELDS {
            return (fields, false);
        }

        let line = fields.join(DELIMITER.to_string().as_str());
        let commas: Vec<usize> = line.match_indices(DELIMITER).map(|(i, _)| i).collect();

        // From the 5th delimiter through the last one inside the prefix. The
        // delimiter right before the status code is kept.
        let start = commas[LEADING_FIELDS - 1];
        let end = commas[prefix_commas - 1];

        let repaired: String = line
            .char_indices()
            .map(|(i, c)| {
                if c == DELIMITER && (start..=end).contains(&i) {
                    JOINER
                } else {
                    c
                }
            })
            .collect();

        let fields = repaired.split(DELIMITER).map(str::to_string).collect();
        (fields, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::parse_line;

    fn realigner() -> Realigner {
        Realigner::new().unwrap()
    }

    #[test]
    fn test_status_anchor() {
        let r = realigner();
        let row = parse_line("1.2.3.4,-,-,[ts],GET / HTTP/1.1,200,512");
        assert_eq!(r.status_anchor(&row), Some(5));

        // Four digits or letters are not a status code
        let row = parse_line("a,2000,20a,404");
        assert_eq!(r.status_anchor(&row), Some(3));

        assert_eq!(r.status_anchor(&parse_line("a,b,c")), None);
    }

    #[test]
    fn test_status_anchor_digit_class() {
        let r = realigner();
        // Arabic-Indic digits are decimal digits
        assert_eq!(r.status_anchor(&parse_line("a,\u{662}\u{660}\u{660}")), Some(1));
        // Superscript and circled digits are not
        assert_eq!(r.status_anchor(&parse_line("a,\u{b2}\u{2070}\u{2070}")), None);
        assert_eq!(r.status_anchor(&parse_line("a,\u{2460}\u{2461}\u{2462}")), None);
    }

    #[test]
    fn test_first_candidate_wins() {
        let r = realigner();
        let row = parse_line("a,b,123,d,e,200");
        assert_eq!(r.status_anchor(&row), Some(2));

        // Anchor before the request field: nothing to fix
        let (out, changed) = r.realign(row.clone());
        assert!(!changed);
        assert_eq!(out, row);
    }

    #[test]
    fn test_well_formed_row_untouched() {
        let r = realigner();
        let row = parse_line("a,b,c,d,POST /botdetected/json,200");
        let (out, changed) = r.realign(row.clone());
        assert!(!changed);
        assert_eq!(out, row);
    }

    #[test]
    fn test_inflated_row_collapses_to_six_fields() {
        let r = realigner();
        // User agent split in two by an unquoted comma
        let row = parse_line("a,b,c,d,GET /x,Mozilla (X11,Linux),404");
        assert_eq!(row.len(), 8);
        assert_eq!(r.status_anchor(&row), Some(7));

        let (out, changed) = r.realign(row);
        assert!(changed);
        assert_eq!(out, vec!["a", "b", "c", "d", "GET /x-Mozilla (X11-Linux)", "404"]);
    }

    #[test]
    fn test_trailing_fields_survive() {
        let r = realigner();
        let row = parse_line("ip,-,-,ts,GET /a,b,c,200,1024,ref");
        let (out, changed) = r.realign(row);
        assert!(changed);
        assert_eq!(out, vec!["ip", "-", "-", "ts", "GET /a-b-c", "200", "1024", "ref"]);
    }

    #[test]
    fn test_commas_inside_quoted_fields_count() {
        let r = realigner();
        // One inner comma makes five delimiters ahead of the anchor: not enough
        let row = parse_line("a,b,c,d,\"GET /q?x=1,2\",200");
        let (out, changed) = r.realign(row.clone());
        assert!(!changed);
        assert_eq!(out, row);

        // Two inner commas tip it over
        let row = parse_line("a,b,c,d,\"GET /q?x=1,2,3\",200");
        assert_eq!(row.len(), 6);
        let (out, changed) = r.realign(row);
        assert!(changed);
        assert_eq!(out, vec!["a", "b", "c", "d", "GET /q?x=1-2-3", "200"]);
    }

    #[test]
    fn test_early_commas_are_not_rewritten() {
        let r = realigner();
        // The extra commas live in field 1; the fold still starts at the 5th delimiter
        let row = parse_line("a,\"b,b,b\",c,d,e,200");
        let (out, changed) = r.realign(row);
        assert!(changed);
        assert_eq!(out, vec!["a", "b", "b", "b", "c-d-e", "200"]);
    }

    #[test]
    fn test_no_anchor_untouched() {
        let r = realigner();
        let row = parse_line("a,b,c,d,e,f,g,h");
        let (out, changed) = r.realign(row.clone());
        assert!(!changed);
        assert_eq!(out, row);
    }
}
