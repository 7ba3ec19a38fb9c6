//! Helpers shared by several rules: date parsing and value sampling.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use medval_contracts::{CellValue, Column};

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Parse a date string in one of the accepted shapes.
///
/// Accepted: `YYYY-MM-DD`, `YYYY/MM/DD`, `MM/DD/YYYY`, `YYYYMMDD`,
/// `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS` and RFC 3339. Times are
/// dropped; only the calendar date is returned.
pub fn parse_date_str(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if s.len() == 8 && s.bytes().all(|b| b.is_ascii_digit()) {
        return compact_date(s);
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return Some(date);
        }
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt.date());
        }
    }
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive())
}

/// Parse a cell as a date. Integer cells are read as `YYYYMMDD`.
pub fn parse_date(value: &CellValue) -> Option<NaiveDate> {
    match value {
        CellValue::Text(s) => parse_date_str(s),
        CellValue::Int(i) if (10_000_101..=99_991_231).contains(i) => compact_date(&i.to_string()),
        _ => None,
    }
}

fn compact_date(s: &str) -> Option<NaiveDate> {
    let year = s.get(0..4)?.parse().ok()?;
    let month = s.get(4..6)?.parse().ok()?;
    let day = s.get(6..8)?.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// The first `limit` non-missing text cells of a column.
pub fn text_sample(column: &Column, limit: usize) -> Vec<&str> {
    column
        .values
        .iter()
        .filter_map(|v| match v {
            CellValue::Text(s) if !s.trim().is_empty() => Some(s.as_str()),
            _ => None,
        })
        .take(limit)
        .collect()
}

/// Up to `limit` distinct textual renderings, for issue metadata.
pub fn samples<'a>(values: impl IntoIterator<Item = &'a CellValue>, limit: usize) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for value in values {
        if out.len() >= limit {
            break;
        }
        if let Some(text) = value.as_text() {
            if !out.contains(&text) {
                out.push(text);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_every_listed_shape() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        for raw in [
            "2024-03-15",
            "2024/03/15",
            "03/15/2024",
            "20240315",
            "2024-03-15 08:30:00",
            "2024-03-15T08:30:00",
            "2024-03-15T08:30:00Z",
            "2024-03-15T08:30:00+02:00",
        ] {
            assert_eq!(parse_date_str(raw), Some(expected), "failed to parse {raw}");
        }
    }

    #[test]
    fn rejects_impossible_and_free_text_dates() {
        for raw in ["2024-02-30", "13/01/2024", "not a date", "", "2024-3"] {
            assert_eq!(parse_date_str(raw), None, "{raw} should not parse");
        }
    }

    #[test]
    fn integer_cells_are_compact_dates() {
        assert_eq!(
            parse_date(&CellValue::Int(19800101)),
            NaiveDate::from_ymd_opt(1980, 1, 1)
        );
        assert_eq!(parse_date(&CellValue::Int(42)), None);
        assert_eq!(parse_date(&CellValue::Bool(true)), None);
    }

    #[test]
    fn samples_are_distinct_and_bounded() {
        let values = vec![
            CellValue::from("a"),
            CellValue::from("a"),
            CellValue::Null,
            CellValue::from("b"),
            CellValue::from("c"),
        ];
        assert_eq!(samples(&values, 2), vec!["a".to_string(), "b".to_string()]);
    }
}
