//! Export and import of the user document.
//!
//! Three export formats: a CSV of the attendance map, a plain-text report,
//! and the whole document as pretty-printed JSON. Only the JSON form can be
//! imported back.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::attendance::AttendanceMap;
use crate::challenge::ChallengeMap;
use crate::error::{ExportError, ImportError};
use crate::settings::SettingsMap;
use crate::store::UserDocument;

pub const CSV_FILE_NAME: &str = "bunk-smart-attendance.csv";
pub const REPORT_FILE_NAME: &str = "bunk-smart-attendance.txt";
pub const REPORT_TITLE: &str = "Bunk Smart Attendance Report";

const CSV_HEADER: &str = "Date,Status,Activity,Missed";
const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Csv,
    Text,
}

impl ExportFormat {
    /// Suggested download name. The JSON name carries the export date.
    pub fn file_name(&self, today: NaiveDate) -> String {
        match self {
            ExportFormat::Json => format!("bunk-smart-data-{}.json", today.format("%Y-%m-%d")),
            ExportFormat::Csv => CSV_FILE_NAME.to_string(),
            ExportFormat::Text => REPORT_FILE_NAME.to_string(),
        }
    }
}

/// Render `doc` in `format`.
pub fn render(format: ExportFormat, doc: &UserDocument) -> Result<String, ExportError> {
    match format {
        ExportFormat::Json => to_json(doc),
        ExportFormat::Csv => to_csv(&doc.attendance),
        ExportFormat::Text => to_text_report(&doc.attendance),
    }
}

/// CSV with one row per record, oldest first. Every data field is quoted.
pub fn to_csv(records: &AttendanceMap) -> Result<String, ExportError> {
    if records.is_empty() {
        return Err(ExportError::NoData);
    }

    let mut out = Vec::new();
    out.extend_from_slice(CSV_HEADER.as_bytes());
    out.push(b'\n');

    {
        let mut writer = csv::WriterBuilder::new()
            .quote_style(csv::QuoteStyle::Always)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(&mut out);
        for (key, record) in records {
            writer.write_record([
                key.to_string().as_str(),
                record.status.as_str(),
                record.activity.as_deref().unwrap_or(""),
                record.missed.as_deref().unwrap_or(""),
            ])?;
        }
        writer.flush().map_err(csv::Error::from)?;
    }

    Ok(String::from_utf8_lossy(&out).into_owned())
}

/// Plain-text report: a title line, then one line per record.
pub fn to_text_report(records: &AttendanceMap) -> Result<String, ExportError> {
    if records.is_empty() {
        return Err(ExportError::NoData);
    }

    let mut out = String::from(REPORT_TITLE);
    out.push_str("\n\n");
    for (key, record) in records {
        let field = |v: &Option<String>| {
            v.as_deref()
                .filter(|s| !s.is_empty())
                .unwrap_or(NOT_AVAILABLE)
                .to_string()
        };
        out.push_str(&format!(
            "{key}: {} - Activity: {} - Missed: {}\n",
            record.status,
            field(&record.activity),
            field(&record.missed),
        ));
    }
    Ok(out)
}

/// Whole document as pretty-printed JSON. Succeeds for an empty document.
pub fn to_json(doc: &UserDocument) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(doc)?)
}

/// Validated import. `None` sections are left untouched by the importer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportPayload {
    pub attendance: Option<AttendanceMap>,
    pub settings: Option<SettingsMap>,
    pub challenges: Option<ChallengeMap>,
}

/// What an import replaced, as section sizes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub attendance: Option<usize>,
    pub settings: Option<usize>,
    pub challenges: Option<usize>,
}

impl ImportPayload {
    pub fn summary(&self) -> ImportSummary {
        ImportSummary {
            attendance: self.attendance.as_ref().map(|m| m.len()),
            settings: self.settings.as_ref().map(|m| m.len()),
            challenges: self.challenges.as_ref().map(|m| m.len()),
        }
    }
}

/// Parse and validate an exported document.
///
/// The payload must be a JSON object with at least one of `attendance`,
/// `settings` or `challenges`. A `null` section counts as absent.
pub fn parse_import(text: &str) -> Result<ImportPayload, ImportError> {
    let value: Value = serde_json::from_str(text)?;
    let Value::Object(mut object) = value else {
        return Err(ImportError::UnrecognizedFormat);
    };

    let payload = ImportPayload {
        attendance: section(&mut object, "attendance")?,
        settings: section(&mut object, "settings")?,
        challenges: section(&mut object, "challenges")?,
    };

    if payload.attendance.is_none() && payload.settings.is_none() && payload.challenges.is_none() {
        return Err(ImportError::UnrecognizedFormat);
    }
    Ok(payload)
}

fn section<T: serde::de::DeserializeOwned>(
    object: &mut serde_json::Map<String, Value>,
    name: &'static str,
) -> Result<Option<T>, ImportError> {
    match object.remove(name) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| ImportError::InvalidSection {
                section: name,
                message: e.to_string(),
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attendance::{AttendanceRecord, AttendanceStatus, DateKey, MarkDetails};

    fn sample() -> AttendanceMap {
        let mut map = AttendanceMap::new();
        for (k, s, d) in [
            ("2026-01-02", AttendanceStatus::Bunked, MarkDetails::new("Hackathon", "DBMS lab")),
            ("2026-01-01", AttendanceStatus::Present, MarkDetails::default()),
        ] {
            let key = DateKey::parse(k).unwrap();
            map.insert(key, AttendanceRecord::new(key, s, d));
        }
        map
    }

    #[test]
    fn csv_rows_are_sorted_and_quoted() {
        let csv = to_csv(&sample()).unwrap();
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines[0], "Date,Status,Activity,Missed");
        assert_eq!(lines[1], r#""2026-01-01","present","","""#);
        assert_eq!(lines[2], r#""2026-01-02","bunked","Hackathon","DBMS lab""#);
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn csv_escapes_embedded_quotes() {
        let key = DateKey::parse("2026-01-03").unwrap();
        let mut map = AttendanceMap::new();
        map.insert(
            key,
            AttendanceRecord::new(key, AttendanceStatus::Bunked, MarkDetails::new(r#"said "hi""#, "x")),
        );
        let csv = to_csv(&map).unwrap();
        assert!(csv.contains(r#""said ""hi""""#));
    }

    #[test]
    fn empty_exports_are_rejected() {
        assert!(matches!(to_csv(&AttendanceMap::new()), Err(ExportError::NoData)));
        assert!(matches!(to_text_report(&AttendanceMap::new()), Err(ExportError::NoData)));
        assert!(to_json(&UserDocument::default()).is_ok());
    }

    #[test]
    fn text_report_uses_placeholders() {
        let report = to_text_report(&sample()).unwrap();
        let mut lines = report.lines();
        assert_eq!(lines.next(), Some(REPORT_TITLE));
        assert!(report.contains("2026-01-01: present - Activity: N/A - Missed: N/A"));
        assert!(report.contains("2026-01-02: bunked - Activity: Hackathon - Missed: DBMS lab"));
    }

    #[test]
    fn file_names() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();
        assert_eq!(ExportFormat::Json.file_name(today), "bunk-smart-data-2026-03-09.json");
        assert_eq!(ExportFormat::Csv.file_name(today), "bunk-smart-attendance.csv");
    }

    #[test]
    fn import_requires_a_known_section() {
        assert!(matches!(parse_import("[]"), Err(ImportError::UnrecognizedFormat)));
        assert!(matches!(parse_import(r#"{"foo": 1}"#), Err(ImportError::UnrecognizedFormat)));
        assert!(matches!(parse_import(r#"{"attendance": null}"#), Err(ImportError::UnrecognizedFormat)));
        assert!(matches!(parse_import("not json"), Err(ImportError::Parse(_))));
    }

    #[test]
    fn import_rejects_malformed_sections() {
        let err = parse_import(r#"{"attendance": {"2026-13-01": {"status": "present"}}}"#).unwrap_err();
        assert!(matches!(err, ImportError::InvalidSection { section: "attendance", .. }));
    }

    #[test]
    fn import_keeps_only_present_sections() {
        let payload = parse_import(r#"{"settings": {"theme": "dark"}}"#).unwrap();
        assert!(payload.attendance.is_none());
        assert!(payload.challenges.is_none());
        assert_eq!(payload.summary().settings, Some(1));
    }
}
