use std::collections::HashSet;
use std::io::{Cursor, Write};

use zip::write::FileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use crate::error::PackagingError;
use crate::models::ReportDocument;

pub const ENTRY_SUFFIX: &str = "_Report.html";
pub const DEFAULT_ARCHIVE_NAME: &str = "school_reports.zip";

/// Zips one entry per report. Entries carry a fixed timestamp so the same
/// reports always produce the same bytes.
pub fn package(reports: &[ReportDocument]) -> Result<Vec<u8>, PackagingError> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let opts = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default());

    for (report, name) in reports.iter().zip(entry_names(reports)) {
        zip.start_file(name, opts)?;
        zip.write_all(report.html.as_bytes())?;
    }

    Ok(zip.finish()?.into_inner())
}

/// Archive entry names in report order. A stem that repeats after
/// sanitization gets `_2`, `_3`, ... appended.
pub fn entry_names(reports: &[ReportDocument]) -> Vec<String> {
    let mut taken = HashSet::new();
    reports
        .iter()
        .map(|report| {
            let stem = sanitize(&report.school);
            let mut name = format!("{stem}{ENTRY_SUFFIX}");
            let mut n = 2;
            while !taken.insert(name.clone()) {
                name = format!("{stem}_{n}{ENTRY_SUFFIX}");
                n += 1;
            }
            name
        })
        .collect()
}

pub fn sanitize(school: &str) -> String {
    let replaced: String = school
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let trimmed = replaced.trim_matches(|c: char| c.is_whitespace() || c == '.');
    if trimmed.is_empty() {
        "school".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn doc(school: &str, html: &str) -> ReportDocument {
        ReportDocument {
            school: school.into(),
            html: html.into(),
        }
    }

    #[test]
    fn sanitize_strips_path_characters() {
        assert_eq!(sanitize("Hill School"), "Hill School");
        assert_eq!(sanitize("../etc/passwd"), "_etc_passwd");
        assert_eq!(sanitize("A/B: \"Campus\""), "A_B_ _Campus_");
        assert_eq!(sanitize("  ..  "), "school");
    }

    #[test]
    fn colliding_names_get_suffixes() {
        let reports = vec![doc("A/B", "1"), doc("A:B", "2"), doc("A_B", "3"), doc("C", "4")];
        assert_eq!(
            entry_names(&reports),
            vec![
                "A_B_Report.html",
                "A_B_2_Report.html",
                "A_B_3_Report.html",
                "C_Report.html"
            ]
        );
    }

    #[test]
    fn archive_contains_one_entry_per_report_in_order() {
        let reports = vec![doc("B School", "<p>b</p>"), doc("A School", "<p>a</p>")];
        let bytes = package(&reports).unwrap();

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 2);
        assert_eq!(archive.by_index(0).unwrap().name(), "B School_Report.html");
        assert_eq!(archive.by_index(1).unwrap().name(), "A School_Report.html");

        let mut html = String::new();
        archive
            .by_name("A School_Report.html")
            .unwrap()
            .read_to_string(&mut html)
            .unwrap();
        assert_eq!(html, "<p>a</p>");
    }

    #[test]
    fn archive_bytes_are_deterministic() {
        let reports = vec![doc("Hill", "<p>same</p>")];
        assert_eq!(package(&reports).unwrap(), package(&reports).unwrap());
    }

    #[test]
    fn empty_input_yields_empty_archive() {
        let bytes = package(&[]).unwrap();
        let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 0);
    }
}
