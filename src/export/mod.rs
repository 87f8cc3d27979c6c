// File: ./src/export/mod.rs
// Report writers for resolved task trees
pub mod csv_report;
pub mod html_report;

pub use csv_report::CsvReport;
pub use html_report::HtmlReport;

use crate::error::ExportError;
use crate::model::parser::local_zone;
use crate::model::{Project, Task};
use chrono::{Local, TimeZone};
use clap::ValueEnum;
use std::fmt::Display;
use std::io::Write;
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Csv,
    Html,
}

impl ExportFormat {
    /// `.html`/`.htm` outputs get the HTML report, anything else CSV.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm") => {
                ExportFormat::Html
            }
            _ => ExportFormat::Csv,
        }
    }
}

/// Writes `tasks` task by task and hands the writer back once flushed.
pub fn write_report<W: Write>(
    format: ExportFormat,
    out: W,
    project: &Project,
    tasks: &[Task],
) -> Result<W, ExportError> {
    match format {
        ExportFormat::Csv => {
            let mut report = CsvReport::new(out, project)?;
            for task in tasks {
                report.write_task(task)?;
            }
            report.finish()
        }
        ExportFormat::Html => match local_zone() {
            Some(tz) => write_html(HtmlReport::with_timezone(out, project, tasks.len(), tz)?, tasks),
            None => {
                warn!("cannot detect a named local time zone, timestamps will show UTC offsets");
                write_html(HtmlReport::with_timezone(out, project, tasks.len(), Local)?, tasks)
            }
        },
    }
}

fn write_html<W, Tz>(mut report: HtmlReport<W, Tz>, tasks: &[Task]) -> Result<W, ExportError>
where
    W: Write,
    Tz: TimeZone,
    Tz::Offset: Display,
{
    for task in tasks {
        report.write_task(task)?;
    }
    report.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            ExportFormat::from_path(&PathBuf::from("out/report.HTML")),
            ExportFormat::Html
        );
        assert_eq!(
            ExportFormat::from_path(&PathBuf::from("report.htm")),
            ExportFormat::Html
        );
        assert_eq!(
            ExportFormat::from_path(&PathBuf::from("report.csv")),
            ExportFormat::Csv
        );
        assert_eq!(
            ExportFormat::from_path(&PathBuf::from("report")),
            ExportFormat::Csv
        );
    }

    #[test]
    fn test_write_report_empty_project() {
        let project = Project {
            gid: "42".to_string(),
            name: "Empty".to_string(),
        };
        let csv = write_report(ExportFormat::Csv, Vec::new(), &project, &[]).unwrap();
        assert_eq!(
            String::from_utf8(csv).unwrap(),
            "Task ID,Name,URL,Comment Date,Comment\n"
        );

        let html = write_report(ExportFormat::Html, Vec::new(), &project, &[]).unwrap();
        let html = String::from_utf8(html).unwrap();
        assert!(html.contains("<h1>Empty (0 tasks)</h1>"));
    }
}
