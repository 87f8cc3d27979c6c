// File: ./src/export/csv_report.rs
// Flat CSV: one row per top-level task, one row per comment
use crate::error::ExportError;
use crate::model::parser::format_iso;
use crate::model::{Project, Task};
use std::io::Write;

pub const HEADER: [&str; 5] = ["Task ID", "Name", "URL", "Comment Date", "Comment"];

pub struct CsvReport<W: Write> {
    writer: csv::Writer<W>,
    project_gid: String,
}

impl<W: Write> CsvReport<W> {
    /// Writes the header row straight away.
    pub fn new(out: W, project: &Project) -> Result<Self, ExportError> {
        let mut writer = csv::WriterBuilder::new()
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(out);
        writer.write_record(HEADER)?;
        Ok(Self {
            writer,
            project_gid: project.gid.clone(),
        })
    }

    /// Subtasks are not part of the flat layout.
    pub fn write_task(&mut self, task: &Task) -> Result<(), ExportError> {
        let url = task.permalink(&self.project_gid);
        self.writer
            .write_record([task.gid.as_str(), task.name.as_str(), url.as_str(), "", ""])?;

        for comment in &task.comments {
            let date = format_iso(&comment.created_at);
            self.writer
                .write_record(["", "", "", date.as_str(), comment.text.as_str()])?;
        }
        Ok(())
    }

    pub fn finish(mut self) -> Result<W, ExportError> {
        self.writer.flush()?;
        self.writer
            .into_inner()
            .map_err(|e| ExportError::Write(e.into_error()))
    }
}
