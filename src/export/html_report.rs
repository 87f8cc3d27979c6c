// File: ./src/export/html_report.rs
// Single-file HTML report, subtasks nested inside their parent's block
use crate::error::ExportError;
use crate::model::parser::{format_optional, format_timestamp};
use crate::model::{Comment, Project, Task};
use chrono::TimeZone;
use std::fmt::Display;
use std::io::Write;

const BOOTSTRAP_CSS: &str = "https://cdn.jsdelivr.net/npm/bootstrap@5.3.3/dist/css/bootstrap.min.css";

const STYLE: &str = r#"
        body { padding: 2rem 0; }
        .task { border-left: 3px solid #dee2e6; padding-left: 1rem; margin-bottom: 1.5rem; }
        .task .task { margin-left: 2rem; border-left-color: #adb5bd; }
        .task-notes { white-space: normal; color: #495057; }
        dl.task-meta { margin-bottom: 0.5rem; }
        dl.task-meta dt { font-weight: 500; }
"#;

pub struct HtmlReport<W: Write, Tz: TimeZone> {
    out: W,
    project_gid: String,
    tz: Tz,
}

impl<W: Write, Tz> HtmlReport<W, Tz>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    /// Writes the document head, title and heading.
    pub fn with_timezone(
        mut out: W,
        project: &Project,
        task_count: usize,
        tz: Tz,
    ) -> Result<Self, ExportError> {
        let title = format!("{} ({} tasks)", html_escape(&project.name), task_count);
        write!(
            out,
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{title}</title>
    <link rel="stylesheet" href="{css}">
    <style>{style}    </style>
</head>
<body>
<div class="container">
<h1>{title}</h1>
"#,
            title = title,
            css = BOOTSTRAP_CSS,
            style = STYLE,
        )?;

        Ok(Self {
            out,
            project_gid: project.gid.clone(),
            tz,
        })
    }

    pub fn write_task(&mut self, task: &Task) -> Result<(), ExportError> {
        self.write_block(task)
    }

    fn write_block(&mut self, task: &Task) -> Result<(), ExportError> {
        let url = html_escape(&task.permalink(&self.project_gid));

        writeln!(self.out, r#"<div class="task">"#)?;
        writeln!(
            self.out,
            r#"<p class="task-name"><strong>{}</strong></p>"#,
            html_escape(&task.name)
        )?;
        writeln!(
            self.out,
            r#"<p class="task-notes">{}</p>"#,
            notes_to_html(&task.notes)
        )?;

        writeln!(self.out, r#"<dl class="row task-meta">"#)?;
        self.write_row("URL", &format!(r#"<a href="{url}">{url}</a>"#))?;
        self.write_row("Assignee", &html_escape(&task.assignee_name))?;
        self.write_row("Created", &format_timestamp(&task.created_at, &self.tz))?;
        self.write_row(
            "Completed",
            &format_optional(task.completed_at.as_ref(), &self.tz),
        )?;
        for comment in &task.comments {
            let date = format_timestamp(&comment.created_at, &self.tz);
            self.write_row(&date, &comment_to_html(comment))?;
        }
        writeln!(self.out, "</dl>")?;

        for sub in &task.subtasks {
            self.write_block(sub)?;
        }

        writeln!(self.out, "</div>")?;
        Ok(())
    }

    /// `label` and `value` are expected to be markup-safe already.
    fn write_row(&mut self, label: &str, value: &str) -> Result<(), ExportError> {
        writeln!(
            self.out,
            r#"    <dt class="col-sm-3">{}</dt><dd class="col-sm-9">{}</dd>"#,
            label, value
        )?;
        Ok(())
    }

    pub fn finish(mut self) -> Result<W, ExportError> {
        write!(
            self.out,
            r#"<footer class="text-muted small mt-4">Exported from Asana</footer>
</div>
</body>
</html>
"#
        )?;
        self.out.flush()?;
        Ok(self.out)
    }
}

fn comment_to_html(comment: &Comment) -> String {
    match &comment.url {
        Some(url) => format!(
            r#"<a href="{}">{}</a>"#,
            html_escape(url),
            html_escape(&comment.text)
        ),
        None => notes_to_html(&comment.text),
    }
}

/// Escapes, then turns line breaks into `<br>`.
fn notes_to_html(s: &str) -> String {
    html_escape(s)
        .replace("\r\n", "\n")
        .replace('\n', "<br>\n")
}

/// Simple HTML escaping for user content.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
