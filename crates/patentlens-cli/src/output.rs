//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use patentlens_domain::{FamilyYearGroup, PatentRecord};
use patentlens_extractor::{RoutedRequest, SourceKind};
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

fn or_dash(value: &str) -> &str {
    if value.is_empty() {
        "-"
    } else {
        value
    }
}

fn source_label(kind: SourceKind) -> String {
    match kind {
        SourceKind::Provider(provider) => provider.to_string(),
        SourceKind::Other => "other".to_string(),
    }
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format an extracted record.
    pub fn format_record(&self, record: &PatentRecord) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(record)?),
            OutputFormat::Table => Ok(self.format_record_table(record)),
        }
    }

    fn format_record_table(&self, record: &PatentRecord) -> String {
        let inventors = record.inventors.join(", ");
        let filing = record.filing_date.to_string();
        let publication = record.publication_date.to_string();
        let priority = record.priority_date.to_string();
        let relations = format!(
            "{} citations, {} cited by, {} family, {} similar, {} legal events",
            record.citations.len(),
            record.cited_by.len(),
            record.family.len(),
            record.similar_documents.len(),
            record.legal_events.len()
        );

        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        builder.push_record(["Publication", or_dash(&record.publication_number)]);
        builder.push_record(["Application", or_dash(&record.application_number)]);
        builder.push_record(["Title", or_dash(&record.title)]);
        builder.push_record(["Assignee", or_dash(&record.assignee)]);
        builder.push_record(["Inventors", or_dash(&inventors)]);
        builder.push_record(["Status", or_dash(&record.status)]);
        builder.push_record(["Filed", filing.as_str()]);
        builder.push_record(["Published", publication.as_str()]);
        builder.push_record(["Priority", priority.as_str()]);
        builder.push_record(["Relations", relations.as_str()]);
        builder.push_record(["Document", record.document_url.as_deref().unwrap_or("-")]);

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));

        let mut output = table.to_string();
        if !record.events.is_empty() {
            output.push('\n');
            output.push_str(&self.format_events_table(record));
        }
        output
    }

    fn format_events_table(&self, record: &PatentRecord) -> String {
        let mut builder = Builder::default();
        builder.push_record(["Date", "Event"]);
        for event in &record.events {
            builder.push_record([event.date.as_str(), event.title.as_str()]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        table.to_string()
    }

    /// Format family members grouped by year.
    pub fn format_family_groups(&self, groups: &[FamilyYearGroup]) -> Result<String> {
        if let OutputFormat::Json = self.format {
            let groups: Vec<serde_json::Value> = groups
                .iter()
                .map(|group| {
                    serde_json::json!({
                        "year": group.year,
                        "members": group.members,
                    })
                })
                .collect();
            return Ok(serde_json::to_string_pretty(&groups)?);
        }

        if groups.is_empty() {
            return Ok(self.colorize("No family members found.", "yellow"));
        }

        let mut builder = Builder::default();
        builder.push_record(["Year", "Members"]);
        for group in groups {
            let members: Vec<&str> = group.members.iter().map(|m| m.number.as_str()).collect();
            builder.push_record([group.year.as_str(), members.join(", ").as_str()]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        Ok(table.to_string())
    }

    /// Format a routing decision.
    pub fn format_route(&self, routed: &RoutedRequest) -> Result<String> {
        let number = routed
            .publication_number
            .as_ref()
            .map(|n| n.to_string())
            .unwrap_or_default();

        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&serde_json::json!({
                "unwrapped": routed.unwrapped,
                "requestedSource": source_label(routed.requested),
                "targetUrl": routed.target_url,
                "source": source_label(routed.target),
                "publicationNumber": number,
                "rewritten": routed.rewritten(),
                "extractable": routed.is_extractable(),
            }))?),
            OutputFormat::Table => {
                let requested = source_label(routed.requested);
                let target = source_label(routed.target);
                let mut builder = Builder::default();
                builder.push_record(["Step", "Value"]);
                builder.push_record(["Unwrapped", routed.unwrapped.as_str()]);
                builder.push_record(["Requested", requested.as_str()]);
                builder.push_record(["Target", routed.target_url.as_str()]);
                builder.push_record(["Source", target.as_str()]);
                builder.push_record(["Number", or_dash(&number)]);

                let mut table = builder.build();
                table
                    .with(Style::rounded())
                    .with(Modify::new(Rows::first()).with(Alignment::center()));

                let mut output = table.to_string();
                if routed.rewritten() {
                    output.push('\n');
                    output.push_str(&self.info("Rewritten to the Google Patents page"));
                }
                if !routed.is_extractable() {
                    output.push('\n');
                    output.push_str(&self.warning("Not a patent page; would be passed through"));
                }
                Ok(output)
            }
        }
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}
