//! Timeline reconciliation
//!
//! The event history is read from the page's timeline widget when present
//! (widget mode) and otherwise synthesized from extracted fields (synthetic
//! mode). Both modes finish with [`post_process`].

use crate::document::{
    collapse_whitespace, element_text, first_text_within, select_within, PageDocument,
};
use once_cell::sync::Lazy;
use patentlens_domain::{LegalEvent, PatentDate, TimelineEvent};
use regex::Regex;
use std::collections::HashSet;
use tracing::debug;

/// One element per event in the timeline widget
pub const WIDGET_EVENT_SELECTOR: &str = "div.event.layout.horizontal.style-scope.application-timeline";

/// Typed date cells; the first non-empty one in document order wins
const TYPED_DATE_SELECTOR: &str = "div.filed, div.reassignment, div.publication, div.granted, div.legal-status";

const UNKNOWN_ASSIGNEE: &str = "Unknown Assignee";
const UNKNOWN_PUBLICATION: &str = "Unknown Publication";

static DATE_CELL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(\d{4}-\d{2}-\d{2}|status|anticipated\s*expiration)$")
        .expect("date cell pattern is valid")
});

static TERMINATOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(anticipated|adjusted)\s*expiration").expect("terminator pattern is valid")
});

/// Which construction mode produced a timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimelineMode {
    /// Read from the timeline widget
    Widget,
    /// Synthesized from extracted fields
    Synthetic,
}

/// Extracted fields the synthetic mode builds on
#[derive(Debug, Clone, Copy)]
pub struct SyntheticInputs<'a> {
    /// Filing date as found on the page, empty when not found
    pub filing_date: &'a str,
    /// Publication date as found on the page, empty when not found
    pub publication_date: &'a str,
    /// Assignee, empty when not found
    pub assignee: &'a str,
    /// Publication number, empty when not found
    pub publication_number: &'a str,
    /// Legal events table
    pub legal_events: &'a [LegalEvent],
    /// Status, empty when not found
    pub status: &'a str,
}

/// Read events from the timeline widget, in document order
///
/// Elements lacking a date or a title are not emitted. The walk stops at the
/// anticipated or adjusted expiration element, emitted or not.
pub fn widget_events(doc: &PageDocument) -> Vec<TimelineEvent> {
    let mut events = Vec::new();

    for element in doc.select(WIDGET_EVENT_SELECTOR) {
        let date = first_text_within(element, TYPED_DATE_SELECTOR).or_else(|| {
            select_within(element, "div")
                .into_iter()
                .map(element_text)
                .find(|text| DATE_CELL.is_match(text))
        });
        let title = first_text_within(element, "span.title-text")
            .or_else(|| first_text_within(element, "div.flex.title, a"))
            .map(|title| collapse_whitespace(&title));

        let terminal = [&date, &title]
            .into_iter()
            .flatten()
            .any(|text| TERMINATOR.is_match(text));

        match (date, title) {
            (Some(date), Some(title)) if date.eq_ignore_ascii_case("status") => {
                events.push(TimelineEvent::status(title));
            }
            (Some(date), Some(title)) => events.push(TimelineEvent::new(date, title)),
            _ => {}
        }

        if terminal {
            debug!("Reached expiration marker, stopping timeline walk");
            break;
        }
    }

    events
}

/// Title for a legal event description
///
/// Known codes are spelled out; anything else is kept verbatim.
pub fn legal_event_title(description: &str, assignee: &str) -> String {
    match description.trim() {
        "AS" => format!("Assigned to {}", or_default(assignee, UNKNOWN_ASSIGNEE)),
        "STCF" => "Application granted".to_string(),
        "MAFP" => "Maintenance fee payment".to_string(),
        other => other.to_string(),
    }
}

/// Synthesize events from extracted fields
///
/// Emits, in order: the filing event, the publication event, one event per
/// legal-event row with both a date and a description, and the status
/// sentinel. A filing or publication date that is present but not ISO
/// formatted is kept verbatim and sorts as undated.
pub fn synthetic_events(inputs: &SyntheticInputs<'_>) -> Vec<TimelineEvent> {
    let mut events = Vec::new();

    let filing_date = inputs.filing_date.trim();
    if !filing_date.is_empty() {
        events.push(TimelineEvent::new(
            event_date(filing_date),
            format!(
                "Application filed by {}",
                or_default(inputs.assignee, UNKNOWN_ASSIGNEE)
            ),
        ));
    }

    let publication_date = inputs.publication_date.trim();
    if !publication_date.is_empty() {
        events.push(TimelineEvent::new(
            event_date(publication_date),
            format!(
                "Publication of {}",
                or_default(inputs.publication_number, UNKNOWN_PUBLICATION)
            ),
        ));
    }

    for row in inputs.legal_events {
        let date = row.date.trim();
        let description = row.description.trim();
        if date.is_empty() || description.is_empty() {
            continue;
        }
        events.push(TimelineEvent::new(
            date,
            legal_event_title(description, inputs.assignee),
        ));
    }

    if !inputs.status.is_empty() {
        events.push(TimelineEvent::status(inputs.status));
    }

    events
}

/// Drop duplicates and order the timeline
///
/// Exact `(date, title)` duplicates and any second status sentinel are
/// dropped, first occurrence winning. The sort is stable: dated events by
/// calendar date, then undated events, then the sentinel.
pub fn post_process(events: Vec<TimelineEvent>) -> Vec<TimelineEvent> {
    let mut seen = HashSet::new();
    let mut sentinel_seen = false;

    let mut kept: Vec<TimelineEvent> = events
        .into_iter()
        .filter(|event| {
            if event.is_sentinel() {
                if sentinel_seen {
                    return false;
                }
                sentinel_seen = true;
            }
            seen.insert((event.date.clone(), event.title.clone()))
        })
        .collect();

    kept.sort_by_key(TimelineEvent::order);
    kept
}

/// Build the final timeline: widget mode first, synthetic mode as fallback
pub fn reconcile(
    doc: &PageDocument,
    inputs: &SyntheticInputs<'_>,
) -> (TimelineMode, Vec<TimelineEvent>) {
    let widget = widget_events(doc);
    if !widget.is_empty() {
        debug!(count = widget.len(), "Timeline read from widget");
        return (TimelineMode::Widget, post_process(widget));
    }

    let synthetic = synthetic_events(inputs);
    debug!(count = synthetic.len(), "Timeline synthesized");
    (TimelineMode::Synthetic, post_process(synthetic))
}

/// ISO form when the text embeds a date, otherwise the text as found
fn event_date(raw: &str) -> String {
    match PatentDate::parse(raw) {
        known @ PatentDate::Known(_) => known.to_string(),
        PatentDate::Unknown => raw.to_string(),
    }
}

fn or_default<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.trim().is_empty() {
        default
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use patentlens_domain::STATUS_SENTINEL;

    fn event(date: &str, title: &str) -> TimelineEvent {
        TimelineEvent::new(date, title)
    }

    fn widget_page(events: &str) -> PageDocument {
        PageDocument::parse(
            &format!(r#"<div class="wrap style-scope application-timeline">{}</div>"#, events),
            "https://patents.google.com/patent/US1A/en",
        )
    }

    fn widget_event(date_cell: &str, title: &str) -> String {
        format!(
            r#"<div class="event layout horizontal style-scope application-timeline">{}<span class="title-text">{}</span></div>"#,
            date_cell, title
        )
    }

    #[test]
    fn test_widget_typed_cells_and_status() {
        let page = widget_page(&[
            widget_event(r#"<div class="filed">2011-03-08</div>"#, "Application filed by Acme"),
            widget_event(r#"<div class="publication">2012-04-19</div>"#, "Publication of US1A"),
            widget_event(r#"<div class="legal-status">Status</div>"#, "Active"),
        ]
        .concat());

        let events = widget_events(&page);
        assert_eq!(events.len(), 3);
        assert_eq!(events[0], event("2011-03-08", "Application filed by Acme"));
        assert_eq!(events[2], TimelineEvent::status("Active"));
    }

    #[test]
    fn test_widget_untyped_date_and_flex_title() {
        let page = widget_page(
            r#"<div class="event layout horizontal style-scope application-timeline">
                 <div>2014-12-02</div>
                 <div class="flex title">Application
                     granted</div>
               </div>"#,
        );
        assert_eq!(widget_events(&page), vec![event("2014-12-02", "Application granted")]);
    }

    #[test]
    fn test_widget_skips_incomplete_elements() {
        let page = widget_page(&[
            widget_event("", "No date"),
            r#"<div class="event layout horizontal style-scope application-timeline"><div class="filed">2011-03-08</div></div>"#.to_string(),
            widget_event(r#"<div class="granted">2014-12-02</div>"#, "Granted"),
        ]
        .concat());
        assert_eq!(widget_events(&page), vec![event("2014-12-02", "Granted")]);
    }

    #[test]
    fn test_widget_stops_after_expiration() {
        let page = widget_page(&[
            widget_event(r#"<div class="filed">2011-03-08</div>"#, "Filed"),
            widget_event(r#"<div class="legal-status">2031-05-01</div>"#, "Anticipated expiration"),
            widget_event(r#"<div class="legal-status">Status</div>"#, "Active"),
        ]
        .concat());

        let events = widget_events(&page);
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].title, "Anticipated expiration");
    }

    #[test]
    fn test_widget_stops_at_undated_expiration() {
        let page = widget_page(&[
            widget_event(r#"<div class="filed">2011-03-08</div>"#, "Filed"),
            widget_event("", "Anticipated expiration"),
            widget_event(r#"<div class="legal-status">2040-01-01</div>"#, "Past terminator"),
        ]
        .concat());

        assert_eq!(widget_events(&page), vec![event("2011-03-08", "Filed")]);
    }

    #[test]
    fn test_synthetic_emission_order() {
        let legal = vec![
            LegalEvent {
                date: "2011-05-01".to_string(),
                description: "AS".to_string(),
            },
            LegalEvent {
                date: "".to_string(),
                description: "STCF".to_string(),
            },
            LegalEvent {
                date: "2018-06-01".to_string(),
                description: "MAFP".to_string(),
            },
            LegalEvent {
                date: "2020-01-01".to_string(),
                description: "Change of name".to_string(),
            },
        ];
        let inputs = SyntheticInputs {
            filing_date: "2011-03-08",
            publication_date: "2014-12-02",
            assignee: "Acme",
            publication_number: "US8900904B2",
            legal_events: &legal,
            status: "Active",
        };

        let events = synthetic_events(&inputs);
        assert_eq!(
            events,
            vec![
                event("2011-03-08", "Application filed by Acme"),
                event("2014-12-02", "Publication of US8900904B2"),
                event("2011-05-01", "Assigned to Acme"),
                event("2018-06-01", "Maintenance fee payment"),
                event("2020-01-01", "Change of name"),
                TimelineEvent::status("Active"),
            ]
        );
    }

    #[test]
    fn test_synthetic_placeholders() {
        let inputs = SyntheticInputs {
            filing_date: "2011-03-08",
            publication_date: "2014-12-02",
            assignee: "",
            publication_number: "",
            legal_events: &[],
            status: "",
        };
        let events = synthetic_events(&inputs);
        assert_eq!(events[0].title, "Application filed by Unknown Assignee");
        assert_eq!(events[1].title, "Publication of Unknown Publication");
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_synthetic_keeps_non_iso_dates() {
        let inputs = SyntheticInputs {
            filing_date: "March 8, 2011",
            publication_date: "2014-12-02",
            assignee: "Acme",
            publication_number: "US8900904B2",
            legal_events: &[],
            status: "Active",
        };

        let events = post_process(synthetic_events(&inputs));
        assert_eq!(
            events,
            vec![
                event("2014-12-02", "Publication of US8900904B2"),
                event("March 8, 2011", "Application filed by Acme"),
                TimelineEvent::status("Active"),
            ]
        );
    }

    #[test]
    fn test_synthetic_normalizes_embedded_iso_dates() {
        let inputs = SyntheticInputs {
            filing_date: "Filed 2011-03-08",
            publication_date: "",
            assignee: "Acme",
            publication_number: "",
            legal_events: &[],
            status: "",
        };
        assert_eq!(
            synthetic_events(&inputs),
            vec![event("2011-03-08", "Application filed by Acme")]
        );
    }

    #[test]
    fn test_synthetic_skips_missing_dates() {
        let inputs = SyntheticInputs {
            filing_date: "  ",
            publication_date: "",
            assignee: "Acme",
            publication_number: "US8900904B2",
            legal_events: &[],
            status: "Active",
        };
        assert_eq!(synthetic_events(&inputs), vec![TimelineEvent::status("Active")]);
    }

    #[test]
    fn test_legal_event_title() {
        assert_eq!(legal_event_title("AS", ""), "Assigned to Unknown Assignee");
        assert_eq!(legal_event_title(" STCF ", "Acme"), "Application granted");
        assert_eq!(legal_event_title("Lapsed", "Acme"), "Lapsed");
    }

    #[test]
    fn test_post_process_orders_and_dedupes() {
        let events = vec![
            TimelineEvent::status("Active"),
            event("2014-12-02", "Granted"),
            event("sometime", "Undated"),
            event("2011-03-08", "Filed"),
            event("2014-12-02", "Granted"),
            TimelineEvent::status("Expired"),
            event("2011-03-08", "Also filed"),
        ];

        let processed = post_process(events);
        assert_eq!(
            processed,
            vec![
                event("2011-03-08", "Filed"),
                event("2011-03-08", "Also filed"),
                event("2014-12-02", "Granted"),
                event("sometime", "Undated"),
                TimelineEvent::status("Active"),
            ]
        );
    }

    #[test]
    fn test_reconcile_prefers_widget() {
        let page = widget_page(&widget_event(r#"<div class="filed">2011-03-08</div>"#, "Filed"));
        let inputs = SyntheticInputs {
            filing_date: "2000-01-01",
            publication_date: "",
            assignee: "",
            publication_number: "",
            legal_events: &[],
            status: "Active",
        };

        let (mode, events) = reconcile(&page, &inputs);
        assert_eq!(mode, TimelineMode::Widget);
        assert_eq!(events, vec![event("2011-03-08", "Filed")]);
    }

    #[test]
    fn test_reconcile_falls_back_to_synthetic() {
        let page = widget_page("");
        let inputs = SyntheticInputs {
            filing_date: "2011-03-08",
            publication_date: "",
            assignee: "Acme",
            publication_number: "",
            legal_events: &[],
            status: "Active",
        };

        let (mode, events) = reconcile(&page, &inputs);
        assert_eq!(mode, TimelineMode::Synthetic);
        assert_eq!(events.last().map(|e| e.date.as_str()), Some(STATUS_SENTINEL));
    }
}
