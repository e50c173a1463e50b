//! Tabular relation extraction
//!
//! A [`RowSpec`] selects repeated row elements and describes each column as
//! its own fallback chain of [`Cell`] accessors. Every matched row yields a
//! [`Row`], even when no column produced a value.

use crate::document::{element_text, first_text_within, PageDocument};
use patentlens_domain::{Citation, Classification, FamilyMember, LegalEvent, SimilarDocument};
use scraper::ElementRef;

/// How one column value is read from a row element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    /// Text of the first non-empty descendant matching the selector
    Text(&'static str),
    /// Segment `index` of the row's own text split on `separator`
    SplitPart {
        /// Separator between segments
        separator: &'static str,
        /// Zero-based segment index
        index: usize,
    },
    /// Segments from `from` onwards of the row's own text, rejoined
    SplitRest {
        /// Separator between segments
        separator: &'static str,
        /// Zero-based index of the first kept segment
        from: usize,
    },
    /// The row's whole text
    RowText,
}

impl Cell {
    fn read(&self, row: ElementRef<'_>) -> Option<String> {
        let value = match self {
            Cell::Text(css) => first_text_within(row, css),
            Cell::SplitPart { separator, index } => element_text(row)
                .split(*separator)
                .nth(*index)
                .map(|part| part.trim().to_string()),
            Cell::SplitRest { separator, from } => {
                let text = element_text(row);
                let parts: Vec<&str> = text.split(*separator).skip(*from).collect();
                (!parts.is_empty()).then(|| parts.join(*separator).trim().to_string())
            }
            Cell::RowText => Some(element_text(row)),
        };
        value.filter(|v| !v.is_empty())
    }
}

/// One column: a named fallback chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    /// Column name, for diagnostics
    pub name: &'static str,
    /// Cell accessors tried in order
    pub cells: &'static [Cell],
}

/// A repeated-row structure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowSpec {
    /// Selector matching one element per row
    pub rows: &'static str,
    /// Columns in output order
    pub columns: &'static [ColumnSpec],
}

/// Column values of one row, in [`RowSpec::columns`] order
///
/// Missing values are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row(pub Vec<String>);

impl Row {
    /// Value of column `index`, empty when out of range
    pub fn get(&self, index: usize) -> String {
        self.0.get(index).cloned().unwrap_or_default()
    }
}

/// Extract one [`Row`] per element matching `spec.rows`
pub fn extract_rows(doc: &PageDocument, spec: &RowSpec) -> Vec<Row> {
    doc.select(spec.rows)
        .into_iter()
        .map(|row| {
            Row(spec
                .columns
                .iter()
                .map(|column| {
                    column
                        .cells
                        .iter()
                        .find_map(|cell| cell.read(row))
                        .unwrap_or_default()
                })
                .collect())
        })
        .collect()
}

/// Row specs for every repeated structure of one provider
#[derive(Debug)]
pub struct TableSet {
    /// Backward citations: number, date, title, assignee
    pub citations: RowSpec,
    /// Forward citations: number, date, title, assignee
    pub cited_by: RowSpec,
    /// Classification codes: code, description
    pub classifications: RowSpec,
    /// Family members: number, date, country
    pub family: RowSpec,
    /// Similar documents: number, date, title
    pub similar_documents: RowSpec,
    /// Legal events: date, description
    pub legal_events: RowSpec,
}

impl TableSet {
    /// Backward citations
    pub fn citations(&self, doc: &PageDocument) -> Vec<Citation> {
        extract_rows(doc, &self.citations)
            .into_iter()
            .map(citation)
            .collect()
    }

    /// Forward citations
    pub fn cited_by(&self, doc: &PageDocument) -> Vec<Citation> {
        extract_rows(doc, &self.cited_by)
            .into_iter()
            .map(citation)
            .collect()
    }

    /// Classification codes
    pub fn classifications(&self, doc: &PageDocument) -> Vec<Classification> {
        extract_rows(doc, &self.classifications)
            .into_iter()
            .map(|row| Classification {
                code: row.get(0),
                description: row.get(1),
            })
            .collect()
    }

    /// Family members
    pub fn family(&self, doc: &PageDocument) -> Vec<FamilyMember> {
        extract_rows(doc, &self.family)
            .into_iter()
            .map(|row| FamilyMember {
                number: row.get(0),
                date: row.get(1),
                country: row.get(2),
            })
            .collect()
    }

    /// Similar documents
    pub fn similar_documents(&self, doc: &PageDocument) -> Vec<SimilarDocument> {
        extract_rows(doc, &self.similar_documents)
            .into_iter()
            .map(|row| SimilarDocument {
                number: row.get(0),
                date: row.get(1),
                title: row.get(2),
            })
            .collect()
    }

    /// Legal events
    pub fn legal_events(&self, doc: &PageDocument) -> Vec<LegalEvent> {
        extract_rows(doc, &self.legal_events)
            .into_iter()
            .map(|row| LegalEvent {
                date: row.get(0),
                description: row.get(1),
            })
            .collect()
    }
}

fn citation(row: Row) -> Citation {
    Citation {
        number: row.get(0),
        date: row.get(1),
        title: row.get(2),
        assignee: row.get(3),
    }
}

const GOOGLE_CITATION_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec {
        name: "number",
        cells: &[
            Cell::Text(r#"td[itemprop="publicationNumber"] a"#),
            Cell::Text(r#"td[itemprop="publicationNumber"]"#),
            Cell::Text("td:nth-child(1)"),
        ],
    },
    ColumnSpec {
        name: "date",
        cells: &[
            Cell::Text(r#"time[itemprop="publicationDate"]"#),
            Cell::Text(r#"td[itemprop="publicationDate"]"#),
            Cell::Text("td:nth-child(2)"),
        ],
    },
    ColumnSpec {
        name: "title",
        cells: &[
            Cell::Text(r#"td[itemprop="title"]"#),
            Cell::Text("td:nth-child(3)"),
        ],
    },
    ColumnSpec {
        name: "assignee",
        cells: &[
            Cell::Text(r#"td[itemprop="assignee"]"#),
            Cell::Text("td:nth-child(4)"),
        ],
    },
];

const ESPACENET_CITATION_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec {
        name: "number",
        cells: &[
            Cell::Text(r#"td[itemprop="publicationNumber"]"#),
            Cell::Text("td:nth-child(1)"),
        ],
    },
    ColumnSpec {
        name: "date",
        cells: &[
            Cell::Text(r#"time[itemprop="publicationDate"]"#),
            Cell::Text("td:nth-child(2)"),
        ],
    },
    ColumnSpec {
        name: "title",
        cells: &[
            Cell::Text(r#"td[itemprop="title"]"#),
            Cell::Text("td:nth-child(3)"),
        ],
    },
    ColumnSpec {
        name: "assignee",
        cells: &[
            Cell::Text(r#"td[itemprop="assignee"]"#),
            Cell::Text("td:nth-child(4)"),
        ],
    },
];

const NUMBER_DATE_TITLE_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec {
        name: "number",
        cells: &[
            Cell::Text(r#"td[itemprop="publicationNumber"]"#),
            Cell::Text("td:nth-child(1)"),
        ],
    },
    ColumnSpec {
        name: "date",
        cells: &[
            Cell::Text(r#"time[itemprop="publicationDate"]"#),
            Cell::Text(r#"td[itemprop="publicationDate"]"#),
            Cell::Text("td:nth-child(2)"),
        ],
    },
    ColumnSpec {
        name: "title",
        cells: &[
            Cell::Text(r#"td[itemprop="title"]"#),
            Cell::Text("td:nth-child(3)"),
        ],
    },
];

const FAMILY_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec {
        name: "number",
        cells: &[
            Cell::Text(r#"td[itemprop="publicationNumber"]"#),
            Cell::Text("td:nth-child(1)"),
        ],
    },
    ColumnSpec {
        name: "date",
        cells: &[
            Cell::Text(r#"time[itemprop="publicationDate"]"#),
            Cell::Text(r#"td[itemprop="publicationDate"]"#),
            Cell::Text("td:nth-child(2)"),
        ],
    },
    ColumnSpec {
        name: "country",
        cells: &[
            Cell::Text(r#"td[itemprop="country"]"#),
            Cell::Text("td:nth-child(3)"),
        ],
    },
];

const LEGAL_EVENT_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec {
        name: "date",
        cells: &[
            Cell::Text(r#"time[itemprop="date"]"#),
            Cell::Text(r#"td[itemprop="date"]"#),
            Cell::Text("td:nth-child(1)"),
        ],
    },
    ColumnSpec {
        name: "description",
        cells: &[
            Cell::Text(r#"td[itemprop="description"]"#),
            Cell::Text("td:nth-child(2)"),
        ],
    },
];

/// Repeated structures on Provider A pages
pub static GOOGLE_TABLES: TableSet = TableSet {
    citations: RowSpec {
        rows: r#"tr[itemprop="backwardReferences"]"#,
        columns: GOOGLE_CITATION_COLUMNS,
    },
    cited_by: RowSpec {
        rows: r#"tr[itemprop="forwardReferences"]"#,
        columns: GOOGLE_CITATION_COLUMNS,
    },
    classifications: RowSpec {
        rows: r#"span[itemprop="cpcs"]"#,
        columns: &[
            ColumnSpec {
                name: "code",
                cells: &[
                    Cell::Text(r#"span[itemprop="Code"]"#),
                    Cell::SplitPart {
                        separator: " - ",
                        index: 0,
                    },
                    Cell::Text("a"),
                ],
            },
            ColumnSpec {
                name: "description",
                cells: &[
                    Cell::Text(r#"span[itemprop="Description"]"#),
                    Cell::SplitRest {
                        separator: " - ",
                        from: 1,
                    },
                    Cell::Text("span.description"),
                ],
            },
        ],
    },
    family: RowSpec {
        rows: r#"tr[itemprop="family"]"#,
        columns: FAMILY_COLUMNS,
    },
    similar_documents: RowSpec {
        rows: r#"tr[itemprop="similarDocuments"]"#,
        columns: NUMBER_DATE_TITLE_COLUMNS,
    },
    legal_events: RowSpec {
        rows: r#"tr[itemprop="legalEvents"]"#,
        columns: LEGAL_EVENT_COLUMNS,
    },
};

/// Repeated structures on Provider B pages
pub static ESPACENET_TABLES: TableSet = TableSet {
    citations: RowSpec {
        rows: r#"tr[itemprop="backwardReferences"]"#,
        columns: ESPACENET_CITATION_COLUMNS,
    },
    cited_by: RowSpec {
        rows: r#"tr[itemprop="forwardReferences"]"#,
        columns: ESPACENET_CITATION_COLUMNS,
    },
    classifications: RowSpec {
        rows: r#"span[itemprop="ipc"], span[itemprop="cpc"]"#,
        columns: &[
            ColumnSpec {
                name: "code",
                cells: &[
                    Cell::Text(r#"span[itemprop="Code"]"#),
                    Cell::SplitPart {
                        separator: " - ",
                        index: 0,
                    },
                    Cell::RowText,
                ],
            },
            ColumnSpec {
                name: "description",
                cells: &[
                    Cell::Text(r#"span[itemprop="Description"]"#),
                    Cell::SplitRest {
                        separator: " - ",
                        from: 1,
                    },
                ],
            },
        ],
    },
    family: RowSpec {
        rows: r#"tr[itemprop="patentFamily"]"#,
        columns: FAMILY_COLUMNS,
    },
    similar_documents: RowSpec {
        rows: r#"tr[itemprop="similarDocuments"]"#,
        columns: NUMBER_DATE_TITLE_COLUMNS,
    },
    legal_events: RowSpec {
        rows: r#"tr[itemprop="legalEvents"]"#,
        columns: LEGAL_EVENT_COLUMNS,
    },
};
