use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

/// One council session as published in a session archive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Assigned by the caller; the archive itself carries no identifier.
    #[serde(default)]
    pub id: String,
    pub short_name: String,
    pub name: String,
    pub organization: Vec<String>,
    pub start: DateTime<FixedOffset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<FixedOffset>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locality: Option<String>,
    pub agenda_item: Vec<AgendaItem>,
    pub documents: Vec<Document>,
    pub downloaded_at: DateTime<Utc>,
}

impl Session {
    /// Every document of the session: top-level ones first, then those
    /// attached to agenda items in agenda order.
    pub fn all_documents(&self) -> impl Iterator<Item = &Document> {
        self.documents
            .iter()
            .chain(self.agenda_item.iter().flat_map(|item| item.documents.iter()))
    }

    /// Mutable counterpart of [`Session::all_documents`]. Each document is
    /// yielded exactly once, so the references can be handed to separate workers.
    pub fn all_documents_mut(&mut self) -> impl Iterator<Item = &mut Document> {
        self.documents.iter_mut().chain(
            self.agenda_item
                .iter_mut()
                .flat_map(|item| item.documents.iter_mut()),
        )
    }
}

/// A single agenda item ("Part") of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgendaItem {
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    #[serde(default)]
    pub documents: Vec<Document>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vote_result: Option<VoteResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Path relative to the session directory after extraction.
    pub file_name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<PdfMetadata>,
}

impl Document {
    pub fn new(file_name: impl Into<String>, description: impl Into<String>) -> Self {
        Document {
            file_name: file_name.into(),
            description: description.into(),
            metadata: None,
        }
    }

    pub fn is_pdf(&self) -> bool {
        self.file_name.to_ascii_lowercase().ends_with(".pdf")
    }
}

/// The subset of text-extractor metadata kept per PDF.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PdfMetadata {
    pub content_length: Option<String>,
    pub content_type: Option<String>,
    pub creation_date: Option<String>,
    pub last_modified: Option<String>,
    pub author: Option<String>,
}

/// Vote tally of an agenda item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteResult {
    pub pro: u32,
    pub contra: u32,
    pub abstention: u32,
    pub prejudiced: u32,
}

// ── Tests ──
