use serde::{Deserialize, Serialize};

pub type DocId = u32;

/// A collection document. Only `title` and `content` take part in ranking;
/// the remaining fields are carried through for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    /// Where the text came from, e.g. the PDF file name it was extracted from.
    #[serde(default)]
    pub source: Option<String>,
}

impl Document {
    pub fn new(id: DocId, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            content: content.into(),
            author: None,
            date: None,
            category: None,
            source: None,
        }
    }
}

/// Anything that can hand the engine a batch of ingested documents
/// (JSON exports, PDF folders, test stubs).
pub trait DocumentSource {
    fn load_documents(&self) -> crate::Result<Vec<Document>>;
}

impl DocumentSource for Vec<Document> {
    fn load_documents(&self) -> crate::Result<Vec<Document>> {
        Ok(self.clone())
    }
}
