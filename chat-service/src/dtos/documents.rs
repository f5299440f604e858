use crate::services::gateways::IndexedDocument;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct DocumentMetadata {
    pub file_type: Option<String>,
    pub size: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct DocumentSummary {
    pub document_id: String,
    pub created: Option<String>,
    pub metadata: DocumentMetadata,
}

impl From<IndexedDocument> for DocumentSummary {
    fn from(doc: IndexedDocument) -> Self {
        DocumentSummary {
            document_id: doc.document_id,
            created: doc.created,
            metadata: DocumentMetadata {
                file_type: doc.file_type,
                size: doc.size,
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DocumentListResponse {
    pub documents: Vec<DocumentSummary>,
    pub count: usize,
    pub timestamp: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DocumentsErrorResponse {
    pub error: String,
    pub documents: Vec<DocumentSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn summary_nests_metadata() {
        let summary = DocumentSummary::from(IndexedDocument {
            document_id: "d1".to_string(),
            created: Some("2024-05-01T10:00:00Z".to_string()),
            file_type: Some("pdf".to_string()),
            size: Some(2048),
        });

        assert_eq!(
            serde_json::to_value(summary).unwrap(),
            json!({
                "document_id": "d1",
                "created": "2024-05-01T10:00:00Z",
                "metadata": {"file_type": "pdf", "size": 2048}
            })
        );
    }
}
