//! crates/vedu_core/src/domain.rs
//!
//! Defines the core data structures for the application.
//! These structs are independent of any database; they carry serde derives
//! because the analysis payload is stored and served as JSON.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

//=========================================================================================
// Users
//=========================================================================================

/// Represents a user - used throughout app. Never carries the password hash.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

// Only used internally for login - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
}

/// Input for creating a user; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
}

//=========================================================================================
// Documents
//=========================================================================================

/// Processing state of an uploaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Uploaded,
    Processing,
    Analyzed,
    Error,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Uploaded => "uploaded",
            DocumentStatus::Processing => "processing",
            DocumentStatus::Analyzed => "analyzed",
            DocumentStatus::Error => "error",
        }
    }

    /// Terminal states never move again, except that an analyzed result which
    /// could not be persisted is downgraded to `Error`.
    pub fn can_transition_to(&self, next: DocumentStatus) -> bool {
        use DocumentStatus::*;
        matches!(
            (self, next),
            (Uploaded, Processing)
                | (Uploaded, Error)
                | (Processing, Analyzed)
                | (Processing, Error)
                | (Analyzed, Error)
        )
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uploaded" => Ok(DocumentStatus::Uploaded),
            "processing" => Ok(DocumentStatus::Processing),
            "analyzed" => Ok(DocumentStatus::Analyzed),
            "error" => Ok(DocumentStatus::Error),
            other => Err(format!("unknown document status '{}'", other)),
        }
    }
}

/// A date found in a document by the classification service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ImportantDate {
    #[serde(rename = "type")]
    pub kind: String,
    pub date: String,
}

/// Plain-language information about one jargon term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JargonInfo {
    pub meaning: String,
    pub occurrences: u32,
    pub original_term: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComplexityAnalysis {
    pub complexity: String,
    pub score: f64,
    pub jargon_count: u32,
    pub total_words: u32,
}

impl Default for ComplexityAnalysis {
    fn default() -> Self {
        Self {
            complexity: "Unknown".to_string(),
            score: 0.0,
            jargon_count: 0,
            total_words: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JargonAnalysis {
    pub jargons_found: BTreeMap<String, JargonInfo>,
    pub simplified_text: String,
    pub total_jargons: u32,
    pub jargon_summary: String,
    pub complexity_analysis: ComplexityAnalysis,
}

/// The analysis produced by the classification service for one document.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResult {
    pub classification: String,
    pub confidence: f64,
    pub key_terms: Vec<String>,
    pub summary: String,
    pub important_dates: Vec<ImportantDate>,
    pub parties_involved: Vec<String>,
    pub jargon_analysis: Option<JargonAnalysis>,
}

/// Input for creating a document record.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub user_id: Uuid,
    pub file_name: String,
    pub status: DocumentStatus,
}

/// An uploaded document and, once analyzed, its analysis.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: Uuid,
    pub user_id: Uuid,
    pub file_name: String,
    pub upload_date: DateTime<Utc>,
    pub status: DocumentStatus,
    pub classification: Option<String>,
    pub confidence: Option<f64>,
    pub key_terms: Vec<String>,
    pub summary: String,
    pub important_dates: Vec<ImportantDate>,
    pub parties_involved: Vec<String>,
    pub jargon_analysis: Option<JargonAnalysis>,
}

impl Document {
    /// Builds a fresh record with empty analysis fields.
    pub fn new(id: Uuid, new: NewDocument, upload_date: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id: new.user_id,
            file_name: new.file_name,
            upload_date,
            status: new.status,
            classification: None,
            confidence: None,
            key_terms: Vec::new(),
            summary: String::new(),
            important_dates: Vec::new(),
            parties_involved: Vec::new(),
            jargon_analysis: None,
        }
    }

    /// Copies a classification result onto the document and marks it analyzed.
    /// Returns `false` (and leaves the record untouched) if the current status
    /// does not allow it.
    pub fn mark_analyzed(&mut self, result: ClassificationResult) -> bool {
        if !self.status.can_transition_to(DocumentStatus::Analyzed) {
            return false;
        }
        self.classification = Some(result.classification);
        self.confidence = Some(result.confidence);
        self.key_terms = result.key_terms;
        self.summary = result.summary;
        self.important_dates = result.important_dates;
        self.parties_involved = result.parties_involved;
        self.jargon_analysis = result.jargon_analysis;
        self.status = DocumentStatus::Analyzed;
        true
    }

    pub fn mark_failed(&mut self) -> bool {
        if !self.status.can_transition_to(DocumentStatus::Error) {
            return false;
        }
        self.status = DocumentStatus::Error;
        true
    }
}

//=========================================================================================
// Standalone jargon simplification
//=========================================================================================

/// Result of simplifying a piece of free text.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JargonResult {
    pub original_text: String,
    pub simplified_text: String,
    pub jargons_found: BTreeMap<String, JargonInfo>,
    pub total_jargons: u32,
    pub complexity_analysis: ComplexityAnalysis,
    pub jargon_summary: String,
}

/// Health as reported by the classification service itself.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ModelServiceHealth {
    pub status: String,
    pub model_status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn processing_document() -> Document {
        Document::new(
            Uuid::new_v4(),
            NewDocument {
                user_id: Uuid::new_v4(),
                file_name: "nda.pdf".to_string(),
                status: DocumentStatus::Processing,
            },
            Utc::now(),
        )
    }

    fn nda_result() -> ClassificationResult {
        let mut jargons = BTreeMap::new();
        jargons.insert(
            "indemnify".to_string(),
            JargonInfo {
                meaning: "compensate for harm".to_string(),
                occurrences: 2,
                original_term: "indemnify".to_string(),
            },
        );
        ClassificationResult {
            classification: "NDA".to_string(),
            confidence: 0.92,
            key_terms: vec!["Confidentiality".to_string()],
            summary: "An NDA.".to_string(),
            important_dates: vec![ImportantDate {
                kind: "General".to_string(),
                date: "1 January 2024".to_string(),
            }],
            parties_involved: vec!["Party A".to_string()],
            jargon_analysis: Some(JargonAnalysis {
                jargons_found: jargons,
                simplified_text: "text".to_string(),
                total_jargons: 1,
                jargon_summary: "one term".to_string(),
                complexity_analysis: ComplexityAnalysis::default(),
            }),
        }
    }

    #[test]
    fn test_new_document_has_empty_analysis() {
        let doc = processing_document();
        assert_eq!(doc.status, DocumentStatus::Processing);
        assert!(doc.classification.is_none());
        assert!(doc.key_terms.is_empty());
        assert!(doc.jargon_analysis.is_none());
    }

    #[test]
    fn test_mark_analyzed_populates_fields() {
        let mut doc = processing_document();
        assert!(doc.mark_analyzed(nda_result()));
        assert_eq!(doc.status, DocumentStatus::Analyzed);
        assert_eq!(doc.classification.as_deref(), Some("NDA"));
        assert_eq!(doc.confidence, Some(0.92));
        assert_eq!(doc.parties_involved, vec!["Party A".to_string()]);
        assert_eq!(doc.jargon_analysis.unwrap().total_jargons, 1);
    }

    #[test]
    fn test_failed_document_cannot_become_analyzed() {
        let mut doc = processing_document();
        assert!(doc.mark_failed());
        assert!(!doc.mark_analyzed(nda_result()));
        assert_eq!(doc.status, DocumentStatus::Error);
        assert!(doc.classification.is_none());
    }

    #[test]
    fn test_status_never_moves_back_to_processing() {
        for status in [
            DocumentStatus::Processing,
            DocumentStatus::Analyzed,
            DocumentStatus::Error,
        ] {
            assert!(!status.can_transition_to(DocumentStatus::Processing));
            assert!(!status.can_transition_to(DocumentStatus::Uploaded));
        }
    }

    #[test]
    fn test_status_string_round_trip() {
        for status in [
            DocumentStatus::Uploaded,
            DocumentStatus::Processing,
            DocumentStatus::Analyzed,
            DocumentStatus::Error,
        ] {
            assert_eq!(status.as_str().parse::<DocumentStatus>().unwrap(), status);
        }
        assert!("done".parse::<DocumentStatus>().is_err());
    }

    #[test]
    fn test_document_serializes_camel_case() {
        let mut doc = processing_document();
        doc.mark_analyzed(nda_result());
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["status"], "analyzed");
        assert_eq!(json["fileName"], "nda.pdf");
        assert_eq!(json["importantDates"][0]["type"], "General");
        assert_eq!(
            json["jargonAnalysis"]["jargonsFound"]["indemnify"]["originalTerm"],
            "indemnify"
        );
        assert_eq!(
            json["jargonAnalysis"]["complexityAnalysis"]["complexity"],
            "Unknown"
        );
    }
}
