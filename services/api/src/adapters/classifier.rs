//! services/api/src/adapters/classifier.rs
//!
//! Adapter for the external model service that classifies legal documents and
//! simplifies jargon. It implements the `ClassificationService` port.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};
use vedu_core::domain::{
    ClassificationResult, ComplexityAnalysis, ImportantDate, JargonAnalysis, JargonInfo,
    JargonResult, ModelServiceHealth,
};
use vedu_core::ports::{ClassificationService, PortError, PortResult};

const CLASSIFY_TIMEOUT: Duration = Duration::from_secs(30);
const SIMPLIFY_TIMEOUT: Duration = Duration::from_secs(15);
const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

//=========================================================================================
// Upstream Payloads (snake_case, as sent by the model service)
//=========================================================================================

#[derive(Deserialize)]
struct FailureBody {
    error: Option<String>,
}

#[derive(Deserialize)]
struct UpstreamJargonInfo {
    #[serde(default)]
    meaning: String,
    #[serde(default)]
    occurrences: u32,
    original_term: Option<String>,
}

#[derive(Deserialize)]
struct UpstreamComplexity {
    #[serde(default)]
    complexity: String,
    #[serde(default)]
    score: f64,
    #[serde(default, rename = "jargonCount")]
    jargon_count: u32,
    #[serde(default, rename = "totalWords")]
    total_words: u32,
}

#[derive(Deserialize)]
struct UpstreamDate {
    #[serde(rename = "type", default)]
    kind: String,
    date: String,
}

#[derive(Deserialize)]
struct UpstreamJargonAnalysis {
    #[serde(default)]
    jargons_found: HashMap<String, UpstreamJargonInfo>,
    #[serde(default)]
    simplified_text: String,
    total_jargons: Option<u32>,
    #[serde(default)]
    jargon_summary: String,
    complexity_analysis: Option<UpstreamComplexity>,
}

#[derive(Deserialize)]
struct ClassifyResponse {
    success: bool,
    error: Option<String>,
    classification: Option<String>,
    confidence: Option<f64>,
    #[serde(default)]
    key_terms: Vec<String>,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    important_dates: Vec<UpstreamDate>,
    #[serde(default)]
    parties_involved: Vec<String>,
    jargon_analysis: Option<UpstreamJargonAnalysis>,
}

#[derive(Deserialize)]
struct SimplifyResponse {
    success: bool,
    error: Option<String>,
    #[serde(default)]
    original_text: String,
    #[serde(default)]
    simplified_text: String,
    #[serde(default)]
    jargons_found: HashMap<String, UpstreamJargonInfo>,
    total_jargons: Option<u32>,
    complexity_analysis: Option<UpstreamComplexity>,
    #[serde(default)]
    jargon_summary: String,
}

#[derive(Deserialize)]
struct HealthResponse {
    status: String,
    #[serde(default)]
    model_status: String,
}

//=========================================================================================
// Mapping into domain records
//=========================================================================================

fn map_jargons(raw: HashMap<String, UpstreamJargonInfo>) -> BTreeMap<String, JargonInfo> {
    raw.into_iter()
        .map(|(term, info)| {
            let original_term = info.original_term.unwrap_or_else(|| term.clone());
            (
                term,
                JargonInfo {
                    meaning: info.meaning,
                    occurrences: info.occurrences,
                    original_term,
                },
            )
        })
        .collect()
}

fn map_complexity(raw: Option<UpstreamComplexity>) -> ComplexityAnalysis {
    match raw {
        Some(c) => ComplexityAnalysis {
            complexity: c.complexity,
            score: c.score,
            jargon_count: c.jargon_count,
            total_words: c.total_words,
        },
        None => ComplexityAnalysis::default(),
    }
}

fn map_jargon_analysis(raw: UpstreamJargonAnalysis) -> JargonAnalysis {
    let jargons_found = map_jargons(raw.jargons_found);
    JargonAnalysis {
        total_jargons: raw.total_jargons.unwrap_or(jargons_found.len() as u32),
        jargons_found,
        simplified_text: raw.simplified_text,
        jargon_summary: raw.jargon_summary,
        complexity_analysis: map_complexity(raw.complexity_analysis),
    }
}

fn map_classification(raw: ClassifyResponse) -> PortResult<ClassificationResult> {
    if !raw.success {
        return Err(PortError::Classification(
            raw.error.unwrap_or_else(|| "Classification failed".to_string()),
        ));
    }
    let classification = raw.classification.ok_or_else(|| {
        PortError::Unexpected("Model API response is missing a classification".to_string())
    })?;
    Ok(ClassificationResult {
        classification,
        confidence: raw.confidence.unwrap_or(0.0),
        key_terms: raw.key_terms,
        summary: raw.summary,
        important_dates: raw
            .important_dates
            .into_iter()
            .map(|d| ImportantDate {
                kind: d.kind,
                date: d.date,
            })
            .collect(),
        parties_involved: raw.parties_involved,
        jargon_analysis: raw.jargon_analysis.map(map_jargon_analysis),
    })
}

fn map_simplification(raw: SimplifyResponse) -> PortResult<JargonResult> {
    if !raw.success {
        return Err(PortError::Classification(
            raw.error.unwrap_or_else(|| "Jargon simplification failed".to_string()),
        ));
    }
    let jargons_found = map_jargons(raw.jargons_found);
    Ok(JargonResult {
        original_text: raw.original_text,
        simplified_text: raw.simplified_text,
        total_jargons: raw.total_jargons.unwrap_or(jargons_found.len() as u32),
        jargons_found,
        complexity_analysis: map_complexity(raw.complexity_analysis),
        jargon_summary: raw.jargon_summary,
    })
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `ClassificationService` port over HTTP.
#[derive(Clone)]
pub struct ModelApiAdapter {
    client: reqwest::Client,
    base_url: String,
}

impl ModelApiAdapter {
    /// Creates a new `ModelApiAdapter` talking to `base_url`.
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Sends a request and decodes the body, mapping transport failures and
    /// upstream error statuses into port errors.
    async fn send<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> PortResult<T> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<FailureBody>(&body)
                .ok()
                .and_then(|b| b.error)
                .unwrap_or_else(|| format!("Model API returned status {}", status));
            warn!("Model API error ({}): {}", status, message);
            return Err(PortError::Classification(message));
        }

        response.json::<T>().await.map_err(|e| {
            PortError::Unexpected(format!("Failed to decode model API response: {}", e))
        })
    }
}

fn transport_error(e: reqwest::Error) -> PortError {
    if e.is_connect() {
        PortError::ServiceUnavailable(e.to_string())
    } else if e.is_timeout() {
        PortError::Unexpected(format!("Model API request timed out: {}", e))
    } else {
        PortError::Unexpected(e.to_string())
    }
}

//=========================================================================================
// `ClassificationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl ClassificationService for ModelApiAdapter {
    async fn classify(
        &self,
        file_bytes: Vec<u8>,
        file_name: &str,
        mime_type: &str,
    ) -> PortResult<ClassificationResult> {
        debug!("Sending {} ({} bytes) for classification", file_name, file_bytes.len());
        let part = Part::bytes(file_bytes)
            .file_name(file_name.to_string())
            .mime_str(mime_type)
            .map_err(|e| PortError::Unexpected(format!("Invalid mime type: {}", e)))?;
        let form = Form::new().part("file", part);

        let request = self
            .client
            .post(self.url("/classify"))
            .multipart(form)
            .timeout(CLASSIFY_TIMEOUT);
        let raw: ClassifyResponse = self.send(request).await?;
        map_classification(raw)
    }

    async fn simplify_jargon(&self, text: &str) -> PortResult<JargonResult> {
        let request = self
            .client
            .post(self.url("/simplify-jargons"))
            .json(&serde_json::json!({ "text": text }))
            .timeout(SIMPLIFY_TIMEOUT);
        let raw: SimplifyResponse = self.send(request).await?;
        map_simplification(raw)
    }

    async fn health(&self) -> PortResult<ModelServiceHealth> {
        let request = self.client.get(self.url("/health")).timeout(HEALTH_TIMEOUT);
        let raw: HealthResponse = self.send(request).await?;
        Ok(ModelServiceHealth {
            status: raw.status,
            model_status: raw.model_status,
        })
    }
}
