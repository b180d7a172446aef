use axum::extract::{Multipart, Query};
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use agentflow_core::ActionEntry;
use agentflow_core::error::ApiError;

use crate::error::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/v1/agent/analyze", post(analyze_file))
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct AnalyzeParams {
    /// Run tabular anomaly detection when applicable (default true)
    #[serde(default = "enabled")]
    pub run_anomaly: bool,
    /// Run tabular dedup/standardization when applicable (default true)
    #[serde(default = "enabled")]
    pub run_dedup: bool,
}

fn enabled() -> bool {
    true
}

impl Default for AnalyzeParams {
    fn default() -> Self {
        Self {
            run_anomaly: true,
            run_dedup: true,
        }
    }
}

/// Multipart form accepted by POST /v1/agent/analyze (documentation only).
#[derive(utoipa::ToSchema)]
#[allow(dead_code)]
pub struct AnalyzeUpload {
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocumentRoute {
    Tabular,
    Document,
    Unknown,
}

impl DocumentRoute {
    fn from_extension(ext: &str) -> Self {
        match ext {
            "csv" | "xlsx" | "xls" => Self::Tabular,
            "pdf" | "docx" | "txt" => Self::Document,
            _ => Self::Unknown,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct DocumentType {
    /// tabular_data | document_text | unknown
    pub label: String,
    pub confidence: f64,
    pub reason: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct DetectedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub file_extension: Option<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AnomalyReport {
    pub enabled: bool,
    #[schema(value_type = Vec<Object>)]
    pub anomalies: Vec<serde_json::Value>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct DedupReport {
    pub enabled: bool,
    pub entity_column: Option<String>,
    #[schema(value_type = Vec<Object>)]
    pub clusters: Vec<serde_json::Value>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct TabularReports {
    pub anomaly_report: AnomalyReport,
    pub dedup_report: DedupReport,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct PolicyCheck {
    pub enabled: bool,
    pub key_points: Vec<String>,
    pub risks: Vec<String>,
    pub missing: Vec<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct DocumentReports {
    pub policy_check: PolicyCheck,
}

/// Response for POST /v1/agent/analyze. Same shape for every file type;
/// analyzers that do not apply are reported as disabled.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AnalyzeResponse {
    pub document_type: DocumentType,
    pub detected: DetectedFile,
    pub tabular_reports: TabularReports,
    pub document_reports: DocumentReports,
    pub summary: String,
    pub actions_taken: Vec<ActionEntry>,
}

/// Classify an uploaded file and report which analyzers apply
///
/// Classification is by file extension only. The file content is not read.
#[utoipa::path(
    post,
    path = "/v1/agent/analyze",
    params(AnalyzeParams),
    request_body(content = AnalyzeUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Classification report", body = AnalyzeResponse),
        (status = 422, description = "Missing file part or filename", body = ApiError)
    ),
    tag = "agent"
)]
pub async fn analyze_file(
    Query(params): Query<AnalyzeParams>,
    mut multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, AppError> {
    while let Some(field) = multipart.next_field().await.map_err(|e| AppError::Validation {
        message: format!("Invalid multipart body: {e}"),
        field: Some("file".to_string()),
        received: None,
        docs_hint: Some("Send multipart/form-data with a `file` part.".to_string()),
    })? {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().trim().to_string();
        if file_name.is_empty() {
            return Err(missing_file("Missing filename on upload."));
        }
        let content_type = field.content_type().map(str::to_string);

        tracing::info!(file_name = %file_name, "Classifying uploaded file");
        return Ok(Json(classify_upload(
            &file_name,
            content_type.as_deref(),
            &params,
        )));
    }

    Err(missing_file("Missing `file` part in upload."))
}

fn missing_file(message: &str) -> AppError {
    AppError::Validation {
        message: message.to_string(),
        field: Some("file".to_string()),
        received: None,
        docs_hint: Some(
            "Upload the file as a multipart `file` part with a filename.".to_string(),
        ),
    }
}

fn file_extension(file_name: &str) -> String {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default()
}

fn classify_upload(
    file_name: &str,
    content_type: Option<&str>,
    params: &AnalyzeParams,
) -> AnalyzeResponse {
    let ext = file_extension(file_name);
    let route = DocumentRoute::from_extension(&ext);

    let (label, confidence, reason, summary) = match route {
        DocumentRoute::Tabular => (
            "tabular_data",
            0.95,
            format!("File extension .{ext} indicates tabular data."),
            "Detected tabular data; ready to run anomaly + dedup analyzers.",
        ),
        DocumentRoute::Document => (
            "document_text",
            0.85,
            format!("File extension .{ext} indicates a text document."),
            "Detected document text; ready to run key points / risk checklist analyzer.",
        ),
        DocumentRoute::Unknown => (
            "unknown",
            0.4,
            "File extension not recognized; treating as unknown.".to_string(),
            "Could not confidently classify file; no analyzers run.",
        ),
    };

    let tabular = route == DocumentRoute::Tabular;
    let content_type = content_type
        .map(|ct| ct.trim().to_lowercase())
        .filter(|ct| !ct.is_empty());

    AnalyzeResponse {
        document_type: DocumentType {
            label: label.to_string(),
            confidence,
            reason,
        },
        detected: DetectedFile {
            file_name: file_name.to_string(),
            content_type,
            file_extension: (!ext.is_empty()).then_some(ext),
        },
        tabular_reports: TabularReports {
            anomaly_report: AnomalyReport {
                enabled: tabular && params.run_anomaly,
                anomalies: Vec::new(),
            },
            dedup_report: DedupReport {
                enabled: tabular && params.run_dedup,
                entity_column: None,
                clusters: Vec::new(),
            },
        },
        document_reports: DocumentReports {
            policy_check: PolicyCheck {
                enabled: route == DocumentRoute::Document,
                key_points: Vec::new(),
                risks: Vec::new(),
                missing: Vec::new(),
            },
        },
        summary: summary.to_string(),
        actions_taken: vec![
            ActionEntry::event("classified_document_type").with_detail("label", label),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    #[test]
    fn spreadsheet_is_tabular() {
        let report = classify_upload("Sales.XLSX", Some("Application/Vnd.Ms-Excel"), &AnalyzeParams::default());
        assert_eq!(report.document_type.label, "tabular_data");
        assert_eq!(report.document_type.confidence, 0.95);
        assert_eq!(report.detected.file_extension.as_deref(), Some("xlsx"));
        assert_eq!(report.detected.content_type.as_deref(), Some("application/vnd.ms-excel"));
        assert!(report.tabular_reports.anomaly_report.enabled);
        assert!(report.tabular_reports.dedup_report.enabled);
        assert!(!report.document_reports.policy_check.enabled);
    }

    #[test]
    fn tabular_flags_follow_params() {
        let params = AnalyzeParams {
            run_anomaly: false,
            run_dedup: true,
        };
        let report = classify_upload("data.csv", None, &params);
        assert!(!report.tabular_reports.anomaly_report.enabled);
        assert!(report.tabular_reports.dedup_report.enabled);
    }

    #[test]
    fn text_documents_enable_policy_check_only() {
        let report = classify_upload("policy.pdf", None, &AnalyzeParams::default());
        assert_eq!(report.document_type.label, "document_text");
        assert!(report.document_reports.policy_check.enabled);
        assert!(!report.tabular_reports.anomaly_report.enabled);
    }

    #[test]
    fn unknown_extension_and_no_extension() {
        let report = classify_upload("image.png", None, &AnalyzeParams::default());
        assert_eq!(report.document_type.label, "unknown");
        assert_eq!(report.document_type.confidence, 0.4);

        let report = classify_upload("README", Some(""), &AnalyzeParams::default());
        assert_eq!(report.detected.file_extension, None);
        assert_eq!(report.detected.content_type, None);
        assert_eq!(
            report.summary,
            "Could not confidently classify file; no analyzers run."
        );
    }

    #[test]
    fn records_classification_action() {
        let report = classify_upload("a.txt", None, &AnalyzeParams::default());
        assert_eq!(report.actions_taken.len(), 1);
        assert_eq!(report.actions_taken[0].label(), "event:classified_document_type");
        assert_eq!(report.actions_taken[0].details["label"], "document_text");
    }

    fn multipart_body(boundary: &str, file_name: Option<&str>) -> String {
        let disposition = match file_name {
            Some(name) => format!("form-data; name=\"file\"; filename=\"{name}\""),
            None => "form-data; name=\"note\"".to_string(),
        };
        format!(
            "--{boundary}\r\nContent-Disposition: {disposition}\r\nContent-Type: text/csv\r\n\r\na,b\r\n1,2\r\n--{boundary}--\r\n"
        )
    }

    async fn upload(query: &str, file_name: Option<&str>) -> (StatusCode, Value) {
        let boundary = "agentflow-boundary";
        let app = super::router().with_state(crate::state::AppState::for_tests(
            agentflow_core::DecisionRouter::new(
                std::sync::Arc::new(agentflow_core::fixtures::ToolFixtures::sample()),
                std::sync::Arc::new(agentflow_core::fixtures::ToolFixtures::sample()),
            ),
        ));
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(format!("/v1/agent/analyze{query}"))
                    .header(
                        "content-type",
                        format!("multipart/form-data; boundary={boundary}"),
                    )
                    .body(Body::from(multipart_body(boundary, file_name)))
                    .expect("request should build"),
            )
            .await
            .expect("request should succeed");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn upload_is_classified() {
        let (status, body) = upload("?run_dedup=false", Some("ledger.csv")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["document_type"]["label"], "tabular_data");
        assert_eq!(body["detected"]["content_type"], "text/csv");
        assert_eq!(body["tabular_reports"]["anomaly_report"]["enabled"], true);
        assert_eq!(body["tabular_reports"]["dedup_report"]["enabled"], false);
    }

    #[tokio::test]
    async fn upload_without_file_part_is_rejected() {
        let (status, body) = upload("", None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["field"], "file");
    }
}
