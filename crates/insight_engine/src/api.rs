use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use insight_core::{Flow, GeneratedReport, PlotRequest, UploadRequest};
use insight_logging::insight_debug;
use serde_json::json;
use url::Url;

use crate::error::map_reqwest_error;
use crate::types::{
    ChatReply, ColumnsPayload, ProcessStarted, ProcessingStatus, ReportPayload, ReportStatus,
    UploadAck, VisualizationStatus, VisualizeAck,
};
use crate::{ApiError, Envelope};

/// Backend routes. Flow-specific routes carry the `_insight` suffix in the
/// insights flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Upload(Flow),
    ProcessData(Flow),
    CheckProcessing(Flow),
    CheckReport,
    GenerateReport,
    ChatQuery,
    Columns(Flow),
    Visualize,
    CheckVisualization(PlotRequest),
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Upload(Flow::Insights) => "/api/upload_insight",
            Endpoint::Upload(Flow::Visualize) => "/api/upload",
            Endpoint::ProcessData(Flow::Insights) => "/api/process_data_insight",
            Endpoint::ProcessData(Flow::Visualize) => "/api/process_data",
            Endpoint::CheckProcessing(Flow::Insights) => "/api/check_processing_insight",
            Endpoint::CheckProcessing(Flow::Visualize) => "/api/check_processing",
            Endpoint::CheckReport => "/api/check_report_insight",
            Endpoint::GenerateReport => "/api/generate_report",
            Endpoint::ChatQuery => "/api/chat_query",
            Endpoint::Columns(Flow::Insights) => "/api/get_columns_insight",
            Endpoint::Columns(Flow::Visualize) => "/api/get_columns",
            Endpoint::Visualize => "/api/visualize",
            Endpoint::CheckVisualization(_) => "/api/check_visualization",
        }
    }

    pub fn query(&self) -> Vec<(&'static str, String)> {
        match self {
            Endpoint::CheckVisualization(request) => vec![
                ("plot_type", request.plot_type.wire_name().to_string()),
                ("x_axis", request.x_axis.clone()),
                ("y_axis", request.y_axis.clone()),
            ],
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub field: String,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// A multipart body described as plain data so fake backends can inspect it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormPayload {
    pub fields: Vec<(String, String)>,
    pub file: Option<FilePart>,
}

impl FormPayload {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Transport seam: everything above it works on decoded envelopes.
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    async fn get(&self, endpoint: &Endpoint) -> Result<Envelope, ApiError>;

    async fn post_form(&self, endpoint: &Endpoint, form: FormPayload)
        -> Result<Envelope, ApiError>;

    async fn post_json(
        &self,
        endpoint: &Endpoint,
        body: serde_json::Value,
    ) -> Result<Envelope, ApiError>;
}

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: Url,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_response_bytes: u64,
}

impl ClientSettings {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            connect_timeout: Duration::from_secs(10),
            // Processing triggers block server-side until the first artifact exists.
            request_timeout: Duration::from_secs(120),
            max_response_bytes: 32 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReqwestBackend {
    settings: ClientSettings,
    client: reqwest::Client,
}

impl ReqwestBackend {
    pub fn new(settings: ClientSettings) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ApiError::Network(err.to_string()))?;
        Ok(Self { settings, client })
    }

    fn url(&self, endpoint: &Endpoint) -> Result<Url, ApiError> {
        let mut url = self
            .settings
            .base_url
            .join(endpoint.path())
            .map_err(|err| ApiError::InvalidUrl(err.to_string()))?;
        let query = endpoint.query();
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    /// Reads the body with a size cap and decodes it. A body that is not an
    /// envelope is reported as an HTTP status error when the status was not 2xx.
    async fn read_envelope(&self, response: reqwest::Response) -> Result<Envelope, ApiError> {
        let status = response.status();
        let max_bytes = self.settings.max_response_bytes;
        if response
            .content_length()
            .is_some_and(|len| len > max_bytes)
        {
            return Err(ApiError::TooLarge { max_bytes });
        }

        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            if body.len() as u64 + chunk.len() as u64 > max_bytes {
                return Err(ApiError::TooLarge { max_bytes });
            }
            body.extend_from_slice(&chunk);
        }

        Envelope::parse(&body).map_err(|err| {
            if status.is_success() {
                err
            } else {
                ApiError::HttpStatus(status.as_u16())
            }
        })
    }
}

#[async_trait::async_trait]
impl Backend for ReqwestBackend {
    async fn get(&self, endpoint: &Endpoint) -> Result<Envelope, ApiError> {
        let url = self.url(endpoint)?;
        insight_debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        self.read_envelope(response).await
    }

    async fn post_form(
        &self,
        endpoint: &Endpoint,
        form: FormPayload,
    ) -> Result<Envelope, ApiError> {
        let url = self.url(endpoint)?;
        insight_debug!("POST multipart {} fields={}", url, form.fields.len());
        let mut multipart = reqwest::multipart::Form::new();
        for (key, value) in form.fields {
            multipart = multipart.text(key, value);
        }
        if let Some(file) = form.file {
            let part = reqwest::multipart::Part::bytes(file.bytes)
                .file_name(file.file_name)
                .mime_str(&file.content_type)
                .map_err(|err| ApiError::Decode(err.to_string()))?;
            multipart = multipart.part(file.field, part);
        }
        let response = self
            .client
            .post(url)
            .multipart(multipart)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        self.read_envelope(response).await
    }

    async fn post_json(
        &self,
        endpoint: &Endpoint,
        body: serde_json::Value,
    ) -> Result<Envelope, ApiError> {
        let url = self.url(endpoint)?;
        insight_debug!("POST json {}", url);
        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        self.read_envelope(response).await
    }
}

/// Typed operations over a [`Backend`].
#[derive(Clone)]
pub struct ApiClient {
    backend: Arc<dyn Backend>,
}

impl ApiClient {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    pub async fn upload(&self, flow: Flow, request: &UploadRequest) -> Result<String, ApiError> {
        let bytes = tokio::fs::read(&request.file)
            .await
            .map_err(|err| ApiError::Io(format!("{}: {}", request.file.display(), err)))?;
        let form = FormPayload {
            fields: request.fields.clone(),
            file: Some(FilePart {
                field: "file".to_string(),
                file_name: file_name(&request.file),
                content_type: "text/csv".to_string(),
                bytes,
            }),
        };
        let ack: UploadAck = self
            .backend
            .post_form(&Endpoint::Upload(flow), form)
            .await?
            .into_payload()?;
        Ok(ack.message)
    }

    /// Triggers processing and returns the "before" artifact.
    pub async fn start_processing(&self, flow: Flow) -> Result<String, ApiError> {
        let started: ProcessStarted = self
            .backend
            .get(&Endpoint::ProcessData(flow))
            .await?
            .into_payload()?;
        Ok(started.before_report)
    }

    pub async fn generate_report(&self) -> Result<GeneratedReport, ApiError> {
        let payload: ReportPayload = self
            .backend
            .get(&Endpoint::GenerateReport)
            .await?
            .into_payload()?;
        Ok(GeneratedReport {
            text: payload.report,
            images: payload.images,
        })
    }

    pub async fn columns(&self, flow: Flow) -> Result<Vec<String>, ApiError> {
        let payload: ColumnsPayload = self
            .backend
            .get(&Endpoint::Columns(flow))
            .await?
            .into_payload()?;
        Ok(payload.columns)
    }

    pub async fn visualize(&self, request: &PlotRequest) -> Result<(), ApiError> {
        let form = FormPayload {
            fields: vec![
                ("plot-type".to_string(), request.plot_type.wire_name().to_string()),
                ("x-axis".to_string(), request.x_axis.clone()),
                ("y-axis".to_string(), request.y_axis.clone()),
            ],
            file: None,
        };
        let ack: VisualizeAck = self
            .backend
            .post_form(&Endpoint::Visualize, form)
            .await?
            .into_payload()?;
        if let Some(message) = ack.message {
            insight_debug!("visualize acknowledged: {}", message);
        }
        Ok(())
    }

    pub async fn chat(&self, query: &str) -> Result<String, ApiError> {
        let reply: ChatReply = self
            .backend
            .post_json(&Endpoint::ChatQuery, json!({ "query": query }))
            .await?
            .into_payload()?;
        Ok(reply.response)
    }

    /// One status request, undecoded; the poller calls this on every tick.
    pub async fn check_status(&self, endpoint: &Endpoint) -> Result<Envelope, ApiError> {
        self.backend.get(endpoint).await
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload.csv".to_string())
}

// Completion predicates. A `success: false` status body means "not ready yet".

pub fn processing_completion(envelope: Envelope) -> Result<Option<String>, ApiError> {
    if !envelope.success {
        return Ok(None);
    }
    let status: ProcessingStatus = envelope.payload()?;
    Ok(status
        .completed
        .then(|| status.after_report.unwrap_or_default()))
}

pub fn report_completion(envelope: Envelope) -> Result<Option<()>, ApiError> {
    if !envelope.success {
        return Ok(None);
    }
    let status: ReportStatus = envelope.payload()?;
    Ok(status.completed.then_some(()))
}

pub fn visualization_completion(envelope: Envelope) -> Result<Option<String>, ApiError> {
    if !envelope.success {
        return Ok(None);
    }
    let status: VisualizationStatus = envelope.payload()?;
    Ok(status.image_url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use insight_core::PlotType;

    #[test]
    fn flow_selects_endpoint_suffix() {
        assert_eq!(Endpoint::Upload(Flow::Insights).path(), "/api/upload_insight");
        assert_eq!(Endpoint::Upload(Flow::Visualize).path(), "/api/upload");
        assert_eq!(
            Endpoint::CheckProcessing(Flow::Insights).path(),
            "/api/check_processing_insight"
        );
        assert_eq!(Endpoint::Columns(Flow::Visualize).path(), "/api/get_columns");
    }

    #[test]
    fn visualization_check_carries_request_in_query() {
        let endpoint = Endpoint::CheckVisualization(PlotRequest {
            plot_type: PlotType::BoxPlot,
            x_axis: "region".to_string(),
            y_axis: "sales".to_string(),
        });
        assert_eq!(
            endpoint.query(),
            vec![
                ("plot_type", "box_plot".to_string()),
                ("x_axis", "region".to_string()),
                ("y_axis", "sales".to_string()),
            ]
        );
    }

    #[test]
    fn processing_completion_requires_completed_flag() {
        let pending = Envelope::parse(br#"{"success": true, "completed": false}"#).unwrap();
        assert_eq!(processing_completion(pending).unwrap(), None);

        let not_ready = Envelope::parse(br#"{"success": false}"#).unwrap();
        assert_eq!(processing_completion(not_ready).unwrap(), None);

        let done =
            Envelope::parse(br#"{"success": true, "completed": true, "after_report": "ok"}"#)
                .unwrap();
        assert_eq!(processing_completion(done).unwrap(), Some("ok".to_string()));
    }

    #[test]
    fn visualization_completion_needs_image_url() {
        let missing = Envelope::parse(br#"{"success": true}"#).unwrap();
        assert_eq!(visualization_completion(missing).unwrap(), None);

        let ready = Envelope::parse(br#"{"success": true, "image_url": "/p.png"}"#).unwrap();
        assert_eq!(
            visualization_completion(ready).unwrap(),
            Some("/p.png".to_string())
        );
    }
}
