use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread;

use insight_core::{Flow, GeneratedReport, PlotRequest, UploadRequest};
use insight_logging::{insight_debug, insight_info, insight_warn};
use thiserror::Error;
use tokio::runtime::Runtime;
use url::Url;

use crate::api::{
    processing_completion, report_completion, visualization_completion, ApiClient, Backend,
    ClientSettings, Endpoint, ReqwestBackend,
};
use crate::poll::{PollHandle, PollSettings, Poller};
use crate::print::{PrintError, PrintSettings, PrintWriter};
use crate::{ApiError, PollError};

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub client: ClientSettings,
    pub poll: PollSettings,
    pub print: PrintSettings,
}

impl EngineSettings {
    pub fn new(base_url: Url) -> Self {
        Self {
            client: ClientSettings::new(base_url),
            poll: PollSettings::default(),
            print: PrintSettings::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("could not start engine runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("could not build http client: {0}")]
    Client(#[from] ApiError),
}

/// Results reported back by the engine. `generation` is echoed unchanged from
/// the command that caused the event.
#[derive(Debug)]
pub enum EngineEvent {
    Uploaded(Result<String, ApiError>),
    ProcessingStarted {
        generation: u64,
        result: Result<String, ApiError>,
    },
    ProcessingCompleted {
        generation: u64,
        result: Result<String, PollError>,
    },
    ReportReady {
        generation: u64,
        result: Result<(), PollError>,
    },
    ReportGenerated(Result<GeneratedReport, ApiError>),
    ColumnsFetched {
        generation: u64,
        result: Result<Vec<String>, ApiError>,
    },
    VisualizationAccepted {
        request: PlotRequest,
        result: Result<(), ApiError>,
    },
    VisualizationReady {
        request: PlotRequest,
        result: Result<String, PollError>,
    },
    ChatReplied(Result<String, ApiError>),
    Printed(Result<PathBuf, PrintError>),
}

/// Receives engine events, from any runtime thread.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelEventSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

enum EngineCommand {
    Upload { flow: Flow, request: UploadRequest },
    StartProcessing { flow: Flow, generation: u64 },
    WatchProcessing { flow: Flow, generation: u64 },
    WatchReport { generation: u64 },
    GenerateReport,
    FetchColumns { flow: Flow, generation: u64 },
    Visualize(PlotRequest),
    WatchVisualization(PlotRequest),
    Chat(String),
    Print { file_name: String, document: String },
    CancelPolls,
    CancelVisualizationPolls,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PollKind {
    Processing,
    Report,
    Visualization,
}

/// Front door to the engine thread. Commands are queued and executed on a
/// tokio runtime; results come back through the [`EventSink`].
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
}

impl EngineHandle {
    pub fn new(settings: EngineSettings, sink: Arc<dyn EventSink>) -> Result<Self, EngineError> {
        let backend = ReqwestBackend::new(settings.client.clone())?;
        Self::with_backend(Arc::new(backend), settings, sink)
    }

    pub fn with_backend(
        backend: Arc<dyn Backend>,
        settings: EngineSettings,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self, EngineError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("insight-engine-rt")
            .enable_all()
            .build()?;
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let worker = Worker::new(runtime, ApiClient::new(backend), settings, sink);

        thread::Builder::new()
            .name("insight-engine".to_string())
            .spawn(move || worker.run(cmd_rx))?;

        Ok(Self { cmd_tx })
    }

    pub fn upload(&self, flow: Flow, request: UploadRequest) {
        self.send(EngineCommand::Upload { flow, request });
    }

    pub fn start_processing(&self, flow: Flow, generation: u64) {
        self.send(EngineCommand::StartProcessing { flow, generation });
    }

    pub fn watch_processing(&self, flow: Flow, generation: u64) {
        self.send(EngineCommand::WatchProcessing { flow, generation });
    }

    pub fn watch_report(&self, generation: u64) {
        self.send(EngineCommand::WatchReport { generation });
    }

    pub fn generate_report(&self) {
        self.send(EngineCommand::GenerateReport);
    }

    pub fn fetch_columns(&self, flow: Flow, generation: u64) {
        self.send(EngineCommand::FetchColumns { flow, generation });
    }

    pub fn visualize(&self, request: PlotRequest) {
        self.send(EngineCommand::Visualize(request));
    }

    pub fn watch_visualization(&self, request: PlotRequest) {
        self.send(EngineCommand::WatchVisualization(request));
    }

    pub fn chat(&self, query: impl Into<String>) {
        self.send(EngineCommand::Chat(query.into()));
    }

    pub fn print(&self, file_name: impl Into<String>, document: impl Into<String>) {
        self.send(EngineCommand::Print {
            file_name: file_name.into(),
            document: document.into(),
        });
    }

    /// Cancels every running poll.
    pub fn cancel_polls(&self) {
        self.send(EngineCommand::CancelPolls);
    }

    /// Cancels running visualization polls only.
    pub fn cancel_visualization_polls(&self) {
        self.send(EngineCommand::CancelVisualizationPolls);
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            insight_warn!("engine thread is gone; command dropped");
        }
    }
}

struct Worker {
    runtime: Runtime,
    client: ApiClient,
    settings: EngineSettings,
    sink: Arc<dyn EventSink>,
    chat_tx: tokio::sync::mpsc::UnboundedSender<String>,
    polls: Vec<(PollKind, PollHandle)>,
}

impl Worker {
    fn new(
        runtime: Runtime,
        client: ApiClient,
        settings: EngineSettings,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        // Chat queries go through one queue so replies keep submission order.
        let (chat_tx, mut chat_rx) = tokio::sync::mpsc::unbounded_channel::<String>();
        let chat_client = client.clone();
        let chat_sink = sink.clone();
        runtime.spawn(async move {
            while let Some(query) = chat_rx.recv().await {
                let result = chat_client.chat(&query).await;
                chat_sink.emit(EngineEvent::ChatReplied(result));
            }
        });

        Self {
            runtime,
            client,
            settings,
            sink,
            chat_tx,
            polls: Vec::new(),
        }
    }

    fn run(mut self, cmd_rx: mpsc::Receiver<EngineCommand>) {
        while let Ok(command) = cmd_rx.recv() {
            self.handle(command);
        }
        insight_info!("engine shutting down; cancelling {} polls", self.polls.len());
        self.cancel_polls();
    }

    fn handle(&mut self, command: EngineCommand) {
        match command {
            EngineCommand::Upload { flow, request } => {
                insight_info!("upload flow={} file={:?}", flow, request.file);
                self.spawn_call(move |client| async move {
                    EngineEvent::Uploaded(client.upload(flow, &request).await)
                });
            }
            EngineCommand::StartProcessing { flow, generation } => {
                self.spawn_call(move |client| async move {
                    let result = client.start_processing(flow).await;
                    EngineEvent::ProcessingStarted { generation, result }
                });
            }
            EngineCommand::WatchProcessing { flow, generation } => {
                let sink = self.sink.clone();
                let handle = self.start_poll(
                    Endpoint::CheckProcessing(flow),
                    processing_completion,
                    move |result| sink.emit(EngineEvent::ProcessingCompleted { generation, result }),
                );
                self.track(PollKind::Processing, handle);
            }
            EngineCommand::WatchReport { generation } => {
                let sink = self.sink.clone();
                let handle = self.start_poll(Endpoint::CheckReport, report_completion, move |result| {
                    sink.emit(EngineEvent::ReportReady { generation, result })
                });
                self.track(PollKind::Report, handle);
            }
            EngineCommand::GenerateReport => {
                let base = self.settings.client.base_url.clone();
                self.spawn_call(move |client| async move {
                    let result = client.generate_report().await.map(|mut report| {
                        report.images = report
                            .images
                            .iter()
                            .map(|image| resolve_url(&base, image))
                            .collect();
                        report
                    });
                    EngineEvent::ReportGenerated(result)
                });
            }
            EngineCommand::FetchColumns { flow, generation } => {
                self.spawn_call(move |client| async move {
                    let result = client.columns(flow).await;
                    EngineEvent::ColumnsFetched { generation, result }
                });
            }
            EngineCommand::Visualize(request) => {
                self.spawn_call(move |client| async move {
                    let result = client.visualize(&request).await;
                    EngineEvent::VisualizationAccepted { request, result }
                });
            }
            EngineCommand::WatchVisualization(request) => {
                let sink = self.sink.clone();
                let base = self.settings.client.base_url.clone();
                let reported = request.clone();
                let handle = self.start_poll(
                    Endpoint::CheckVisualization(request),
                    visualization_completion,
                    move |result| {
                        sink.emit(EngineEvent::VisualizationReady {
                            request: reported.clone(),
                            result: result.map(|url| resolve_url(&base, &url)),
                        })
                    },
                );
                self.track(PollKind::Visualization, handle);
            }
            EngineCommand::Chat(query) => {
                if self.chat_tx.send(query).is_err() {
                    insight_warn!("chat worker stopped; query dropped");
                }
            }
            EngineCommand::Print {
                file_name,
                document,
            } => {
                let writer = PrintWriter::new(self.settings.print.clone());
                let sink = self.sink.clone();
                self.runtime.spawn_blocking(move || {
                    sink.emit(EngineEvent::Printed(writer.print(&file_name, &document)));
                });
            }
            EngineCommand::CancelPolls => self.cancel_polls(),
            EngineCommand::CancelVisualizationPolls => {
                self.cancel_where(|kind| kind == PollKind::Visualization)
            }
        }
    }

    /// Runs one request on the runtime and reports its event.
    fn spawn_call<F, Fut>(&self, call: F)
    where
        F: FnOnce(ApiClient) -> Fut,
        Fut: std::future::Future<Output = EngineEvent> + Send + 'static,
    {
        let sink = self.sink.clone();
        let fut = call(self.client.clone());
        self.runtime.spawn(async move {
            sink.emit(fut.await);
        });
    }

    /// Starts a poll on `endpoint` whose single outcome is handed to `report`.
    fn start_poll<T, X, R>(&self, endpoint: Endpoint, extract: X, report: R) -> PollHandle
    where
        T: Send + 'static,
        X: Fn(crate::Envelope) -> Result<Option<T>, ApiError> + Send + 'static,
        R: Fn(Result<T, PollError>) + Send + Sync + 'static,
    {
        insight_debug!("start poll {} every {:?}", endpoint.path(), self.settings.poll.interval);
        let client = self.client.clone();
        let report = Arc::new(report);
        let on_error = report.clone();
        Poller::new(self.settings.poll).start(
            self.runtime.handle(),
            move || {
                let client = client.clone();
                let endpoint = endpoint.clone();
                async move { client.check_status(&endpoint).await }
            },
            extract,
            move |value| report(Ok(value)),
            move |err| on_error(Err(err)),
        )
    }

    fn track(&mut self, kind: PollKind, handle: PollHandle) {
        self.polls.retain(|(_, poll)| !poll.is_finished());
        self.polls.push((kind, handle));
    }

    fn cancel_polls(&mut self) {
        self.cancel_where(|_| true);
    }

    fn cancel_where(&mut self, matches: impl Fn(PollKind) -> bool) {
        self.polls.retain(|(kind, poll)| {
            if matches(*kind) {
                insight_debug!("cancelling {:?} poll", kind);
                poll.cancel();
                false
            } else {
                true
            }
        });
    }
}

/// Resolves server-relative artifact URLs against the backend base URL.
fn resolve_url(base: &Url, reference: &str) -> String {
    base.join(reference)
        .map(|url| url.to_string())
        .unwrap_or_else(|_| reference.to_string())
}
