//! Insight engine: backend calls, polling and effect execution.
mod api;
mod engine;
mod error;
mod poll;
mod print;
mod types;

pub use api::{
    processing_completion, report_completion, visualization_completion, ApiClient, Backend,
    ClientSettings, Endpoint, FilePart, FormPayload, ReqwestBackend,
};
pub use engine::{
    ChannelEventSink, EngineError, EngineEvent, EngineHandle, EngineSettings, EventSink,
};
pub use error::{ApiError, PollError};
pub use poll::{poll_until, PollHandle, PollPhase, PollSettings, Poller};
pub use print::{ensure_print_dir, PrintError, PrintSettings, PrintWriter};
pub use types::{
    ChatReply, ColumnsPayload, Envelope, ProcessStarted, ProcessingStatus, ReportPayload,
    ReportStatus, UploadAck, VisualizationStatus, VisualizeAck,
};
