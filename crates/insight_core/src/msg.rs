use crate::{ApiFailure, Axis, GeneratedReport, KeyPress, PlotRequest, PlotType, UploadRequest};

/// Inputs to [`crate::update`].
///
/// Responses that belong to one upload carry the `generation` they were
/// requested under; the core drops those from an older upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Front end is up; the visualize flow prefetches columns.
    Started,
    /// User submitted the upload form.
    UploadSubmitted(UploadRequest),
    /// Upload response: server message on success.
    UploadFinished(Result<String, ApiFailure>),
    /// Processing trigger response: the "before" artifact on success.
    ProcessingStarted {
        generation: u64,
        result: Result<String, ApiFailure>,
    },
    /// Processing poll finished: the "after" artifact on success.
    ProcessingFinished {
        generation: u64,
        result: Result<String, ApiFailure>,
    },
    /// Report readiness poll finished (insights flow).
    ReportReadiness {
        generation: u64,
        result: Result<(), ApiFailure>,
    },
    /// User asked for the generated report.
    GenerateReportClicked,
    ReportGenerated(Result<GeneratedReport, ApiFailure>),
    /// User asked to print what is currently rendered.
    PrintClicked,
    /// Print output written; `Ok` carries where it went.
    PrintFinished(Result<String, String>),
    /// User asked to reload the column list.
    ColumnsRequested,
    ColumnsLoaded {
        generation: u64,
        result: Result<Vec<String>, ApiFailure>,
    },
    PlotTypeSelected(PlotType),
    AxisSelected { axis: Axis, column: String },
    /// User submitted the plot form.
    VisualizeSubmitted,
    VisualizeAccepted {
        request: PlotRequest,
        result: Result<(), ApiFailure>,
    },
    /// Visualization poll finished: the image URL on success.
    VisualizationReady {
        request: PlotRequest,
        result: Result<String, ApiFailure>,
    },
    /// User edited the chat input box.
    ChatInputChanged(String),
    /// User submitted the chat form.
    ChatSubmitted,
    /// Key press in the chat input box.
    ChatKeyPressed(KeyPress),
    ChatReplied(Result<String, ApiFailure>),
}
