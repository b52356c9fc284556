use crate::{Flow, PlotRequest, UploadRequest};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Upload { flow: Flow, request: UploadRequest },
    StartProcessing { flow: Flow, generation: u64 },
    PollProcessing { flow: Flow, generation: u64 },
    PollReportReadiness { generation: u64 },
    GenerateReport,
    /// Hand a standalone HTML document to the platform print path.
    Print { document: String },
    FetchColumns { flow: Flow, generation: u64 },
    SubmitVisualization(PlotRequest),
    PollVisualization(PlotRequest),
    SendChat { query: String },
    /// Stop every running poll.
    CancelPolling,
    /// Stop only the visualization poll; pipeline polls keep running.
    CancelVisualizationPoll,
}
