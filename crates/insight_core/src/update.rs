use crate::print::print_document;
use crate::{
    ApiFailure, AppState, Axis, Banner, Effect, FailureKind, Flow, Msg, PlotRequest, Sender, Stage,
    UploadStatus,
};

const PROCESSING_BANNER: &str = "Processing data... This may take a few minutes.";
const VISUALIZING_BANNER: &str = "Generating visualization...";
const MISSING_PLOT_INPUT: &str = "Select a plot type and the axes it needs.";

/// Where a request was made from. Transport failures show a fixed message per site.
#[derive(Debug, Clone, Copy)]
enum CallSite {
    Upload,
    ProcessData,
    CheckProcessing,
    CheckReport,
    GenerateReport,
    Columns,
    Visualize,
    CheckVisualization,
}

impl CallSite {
    fn transport_message(self) -> &'static str {
        match self {
            CallSite::Upload => "An error occurred during upload.",
            CallSite::ProcessData => "An error occurred while processing the data.",
            CallSite::CheckProcessing => "An error occurred while checking processing status.",
            CallSite::CheckReport => {
                "An error occurred while checking report generation status."
            }
            CallSite::GenerateReport => "An error occurred while generating the report.",
            CallSite::Columns => "An error occurred while fetching columns.",
            CallSite::Visualize => "An error occurred while generating the visualization.",
            CallSite::CheckVisualization => {
                "An error occurred while checking for the visualization."
            }
        }
    }

    fn timeout_message(self) -> &'static str {
        match self {
            CallSite::CheckProcessing => "Timed out waiting for processing to finish.",
            CallSite::CheckReport => "Timed out waiting for the report to be generated.",
            CallSite::CheckVisualization => "Timed out waiting for the visualization.",
            other => other.transport_message(),
        }
    }
}

fn banner_text(failure: &ApiFailure, site: CallSite) -> String {
    match failure.kind {
        FailureKind::Server => failure.message.clone(),
        FailureKind::Transport => site.transport_message().to_string(),
        FailureKind::TimedOut => site.timeout_message().to_string(),
    }
}

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::Started => match state.flow {
            Flow::Visualize => vec![Effect::FetchColumns {
                flow: state.flow,
                generation: state.generation,
            }],
            Flow::Insights => Vec::new(),
        },
        Msg::UploadSubmitted(request) => {
            if state.stage == Stage::Uploading {
                return (state, Vec::new());
            }
            let mut effects = Vec::with_capacity(2);
            if state.stage != Stage::Idle || state.visualization.pending.is_some() {
                effects.push(Effect::CancelPolling);
            }
            state.reset_pipeline();
            state.generation += 1;
            state.stage = Stage::Uploading;
            state.upload = UploadStatus::Pending {
                file: request.file.clone(),
            };
            effects.push(Effect::Upload {
                flow: state.flow,
                request,
            });
            effects
        }
        Msg::UploadFinished(result) => {
            if state.stage != Stage::Uploading {
                return (state, Vec::new());
            }
            let file = match std::mem::take(&mut state.upload) {
                UploadStatus::Pending { file } | UploadStatus::Done { file } => Some(file),
                UploadStatus::None => None,
            };
            match result {
                Ok(message) => {
                    if let Some(file) = file {
                        state.upload = UploadStatus::Done { file };
                    }
                    state.stage = Stage::StartingProcessing;
                    state.set_banner(Banner::Success(message));
                    vec![Effect::StartProcessing {
                        flow: state.flow,
                        generation: state.generation,
                    }]
                }
                Err(failure) => {
                    state.halt(banner_text(&failure, CallSite::Upload));
                    Vec::new()
                }
            }
        }
        Msg::ProcessingStarted { generation, result } => {
            if generation != state.generation || state.stage != Stage::StartingProcessing {
                return (state, Vec::new());
            }
            match result {
                Ok(before) => {
                    state.report.before = Some(before);
                    state.stage = Stage::Processing;
                    state.set_banner(Banner::Success(PROCESSING_BANNER.to_string()));
                    vec![Effect::PollProcessing {
                        flow: state.flow,
                        generation: state.generation,
                    }]
                }
                Err(failure) => {
                    state.halt(banner_text(&failure, CallSite::ProcessData));
                    Vec::new()
                }
            }
        }
        Msg::ProcessingFinished { generation, result } => {
            if generation != state.generation || state.stage != Stage::Processing {
                return (state, Vec::new());
            }
            match result {
                Ok(after) => {
                    state.report.after = Some(after);
                    state.stage = Stage::Processed;
                    state.set_banner(Banner::Hidden);
                    match state.flow {
                        Flow::Insights => vec![Effect::PollReportReadiness {
                            generation: state.generation,
                        }],
                        Flow::Visualize => vec![Effect::FetchColumns {
                            flow: state.flow,
                            generation: state.generation,
                        }],
                    }
                }
                Err(failure) => {
                    state.halt(banner_text(&failure, CallSite::CheckProcessing));
                    Vec::new()
                }
            }
        }
        Msg::ReportReadiness { generation, result } => {
            if generation != state.generation
                || state.stage != Stage::Processed
                || state.flow != Flow::Insights
            {
                return (state, Vec::new());
            }
            match result {
                Ok(()) => {
                    state.stage = Stage::ReportReady;
                    state.mark_dirty();
                }
                Err(failure) => state.halt(banner_text(&failure, CallSite::CheckReport)),
            }
            Vec::new()
        }
        Msg::GenerateReportClicked => {
            if state.stage != Stage::ReportReady {
                return (state, Vec::new());
            }
            state.stage = Stage::GeneratingReport;
            state.mark_dirty();
            vec![Effect::GenerateReport]
        }
        Msg::ReportGenerated(result) => {
            if state.stage != Stage::GeneratingReport {
                return (state, Vec::new());
            }
            match result {
                Ok(report) => {
                    state.report.generated = Some(report);
                    state.stage = Stage::ReportGenerated;
                    state.mark_dirty();
                }
                Err(failure) => {
                    // The button stays available; clicking again is a new request.
                    state.stage = Stage::ReportReady;
                    state.set_banner(Banner::Error(banner_text(
                        &failure,
                        CallSite::GenerateReport,
                    )));
                }
            }
            Vec::new()
        }
        Msg::PrintClicked => match state.printable_markup() {
            Some(markup) => vec![Effect::Print {
                document: print_document(&markup),
            }],
            None => Vec::new(),
        },
        Msg::PrintFinished(result) => {
            if let Err(reason) = result {
                state.set_banner(Banner::Error(format!("Could not print the report: {reason}")));
            }
            Vec::new()
        }
        Msg::ColumnsRequested => vec![Effect::FetchColumns {
            flow: state.flow,
            generation: state.generation,
        }],
        Msg::ColumnsLoaded { generation, result } => {
            if generation != state.generation {
                return (state, Vec::new());
            }
            match result {
                Ok(columns) => {
                    state.visualization.x_axis.populate(&columns);
                    state.visualization.y_axis.populate(&columns);
                    state.mark_dirty();
                }
                // Before any upload the fetch is a page-load prefetch; its failure stays quiet.
                Err(_) if state.stage == Stage::Idle => {}
                Err(failure) => {
                    state.set_banner(Banner::Error(banner_text(&failure, CallSite::Columns)));
                }
            }
            Vec::new()
        }
        Msg::PlotTypeSelected(plot_type) => {
            state.visualization.plot_type = Some(plot_type);
            state.mark_dirty();
            Vec::new()
        }
        Msg::AxisSelected { axis, column } => {
            if state.select_control_mut(axis).select(&column) {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::VisualizeSubmitted => {
            // The plot form only exists once processing has finished.
            if state.flow != Flow::Visualize || state.stage != Stage::Processed {
                return (state, Vec::new());
            }
            submit_visualization(&mut state)
        }
        Msg::VisualizeAccepted { request, result } => {
            if state.visualization.pending.as_ref() != Some(&request) {
                return (state, Vec::new());
            }
            match result {
                Ok(()) => {
                    state.set_banner(Banner::Success(VISUALIZING_BANNER.to_string()));
                    vec![Effect::PollVisualization(request)]
                }
                Err(failure) => {
                    state.visualization.pending = None;
                    state.set_banner(Banner::Error(banner_text(&failure, CallSite::Visualize)));
                    Vec::new()
                }
            }
        }
        Msg::VisualizationReady { request, result } => {
            if state.visualization.pending.as_ref() != Some(&request) {
                return (state, Vec::new());
            }
            state.visualization.pending = None;
            match result {
                Ok(image_url) => {
                    state.visualization.image_url = Some(image_url);
                    state.mark_dirty();
                }
                Err(failure) => {
                    state.set_banner(Banner::Error(banner_text(
                        &failure,
                        CallSite::CheckVisualization,
                    )));
                }
            }
            Vec::new()
        }
        Msg::ChatInputChanged(text) => {
            state.chat.input = text;
            Vec::new()
        }
        Msg::ChatSubmitted => submit_chat(&mut state),
        Msg::ChatKeyPressed(key) => {
            if key.is_submit() {
                submit_chat(&mut state)
            } else {
                Vec::new()
            }
        }
        Msg::ChatReplied(result) => {
            let text = match result {
                Ok(response) => response,
                Err(failure) => format!("Error: {}", failure.message),
            };
            state.push_chat(Sender::Agent, text);
            Vec::new()
        }
    };

    (state, effects)
}

fn submit_chat(state: &mut AppState) -> Vec<Effect> {
    let query = state.chat.input.trim().to_string();
    if query.is_empty() {
        return Vec::new();
    }
    state.chat.input.clear();
    state.push_chat(Sender::User, query.clone());
    vec![Effect::SendChat { query }]
}

fn submit_visualization(state: &mut AppState) -> Vec<Effect> {
    let Some(request) = plot_request(state) else {
        state.set_banner(Banner::Error(MISSING_PLOT_INPUT.to_string()));
        return Vec::new();
    };
    let mut effects = Vec::with_capacity(2);
    if state.visualization.pending.is_some() {
        effects.push(Effect::CancelVisualizationPoll);
    }
    state.visualization.pending = Some(request.clone());
    state.mark_dirty();
    effects.push(Effect::SubmitVisualization(request));
    effects
}

fn plot_request(state: &AppState) -> Option<PlotRequest> {
    let plot_type = state.visualization.plot_type?;
    let axis_value = |axis: Axis, needed: bool| -> Option<String> {
        let control = match axis {
            Axis::X => &state.visualization.x_axis,
            Axis::Y => &state.visualization.y_axis,
        };
        match control.selected() {
            Some(value) => Some(value.to_string()),
            None if needed => None,
            None => Some(String::new()),
        }
    };
    Some(PlotRequest {
        plot_type,
        x_axis: axis_value(Axis::X, plot_type.needs_x_axis())?,
        y_axis: axis_value(Axis::Y, plot_type.needs_y_axis())?,
    })
}
