use std::sync::{mpsc, Arc};

use anyhow::Result;
use chrono::Utc;
use insight_core::{ApiFailure, Effect, Msg};
use insight_engine::{ApiError, EngineEvent, EngineHandle, EngineSettings, EventSink, PollError};
use insight_logging::{insight_debug, insight_warn};

use crate::app::AppEvent;

/// Executes core effects on the engine and feeds engine events back as messages.
pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(settings: EngineSettings, app_tx: mpsc::Sender<AppEvent>) -> Result<Self> {
        let engine = EngineHandle::new(settings, Arc::new(MsgSink { app_tx }))?;
        Ok(Self { engine })
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            insight_debug!("effect {:?}", effect);
            match effect {
                Effect::Upload { flow, request } => self.engine.upload(flow, request),
                Effect::StartProcessing { flow, generation } => {
                    self.engine.start_processing(flow, generation)
                }
                Effect::PollProcessing { flow, generation } => {
                    self.engine.watch_processing(flow, generation)
                }
                Effect::PollReportReadiness { generation } => self.engine.watch_report(generation),
                Effect::GenerateReport => self.engine.generate_report(),
                Effect::Print { document } => self.engine.print(print_file_name(), document),
                Effect::FetchColumns { flow, generation } => {
                    self.engine.fetch_columns(flow, generation)
                }
                Effect::SubmitVisualization(request) => self.engine.visualize(request),
                Effect::PollVisualization(request) => self.engine.watch_visualization(request),
                Effect::SendChat { query } => self.engine.chat(query),
                Effect::CancelPolling => self.engine.cancel_polls(),
                Effect::CancelVisualizationPoll => self.engine.cancel_visualization_polls(),
            }
        }
    }
}

fn print_file_name() -> String {
    format!("insight-{}.html", Utc::now().format("%Y%m%d-%H%M%S"))
}

struct MsgSink {
    app_tx: mpsc::Sender<AppEvent>,
}

impl EventSink for MsgSink {
    fn emit(&self, event: EngineEvent) {
        if let Some(msg) = event_to_msg(event) {
            let _ = self.app_tx.send(AppEvent::Msg(msg));
        }
    }
}

/// Translates an engine event. Cancelled polls produce no message.
pub(crate) fn event_to_msg(event: EngineEvent) -> Option<Msg> {
    let msg = match event {
        EngineEvent::Uploaded(result) => Msg::UploadFinished(api(result, "upload")),
        EngineEvent::ProcessingStarted { generation, result } => Msg::ProcessingStarted {
            generation,
            result: api(result, "process data"),
        },
        EngineEvent::ProcessingCompleted { generation, result } => Msg::ProcessingFinished {
            generation,
            result: poll(result, "processing check")?,
        },
        EngineEvent::ReportReady { generation, result } => Msg::ReportReadiness {
            generation,
            result: poll(result, "report check")?,
        },
        EngineEvent::ReportGenerated(result) => {
            Msg::ReportGenerated(api(result, "generate report"))
        }
        EngineEvent::ColumnsFetched { generation, result } => Msg::ColumnsLoaded {
            generation,
            result: api(result, "columns"),
        },
        EngineEvent::VisualizationAccepted { request, result } => Msg::VisualizeAccepted {
            request,
            result: api(result, "visualize"),
        },
        EngineEvent::VisualizationReady { request, result } => Msg::VisualizationReady {
            request,
            result: poll(result, "visualization check")?,
        },
        EngineEvent::ChatReplied(result) => Msg::ChatReplied(api(result, "chat")),
        EngineEvent::Printed(result) => Msg::PrintFinished(match result {
            Ok(path) => Ok(path.display().to_string()),
            Err(err) => {
                insight_warn!("print failed: {}", err);
                Err(err.to_string())
            }
        }),
    };
    Some(msg)
}

fn api<T>(result: Result<T, ApiError>, call: &str) -> Result<T, ApiFailure> {
    result.map_err(|err| {
        insight_warn!("{} failed: {}", call, err);
        api_failure(err)
    })
}

fn api_failure(err: ApiError) -> ApiFailure {
    match err {
        ApiError::Server { message } => ApiFailure::server(message),
        other => ApiFailure::transport(other.to_string()),
    }
}

fn poll<T>(result: Result<T, PollError>, call: &str) -> Option<Result<T, ApiFailure>> {
    match result {
        Ok(value) => Some(Ok(value)),
        Err(PollError::Cancelled) => None,
        Err(PollError::Api(err)) => {
            insight_warn!("{} failed: {}", call, err);
            Some(Err(api_failure(err)))
        }
        Err(err @ PollError::TimedOut { .. }) => {
            insight_warn!("{} {}", call, err);
            Some(Err(ApiFailure::timed_out(err.to_string())))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use super::*;
    use insight_core::FailureKind;
    use insight_engine::PrintError;
    use pretty_assertions::assert_eq;

    #[test]
    fn server_rejection_keeps_message() {
        let msg = event_to_msg(EngineEvent::Uploaded(Err(ApiError::Server {
            message: "Invalid file type".to_string(),
        })));
        assert_eq!(
            msg,
            Some(Msg::UploadFinished(Err(ApiFailure::server("Invalid file type"))))
        );
    }

    #[test]
    fn transport_errors_are_marked_transport() {
        let msg = event_to_msg(EngineEvent::ChatReplied(Err(ApiError::HttpStatus(502))));
        match msg {
            Some(Msg::ChatReplied(Err(failure))) => assert_eq!(failure.kind, FailureKind::Transport),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn poll_outcomes_map_to_failure_kinds() {
        let timed_out = event_to_msg(EngineEvent::ReportReady {
            generation: 2,
            result: Err(PollError::TimedOut {
                elapsed: Duration::from_secs(600),
            }),
        });
        match timed_out {
            Some(Msg::ReportReadiness {
                generation: 2,
                result: Err(failure),
            }) => assert_eq!(failure.kind, FailureKind::TimedOut),
            other => panic!("unexpected {other:?}"),
        }

        let cancelled = event_to_msg(EngineEvent::ProcessingCompleted {
            generation: 1,
            result: Err(PollError::Cancelled),
        });
        assert_eq!(cancelled, None);

        let done = event_to_msg(EngineEvent::ProcessingCompleted {
            generation: 1,
            result: Ok("after".to_string()),
        });
        assert_eq!(
            done,
            Some(Msg::ProcessingFinished {
                generation: 1,
                result: Ok("after".to_string()),
            })
        );
    }

    #[test]
    fn print_result_carries_path_or_reason() {
        let ok = event_to_msg(EngineEvent::Printed(Ok(PathBuf::from("print/a.html"))));
        assert_eq!(ok, Some(Msg::PrintFinished(Ok("print/a.html".to_string()))));

        let err = event_to_msg(EngineEvent::Printed(Err(PrintError::Viewer(
            "no browser".to_string(),
        ))));
        assert!(matches!(err, Some(Msg::PrintFinished(Err(_)))));
    }

    #[test]
    fn print_files_are_timestamped_html() {
        let name = print_file_name();
        assert!(name.starts_with("insight-"));
        assert!(name.ends_with(".html"));
    }
}
