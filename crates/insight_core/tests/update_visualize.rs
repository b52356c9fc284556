use insight_core::{
    update, ApiFailure, AppState, Axis, Banner, Effect, Flow, Msg, PlotRequest, PlotType, Stage,
    UploadRequest,
};
use pretty_assertions::assert_eq;

/// Uploads and starts processing; the processing poll is running.
fn processing(flow: Flow) -> AppState {
    let steps = vec![
        Msg::UploadSubmitted(UploadRequest::new("data.csv")),
        Msg::UploadFinished(Ok("ok".to_string())),
        Msg::ProcessingStarted {
            generation: 1,
            result: Ok("before".to_string()),
        },
    ];
    steps
        .into_iter()
        .fold(AppState::new(flow), |state, msg| update(state, msg).0)
}

fn processed() -> AppState {
    let msg = Msg::ProcessingFinished {
        generation: 1,
        result: Ok("after".to_string()),
    };
    update(processing(Flow::Visualize), msg).0
}

fn load_columns(state: AppState, columns: &[&str]) -> AppState {
    let msg = Msg::ColumnsLoaded {
        generation: state.generation(),
        result: Ok(columns.iter().map(|c| c.to_string()).collect()),
    };
    update(state, msg).0
}

fn with_columns(columns: &[&str]) -> AppState {
    load_columns(processed(), columns)
}

fn scatter_request(x: &str, y: &str) -> PlotRequest {
    PlotRequest {
        plot_type: PlotType::Scatterplot,
        x_axis: x.to_string(),
        y_axis: y.to_string(),
    }
}

#[test]
fn started_prefetches_columns_only_for_visualize() {
    let (_, effects) = update(AppState::new(Flow::Visualize), Msg::Started);
    assert_eq!(
        effects,
        vec![Effect::FetchColumns {
            flow: Flow::Visualize,
            generation: 0,
        }]
    );

    let (_, effects) = update(AppState::new(Flow::Insights), Msg::Started);
    assert!(effects.is_empty());
}

#[test]
fn columns_populate_both_selects_in_order() {
    let state = with_columns(&["a", "b"]);
    let view = state.view();

    assert_eq!(view.x_axis.values(), vec!["a", "b"]);
    assert_eq!(view.y_axis.values(), vec!["a", "b"]);
    for option in view.x_axis.options() {
        assert_eq!(option.value, option.label);
    }
    assert_eq!(view.x_axis.selected(), Some("a"));
}

#[test]
fn reloading_columns_replaces_previous_options() {
    let state = load_columns(with_columns(&["a", "b", "c"]), &["z"]);

    assert_eq!(state.view().x_axis.values(), vec!["z"]);
    assert_eq!(state.view().y_axis.values(), vec!["z"]);
}

#[test]
fn prefetch_failure_before_upload_is_quiet() {
    let (state, _) = update(
        AppState::new(Flow::Visualize),
        Msg::ColumnsLoaded {
            generation: 0,
            result: Err(ApiFailure::server("No such file")),
        },
    );
    assert_eq!(state.view().banner, Banner::Hidden);
}

#[test]
fn columns_from_before_an_upload_are_dropped() {
    let state = processed();
    let (state, _) = update(
        state,
        Msg::ColumnsLoaded {
            generation: 0,
            result: Ok(vec!["stale".to_string()]),
        },
    );
    assert!(state.view().x_axis.values().is_empty());

    let state = load_columns(state, &["fresh"]);
    assert_eq!(state.view().x_axis.values(), vec!["fresh"]);
}

#[test]
fn axis_selection_outside_options_is_ignored() {
    let state = with_columns(&["a", "b"]);
    let (state, _) = update(
        state,
        Msg::AxisSelected {
            axis: Axis::Y,
            column: "b".to_string(),
        },
    );
    let (state, _) = update(
        state,
        Msg::AxisSelected {
            axis: Axis::X,
            column: "missing".to_string(),
        },
    );

    assert_eq!(state.view().x_axis.selected(), Some("a"));
    assert_eq!(state.view().y_axis.selected(), Some("b"));
}

#[test]
fn submit_without_plot_type_shows_error() {
    let state = with_columns(&["a", "b"]);
    let (state, effects) = update(state, Msg::VisualizeSubmitted);

    assert!(effects.is_empty());
    assert!(matches!(state.view().banner, Banner::Error(_)));
}

#[test]
fn correlation_matrix_needs_no_axes() {
    let (state, _) = update(processed(), Msg::PlotTypeSelected(PlotType::CorrelationMatrix));
    let (_state, effects) = update(state, Msg::VisualizeSubmitted);

    assert_eq!(
        effects,
        vec![Effect::SubmitVisualization(PlotRequest {
            plot_type: PlotType::CorrelationMatrix,
            x_axis: String::new(),
            y_axis: String::new(),
        })]
    );
}

#[test]
fn accepted_plot_polls_and_ready_plot_is_rendered() {
    let state = with_columns(&["a", "b"]);
    let (state, _) = update(state, Msg::PlotTypeSelected(PlotType::Scatterplot));
    let (state, _) = update(
        state,
        Msg::AxisSelected {
            axis: Axis::Y,
            column: "b".to_string(),
        },
    );
    let (state, effects) = update(state, Msg::VisualizeSubmitted);
    let request = scatter_request("a", "b");
    assert_eq!(effects, vec![Effect::SubmitVisualization(request.clone())]);

    let (state, effects) = update(
        state,
        Msg::VisualizeAccepted {
            request: request.clone(),
            result: Ok(()),
        },
    );
    assert_eq!(effects, vec![Effect::PollVisualization(request.clone())]);
    assert_eq!(
        state.view().banner,
        Banner::Success("Generating visualization...".to_string())
    );

    let (state, _) = update(
        state,
        Msg::VisualizationReady {
            request,
            result: Ok("/processed/visual_images/scatterplot_a_b.png".to_string()),
        },
    );
    let view = state.view();
    assert_eq!(
        view.visualization_image.as_deref(),
        Some("/processed/visual_images/scatterplot_a_b.png")
    );
    assert_eq!(view.visualization_pending, None);
}

#[test]
fn resubmitting_cancels_the_previous_poll_and_ignores_its_result() {
    let state = with_columns(&["a", "b"]);
    let (state, _) = update(state, Msg::PlotTypeSelected(PlotType::Scatterplot));
    let (state, _) = update(state, Msg::VisualizeSubmitted);
    let (state, _) = update(
        state,
        Msg::AxisSelected {
            axis: Axis::X,
            column: "b".to_string(),
        },
    );
    let (state, effects) = update(state, Msg::VisualizeSubmitted);
    assert_eq!(
        effects,
        vec![
            Effect::CancelVisualizationPoll,
            Effect::SubmitVisualization(scatter_request("b", "a")),
        ]
    );

    let (state, effects) = update(
        state,
        Msg::VisualizationReady {
            request: scatter_request("a", "a"),
            result: Ok("/old.png".to_string()),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.view().visualization_image, None);
}

#[test]
fn visualize_rejection_shows_server_error() {
    let state = with_columns(&["a"]);
    let (state, _) = update(state, Msg::PlotTypeSelected(PlotType::PieChart));
    let (state, _) = update(state, Msg::VisualizeSubmitted);
    let request = PlotRequest {
        plot_type: PlotType::PieChart,
        x_axis: "a".to_string(),
        y_axis: "a".to_string(),
    };
    let (state, effects) = update(
        state,
        Msg::VisualizeAccepted {
            request,
            result: Err(ApiFailure::server("Unsupported plot type")),
        },
    );

    assert!(effects.is_empty());
    assert_eq!(
        state.view().banner,
        Banner::Error("Unsupported plot type".to_string())
    );
    assert_eq!(state.view().visualization_pending, None);
}

#[test]
fn drawing_while_processing_leaves_the_processing_poll_alone() {
    let state = processing(Flow::Visualize);
    let (state, _) = update(state, Msg::PlotTypeSelected(PlotType::CorrelationMatrix));

    let (state, effects) = update(state, Msg::VisualizeSubmitted);
    assert!(effects.is_empty());
    let (state, effects) = update(state, Msg::VisualizeSubmitted);
    assert!(effects.is_empty());
    assert_eq!(state.view().visualization_pending, None);

    let (state, effects) = update(
        state,
        Msg::ProcessingFinished {
            generation: 1,
            result: Ok("after".to_string()),
        },
    );
    assert_eq!(state.stage(), Stage::Processed);
    assert_eq!(
        effects,
        vec![Effect::FetchColumns {
            flow: Flow::Visualize,
            generation: 1,
        }]
    );
}

#[test]
fn drawing_is_ignored_in_the_insights_flow() {
    let state = processing(Flow::Insights);
    let (state, _) = update(state, Msg::PlotTypeSelected(PlotType::CorrelationMatrix));
    let (state, effects) = update(state, Msg::VisualizeSubmitted);

    assert!(effects.is_empty());
    assert_eq!(state.view().visualization_pending, None);
}

#[test]
fn redrawing_never_cancels_every_poll() {
    let state = with_columns(&["a"]);
    let (state, _) = update(state, Msg::PlotTypeSelected(PlotType::CorrelationMatrix));
    let (state, first) = update(state, Msg::VisualizeSubmitted);
    let (_state, second) = update(state, Msg::VisualizeSubmitted);

    assert!(!first.contains(&Effect::CancelPolling));
    assert!(!second.contains(&Effect::CancelPolling));
    assert_eq!(second[0], Effect::CancelVisualizationPoll);
}
