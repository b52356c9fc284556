use insight_core::{AppViewModel, Banner, PlotType, SelectControl, Stage, UploadStatus};

/// Lines to print for the change from `prev` to `next`. Only what changed is
/// printed, so the terminal reads as a log of the session.
pub fn render(prev: &AppViewModel, next: &AppViewModel) -> Vec<String> {
    let mut lines = Vec::new();

    if next.upload != prev.upload {
        match &next.upload {
            UploadStatus::Pending { file } => lines.push(format!("uploading {}", file.display())),
            UploadStatus::Done { file } => lines.push(format!("uploaded {}", file.display())),
            UploadStatus::None => {}
        }
    }

    if next.banner != prev.banner {
        match &next.banner {
            Banner::Success(text) => lines.push(format!("[ok] {text}")),
            Banner::Error(text) => lines.push(format!("[error] {text}")),
            Banner::Hidden => {}
        }
    }

    if next.stage != prev.stage {
        lines.push(format!("stage: {}", stage_label(next.stage)));
    }

    if next.report_section_visible {
        if let Some(before) = appeared(&prev.before_text, &next.before_text) {
            lines.push("--- before processing ---".to_string());
            lines.push(before.clone());
        }
        if let Some(after) = appeared(&prev.after_text, &next.after_text) {
            lines.push("--- after processing ---".to_string());
            lines.push(after.clone());
        }
    }

    if next.loader_visible && !prev.loader_visible {
        lines.push("waiting for the report...".to_string());
    }
    if next.generate_report_visible && !prev.generate_report_visible {
        lines.push("report ready; type `report` to generate it".to_string());
    }
    if next.chatbox_visible && !prev.chatbox_visible {
        lines.push("chat open; type `ask <question>`".to_string());
    }

    if let Some(report) = appeared(&prev.generated_report, &next.generated_report) {
        lines.push("--- report ---".to_string());
        lines.push(report.text.clone());
        lines.extend(report.images.iter().map(|image| format!("image: {image}")));
    }

    if next.visualization_options_visible && !prev.visualization_options_visible {
        let names: Vec<_> = PlotType::ALL.iter().map(|plot| plot.wire_name()).collect();
        lines.push(format!("plot types: {}", names.join(", ")));
    }
    if next.x_axis.options() != prev.x_axis.options() && !next.x_axis.options().is_empty() {
        lines.push(format!("columns: {}", next.x_axis.values().join(", ")));
    }
    if next.visualization_options_visible
        && (next.plot_type != prev.plot_type
            || next.x_axis.selected() != prev.x_axis.selected()
            || next.y_axis.selected() != prev.y_axis.selected())
    {
        lines.push(plot_line(next.plot_type, &next.x_axis, &next.y_axis));
    }
    if let Some(image) = appeared(&prev.visualization_image, &next.visualization_image) {
        lines.push(format!("visualization: {image}"));
    }

    // The transcript only grows between uploads, so new entries are the tail.
    let seen = if next.transcript.starts_with(&prev.transcript) {
        prev.transcript.len()
    } else {
        0
    };
    for entry in &next.transcript[seen..] {
        lines.push(format!("{}: {}", entry.sender.label(), entry.text));
    }

    lines
}

fn appeared<'a, T: PartialEq>(prev: &Option<T>, next: &'a Option<T>) -> Option<&'a T> {
    match next {
        Some(value) if prev.as_ref() != Some(value) => Some(value),
        _ => None,
    }
}

fn plot_line(plot_type: Option<PlotType>, x_axis: &SelectControl, y_axis: &SelectControl) -> String {
    let plot = plot_type.map_or("-", PlotType::wire_name);
    format!(
        "plot: {} x={} y={}",
        plot,
        x_axis.selected().unwrap_or("-"),
        y_axis.selected().unwrap_or("-")
    )
}

fn stage_label(stage: Stage) -> &'static str {
    match stage {
        Stage::Idle => "idle",
        Stage::Uploading => "uploading",
        Stage::StartingProcessing => "starting processing",
        Stage::Processing => "processing",
        Stage::Processed => "processed",
        Stage::ReportReady => "report ready",
        Stage::GeneratingReport => "generating report",
        Stage::ReportGenerated => "report generated",
        Stage::Halted => "halted",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insight_core::{ChatEntry, GeneratedReport, Sender};
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    #[test]
    fn unchanged_view_prints_nothing() {
        let view = AppViewModel::default();
        assert!(render(&view, &view).is_empty());
    }

    #[test]
    fn upload_success_prints_status_and_banner() {
        let prev = AppViewModel::default();
        let next = AppViewModel {
            upload: UploadStatus::Done {
                file: PathBuf::from("sales.csv"),
            },
            banner: Banner::Success("File uploaded successfully".to_string()),
            stage: Stage::StartingProcessing,
            ..AppViewModel::default()
        };

        assert_eq!(
            render(&prev, &next),
            vec![
                "uploaded sales.csv".to_string(),
                "[ok] File uploaded successfully".to_string(),
                "stage: starting processing".to_string(),
            ]
        );
    }

    #[test]
    fn artifacts_print_once() {
        let prev = AppViewModel::default();
        let next = AppViewModel {
            report_section_visible: true,
            before_text: Some("rows: 10".to_string()),
            ..AppViewModel::default()
        };

        let lines = render(&prev, &next);
        assert_eq!(lines, vec!["--- before processing ---", "rows: 10"]);
        assert!(render(&next, &next).is_empty());
    }

    #[test]
    fn generated_report_lists_images() {
        let prev = AppViewModel::default();
        let next = AppViewModel {
            generated_report: Some(GeneratedReport {
                text: "Sales grew.".to_string(),
                images: vec!["http://h/a.png".to_string()],
            }),
            ..AppViewModel::default()
        };

        assert_eq!(
            render(&prev, &next),
            vec!["--- report ---", "Sales grew.", "image: http://h/a.png"]
        );
    }

    #[test]
    fn only_new_chat_lines_print() {
        let first = ChatEntry {
            sender: Sender::User,
            text: "hi".to_string(),
        };
        let reply = ChatEntry {
            sender: Sender::Agent,
            text: "hello".to_string(),
        };
        let prev = AppViewModel {
            transcript: vec![first.clone()],
            ..AppViewModel::default()
        };
        let next = AppViewModel {
            transcript: vec![first, reply],
            ..AppViewModel::default()
        };

        assert_eq!(render(&prev, &next), vec!["AI: hello"]);
    }

    #[test]
    fn plot_selection_prints_current_choice() {
        let mut x_axis = SelectControl::default();
        x_axis.populate(&["region".to_string(), "sales".to_string()]);
        let prev = AppViewModel {
            visualization_options_visible: true,
            x_axis: x_axis.clone(),
            y_axis: x_axis.clone(),
            ..AppViewModel::default()
        };
        let next = AppViewModel {
            plot_type: Some(PlotType::Scatterplot),
            ..prev.clone()
        };

        assert_eq!(
            render(&prev, &next),
            vec!["plot: scatterplot x=region y=region"]
        );
    }
}
