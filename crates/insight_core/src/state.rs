use std::path::PathBuf;

use crate::print::{escape_html, image_markup};
use crate::view_model::AppViewModel;
use crate::{Axis, Flow, GeneratedReport, PlotRequest, PlotType};

/// Position in the linear upload → process → report/visualize pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stage {
    #[default]
    Idle,
    Uploading,
    StartingProcessing,
    /// Polling for the "after" artifact.
    Processing,
    /// "After" artifact shown. Insights waits for the report here; visualize stays here.
    Processed,
    ReportReady,
    GeneratingReport,
    ReportGenerated,
    /// A terminal error stopped the pipeline; a new upload restarts it.
    Halted,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Banner {
    #[default]
    Hidden,
    Success(String),
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UploadStatus {
    #[default]
    None,
    Pending {
        file: PathBuf,
    },
    Done {
        file: PathBuf,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

/// A drop-down: ordered options and the current selection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectControl {
    options: Vec<SelectOption>,
    selected: Option<String>,
}

impl SelectControl {
    /// Replaces all options with one per column and selects the first.
    pub fn populate(&mut self, columns: &[String]) {
        self.options = columns
            .iter()
            .map(|column| SelectOption {
                value: column.clone(),
                label: column.clone(),
            })
            .collect();
        self.selected = self.options.first().map(|option| option.value.clone());
    }

    /// Selects `value` if it is one of the options.
    pub fn select(&mut self, value: &str) -> bool {
        if self.options.iter().any(|option| option.value == value) {
            self.selected = Some(value.to_string());
            true
        } else {
            false
        }
    }

    pub fn clear(&mut self) {
        self.options.clear();
        self.selected = None;
    }

    pub fn options(&self) -> &[SelectOption] {
        &self.options
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn values(&self) -> Vec<&str> {
        self.options.iter().map(|option| option.value.as_str()).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Agent,
}

impl Sender {
    pub fn label(self) -> &'static str {
        match self {
            Sender::User => "You",
            Sender::Agent => "AI",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEntry {
    pub sender: Sender,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct ReportState {
    pub(crate) before: Option<String>,
    pub(crate) after: Option<String>,
    pub(crate) generated: Option<GeneratedReport>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct VisualizationState {
    pub(crate) plot_type: Option<PlotType>,
    pub(crate) x_axis: SelectControl,
    pub(crate) y_axis: SelectControl,
    pub(crate) pending: Option<PlotRequest>,
    pub(crate) image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct ChatState {
    pub(crate) input: String,
    pub(crate) transcript: Vec<ChatEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    pub(crate) flow: Flow,
    pub(crate) stage: Stage,
    pub(crate) banner: Banner,
    pub(crate) upload: UploadStatus,
    pub(crate) report: ReportState,
    pub(crate) visualization: VisualizationState,
    pub(crate) chat: ChatState,
    /// Bumped on every accepted upload; tags requests made for that upload.
    pub(crate) generation: u64,
    dirty: bool,
}

impl AppState {
    pub fn new(flow: Flow) -> Self {
        Self {
            flow,
            ..Self::default()
        }
    }

    pub fn flow(&self) -> Flow {
        self.flow
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn view(&self) -> AppViewModel {
        let insights = self.flow == Flow::Insights;
        let report_available = matches!(
            self.stage,
            Stage::ReportReady | Stage::GeneratingReport | Stage::ReportGenerated
        );
        AppViewModel {
            flow: self.flow,
            stage: self.stage,
            banner: self.banner.clone(),
            upload: self.upload.clone(),
            report_section_visible: self.report.before.is_some()
                && self.report.generated.is_none(),
            before_text: self.report.before.clone(),
            after_text: self.report.after.clone(),
            loader_visible: insights && self.stage == Stage::Processed,
            generate_report_visible: insights
                && matches!(self.stage, Stage::ReportReady | Stage::GeneratingReport),
            chatbox_visible: insights && report_available,
            generated_report: self.report.generated.clone(),
            visualization_options_visible: !insights && self.stage == Stage::Processed,
            plot_type: self.visualization.plot_type,
            x_axis: self.visualization.x_axis.clone(),
            y_axis: self.visualization.y_axis.clone(),
            visualization_pending: self.visualization.pending.clone(),
            visualization_image: self.visualization.image_url.clone(),
            chat_input: self.chat.input.clone(),
            transcript: self.chat.transcript.clone(),
            transcript_scroll: self.chat.transcript.len().checked_sub(1),
            dirty: self.dirty,
        }
    }

    /// Returns whether the state changed since the last call and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn set_banner(&mut self, banner: Banner) {
        self.banner = banner;
        self.mark_dirty();
    }

    pub(crate) fn halt(&mut self, message: String) {
        self.stage = Stage::Halted;
        self.set_banner(Banner::Error(message));
    }

    /// Clears everything a previous upload produced. The chat transcript stays.
    pub(crate) fn reset_pipeline(&mut self) {
        self.report = ReportState::default();
        self.visualization.pending = None;
        self.visualization.image_url = None;
        self.visualization.x_axis.clear();
        self.visualization.y_axis.clear();
        self.mark_dirty();
    }

    pub(crate) fn select_control_mut(&mut self, axis: Axis) -> &mut SelectControl {
        match axis {
            Axis::X => &mut self.visualization.x_axis,
            Axis::Y => &mut self.visualization.y_axis,
        }
    }

    pub(crate) fn push_chat(&mut self, sender: Sender, text: String) {
        self.chat.transcript.push(ChatEntry { sender, text });
        self.mark_dirty();
    }

    /// Markup of what is currently rendered for printing, or `None` when
    /// nothing printable is on screen.
    pub(crate) fn printable_markup(&self) -> Option<String> {
        match self.flow {
            Flow::Insights => self.report.generated.as_ref().map(|report| {
                let mut markup = format!("<pre>{}</pre>\n", escape_html(&report.text));
                markup.push_str("<div id=\"report-images\">\n");
                for url in &report.images {
                    markup.push_str(&image_markup(url, None));
                    markup.push('\n');
                }
                markup.push_str("</div>");
                markup
            }),
            Flow::Visualize => self
                .visualization
                .image_url
                .as_deref()
                .map(|url| image_markup(url, Some("Generated Visualization"))),
        }
    }
}
