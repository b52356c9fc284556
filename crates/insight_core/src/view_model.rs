use crate::{
    Banner, ChatEntry, Flow, GeneratedReport, PlotRequest, PlotType, SelectControl, Stage,
    UploadStatus,
};

/// Everything a front end needs to draw the client, with visibility already
/// decided.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub flow: Flow,
    pub stage: Stage,
    pub banner: Banner,
    pub upload: UploadStatus,
    pub report_section_visible: bool,
    pub before_text: Option<String>,
    pub after_text: Option<String>,
    pub loader_visible: bool,
    pub generate_report_visible: bool,
    pub chatbox_visible: bool,
    pub generated_report: Option<GeneratedReport>,
    pub visualization_options_visible: bool,
    pub plot_type: Option<PlotType>,
    pub x_axis: SelectControl,
    pub y_axis: SelectControl,
    pub visualization_pending: Option<PlotRequest>,
    pub visualization_image: Option<String>,
    pub chat_input: String,
    pub transcript: Vec<ChatEntry>,
    /// Index of the transcript entry the chat view is scrolled to; always the newest.
    pub transcript_scroll: Option<usize>,
    pub dirty: bool,
}
