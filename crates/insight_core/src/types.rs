use std::fmt;
use std::path::PathBuf;

/// Which page flow the client drives. The two flows share the pipeline shape
/// but talk to different endpoints and end in different stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Flow {
    /// Upload, process, wait for the insight report, then report/print/chat.
    #[default]
    Insights,
    /// Upload, process, then pick columns and render plots.
    Visualize,
}

impl fmt::Display for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Flow::Insights => write!(f, "insights"),
            Flow::Visualize => write!(f, "visualize"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlotType {
    CorrelationMatrix,
    PieChart,
    BoxPlot,
    LinePlot,
    Histogram,
    Scatterplot,
}

impl PlotType {
    pub const ALL: [PlotType; 6] = [
        PlotType::CorrelationMatrix,
        PlotType::PieChart,
        PlotType::BoxPlot,
        PlotType::LinePlot,
        PlotType::Histogram,
        PlotType::Scatterplot,
    ];

    /// Name used in the `plot-type` form field and `plot_type` query parameter.
    pub fn wire_name(self) -> &'static str {
        match self {
            PlotType::CorrelationMatrix => "correlation_matrix",
            PlotType::PieChart => "pie_chart",
            PlotType::BoxPlot => "box_plot",
            PlotType::LinePlot => "line_plot",
            PlotType::Histogram => "histogram",
            PlotType::Scatterplot => "scatterplot",
        }
    }

    pub fn from_wire(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|plot| plot.wire_name().eq_ignore_ascii_case(name.trim()))
    }

    pub fn needs_x_axis(self) -> bool {
        !matches!(self, PlotType::CorrelationMatrix)
    }

    pub fn needs_y_axis(self) -> bool {
        !matches!(self, PlotType::CorrelationMatrix | PlotType::PieChart)
    }
}

impl fmt::Display for PlotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// The three values a plot submission and its readiness check share.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlotRequest {
    pub plot_type: PlotType,
    pub x_axis: String,
    pub y_axis: String,
}

/// A file plus the extra form fields that travel with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub file: PathBuf,
    pub fields: Vec<(String, String)>,
}

impl UploadRequest {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((key.into(), value.into()));
        self
    }
}

/// Generated report text plus its images, in server order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GeneratedReport {
    pub text: String,
    pub images: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Char(char),
    Other,
}

/// A key press in the chat input. Only a bare Enter submits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    pub key: Key,
    pub with_modifier: bool,
}

impl KeyPress {
    pub fn enter() -> Self {
        Self {
            key: Key::Enter,
            with_modifier: false,
        }
    }

    pub(crate) fn is_submit(&self) -> bool {
        self.key == Key::Enter && !self.with_modifier
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The server answered `success: false`; the message is the server's.
    Server,
    /// Network failure, unreadable body, or a local read error.
    Transport,
    /// A poll gave up after its configured maximum duration.
    TimedOut,
}

/// Engine-independent description of a failed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl ApiFailure {
    pub fn server(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Server,
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Transport,
            message: message.into(),
        }
    }

    pub fn timed_out(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::TimedOut,
            message: message.into(),
        }
    }
}
