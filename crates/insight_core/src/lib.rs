//! Insight core: pure pipeline state machine and view-model helpers.
mod effect;
mod msg;
mod print;
mod state;
mod types;
mod update;
mod view_model;

pub use effect::Effect;
pub use msg::Msg;
pub use print::{escape_html, print_document};
pub use state::{
    AppState, Banner, ChatEntry, SelectControl, SelectOption, Sender, Stage, UploadStatus,
};
pub use types::{
    ApiFailure, Axis, FailureKind, Flow, GeneratedReport, Key, KeyPress, PlotRequest, PlotType,
    UploadRequest,
};
pub use update::update;
pub use view_model::AppViewModel;
