//! Parsing of interactive command lines into core messages.

use insight_core::{Axis, KeyPress, Msg, PlotType, UploadRequest};

pub const HELP: &str = "\
commands:
  upload <path> [key=value ...]  upload a CSV file and start processing
  report                         generate the report once it is ready
  print                          print the report or visualization
  columns                        reload the column list
  plot <type>                    choose a plot type
  x <column> | y <column>        choose plot axes
  draw                           generate the visualization
  ask <question>                 ask the chat assistant
  help                           show this text
  quit                           leave";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Dispatch(Vec<Msg>),
    Help,
    Quit,
    Invalid(String),
}

pub fn parse(line: &str) -> Command {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    match word {
        "" => Command::Dispatch(Vec::new()),
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        "upload" => parse_upload(rest),
        "report" => Command::Dispatch(vec![Msg::GenerateReportClicked]),
        "print" => Command::Dispatch(vec![Msg::PrintClicked]),
        "columns" => Command::Dispatch(vec![Msg::ColumnsRequested]),
        "plot" => match PlotType::from_wire(rest) {
            Some(plot_type) => Command::Dispatch(vec![Msg::PlotTypeSelected(plot_type)]),
            None => Command::Invalid(format!(
                "unknown plot type {:?}; choose one of {}",
                rest,
                PlotType::ALL
                    .iter()
                    .map(|plot| plot.wire_name())
                    .collect::<Vec<_>>()
                    .join(", ")
            )),
        },
        "x" => axis(Axis::X, rest),
        "y" => axis(Axis::Y, rest),
        "draw" => Command::Dispatch(vec![Msg::VisualizeSubmitted]),
        // Typed text goes through the input box and Enter, like the form does.
        "ask" => Command::Dispatch(vec![
            Msg::ChatInputChanged(rest.to_string()),
            Msg::ChatKeyPressed(KeyPress::enter()),
        ]),
        other => Command::Invalid(format!("unknown command {other:?}; type `help`")),
    }
}

fn parse_upload(rest: &str) -> Command {
    let mut parts = rest.split_whitespace();
    let Some(path) = parts.next() else {
        return Command::Invalid("usage: upload <path> [key=value ...]".to_string());
    };

    let mut request = UploadRequest::new(path);
    for part in parts {
        match part.split_once('=') {
            Some((key, value)) if !key.is_empty() => request = request.with_field(key, value),
            _ => return Command::Invalid(format!("expected key=value, got {part:?}")),
        }
    }
    Command::Dispatch(vec![Msg::UploadSubmitted(request)])
}

fn axis(axis: Axis, column: &str) -> Command {
    if column.is_empty() {
        return Command::Invalid("usage: x <column> | y <column>".to_string());
    }
    Command::Dispatch(vec![Msg::AxisSelected {
        axis,
        column: column.to_string(),
    }])
}
