use std::io::{self, BufRead, Write};
use std::sync::mpsc;
use std::thread;

use anyhow::Result;
use insight_core::{update, AppState, AppViewModel, Msg};
use insight_logging::{insight_debug, insight_info};

use crate::commands::{self, Command, HELP};
use crate::config::AppConfig;
use crate::effects::EffectRunner;
use crate::render;

/// Everything the main loop reacts to, from stdin and from the engine.
#[derive(Debug)]
pub enum AppEvent {
    Msg(Msg),
    Line(String),
    Quit,
}

pub fn run(config: AppConfig) -> Result<()> {
    let (app_tx, app_rx) = mpsc::channel::<AppEvent>();
    let runner = EffectRunner::new(config.engine_settings()?, app_tx.clone())?;
    spawn_stdin_reader(app_tx.clone());

    let flow = config.flow();
    insight_info!("starting insight client: flow={} base_url={}", flow, config.base_url);
    println!("insight client ({flow} flow) at {}", config.base_url);
    println!("{HELP}");

    let mut session = Session::new(AppState::new(flow), runner);
    session.dispatch(Msg::Started);
    prompt();

    for event in app_rx {
        match event {
            AppEvent::Msg(msg) => session.dispatch(msg),
            AppEvent::Line(line) => {
                match commands::parse(&line) {
                    Command::Dispatch(msgs) => msgs.into_iter().for_each(|msg| session.dispatch(msg)),
                    Command::Help => println!("{HELP}"),
                    Command::Invalid(reason) => println!("{reason}"),
                    Command::Quit => break,
                }
                prompt();
            }
            AppEvent::Quit => break,
        }
    }

    insight_info!("insight client exiting");
    Ok(())
}

struct Session {
    state: AppState,
    shown: AppViewModel,
    runner: EffectRunner,
}

impl Session {
    fn new(state: AppState, runner: EffectRunner) -> Self {
        let shown = state.view();
        Self {
            state,
            shown,
            runner,
        }
    }

    fn dispatch(&mut self, msg: Msg) {
        insight_debug!("msg {:?}", msg);
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        if state.consume_dirty() {
            let view = state.view();
            for line in render::render(&self.shown, &view) {
                println!("{line}");
            }
            self.shown = view;
        }
        self.state = state;
        self.runner.enqueue(effects);
    }
}

fn prompt() {
    print!("> ");
    let _ = io::stdout().flush();
}

fn spawn_stdin_reader(app_tx: mpsc::Sender<AppEvent>) {
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if app_tx.send(AppEvent::Line(line)).is_err() {
                return;
            }
        }
        let _ = app_tx.send(AppEvent::Quit);
    });
}
