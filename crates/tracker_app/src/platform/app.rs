use std::fs;
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tracker_core::{update, AppState, MessageTone, Msg, Phase, SelectedFile};
use tracker_logging::tracker_info;

use super::cli::{Cli, Command};
use super::config::ClientConfig;
use super::effects::EffectRunner;
use super::logging;
use super::persistence;
use super::render::TerminalRenderer;

/// How long to wait for an engine event before a render tick.
const TICK: Duration = Duration::from_millis(75);

pub fn run_app(cli: Cli) -> Result<ExitCode> {
    let mut config = ClientConfig::load(cli.config.as_deref())?;
    config.apply_cli(&cli)?;
    logging::initialize(config.log, cli.verbose);
    tracker_info!(
        "vtrack starting; server={} interval_ms={}",
        config.server,
        config.interval_ms
    );

    let (first, file_name) = initial_msg(&cli.command, &config)?;
    let runner = EffectRunner::new(config.api_settings(), config.download_dir.clone())
        .context("failed to start the network engine")?;
    let renderer = TerminalRenderer::new(config.html_report.clone());

    let mut app = App {
        state: AppState::new(),
        runner,
        renderer,
        config,
        file_name,
    };
    app.dispatch(first);
    while !app.is_finished() {
        let msg = match app.runner.next_msg(TICK) {
            Ok(msg) => msg.unwrap_or(Msg::Tick),
            Err(err) => {
                app.renderer.finish(&app.state.view());
                return Err(err).context("lost the network engine");
            }
        };
        app.dispatch(msg);
    }
    app.dispatch(Msg::Teardown);

    let view = app.state.view();
    app.renderer.finish(&view);
    Ok(if view.tone == MessageTone::Error {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

struct App {
    state: AppState,
    runner: EffectRunner,
    renderer: TerminalRenderer,
    config: ClientConfig,
    file_name: Option<String>,
}

impl App {
    fn dispatch(&mut self, msg: Msg) {
        if let Msg::UploadSucceeded { task_id } = &msg {
            if self.state.phase() == Phase::Uploading {
                persistence::save_last_task(
                    &self.config.state_dir,
                    task_id,
                    self.file_name.as_deref(),
                );
            }
        }

        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        if state.consume_dirty() {
            self.renderer.render(&state.view());
        }
        self.state = state;
        self.runner.enqueue(effects);
    }

    /// Done once the task settled and every requested artifact was saved.
    fn is_finished(&self) -> bool {
        self.state.is_settled() && self.runner.pending_downloads() == 0
    }
}

fn initial_msg(command: &Command, config: &ClientConfig) -> Result<(Msg, Option<String>)> {
    match command {
        Command::Submit { file } => {
            let file = file.as_deref().map(select_file).transpose()?;
            let file_name = file.as_ref().map(|selected| selected.name.clone());
            Ok((Msg::SubmitClicked { file }, file_name))
        }
        Command::Watch { task_id } => {
            let task_id = match task_id {
                Some(id) => id.clone(),
                None => persistence::load_last_task(&config.state_dir)
                    .map(|last| last.task_id)
                    .context("no task id given and no previous submission recorded")?,
            };
            Ok((Msg::WatchRequested { task_id }, None))
        }
    }
}

fn select_file(path: &Path) -> Result<SelectedFile> {
    let meta =
        fs::metadata(path).with_context(|| format!("cannot open {}", path.display()))?;
    if !meta.is_file() {
        bail!("{} is not a file", path.display());
    }
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(SelectedFile {
        path: path.to_path_buf(),
        name,
        size_bytes: meta.len(),
    })
}
