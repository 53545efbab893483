use std::path::PathBuf;

use clap::Parser;

use crate::action_executor::{CommandLauncher, DetachedLauncher, LaunchError};
use crate::candidate_store::CandidateStore;
use crate::config::{self, Config, ConfigError};
use crate::discovery::{CandidateEnumerator, PathDiscoveryProvider, UnavailableProvider};
use crate::session::{KeyInput, SessionState, Transition};
use crate::terminal_bar::{BarColors, TerminalBar, TerminalError};

/// Errors that stop a session from starting, or end it abnormally.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("terminal error: {0}")]
    Terminal(#[from] TerminalError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Key(KeyInput),
    /// The surface was exposed or resized and must be drawn again.
    Redraw,
}

/// Blocking source of classified input events.
pub trait KeySource {
    fn next_event(&mut self) -> Result<SessionEvent, TerminalError>;
}

pub trait Renderer {
    fn render(
        &mut self,
        prompt: &str,
        input: &str,
        matches: &[&str],
        highlighted: Option<usize>,
    ) -> Result<(), TerminalError>;

    fn teardown(&mut self) -> Result<(), TerminalError>;
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SessionOutcome {
    /// Set only when the command was started.
    pub launched: Option<String>,
    pub launch_error: Option<LaunchError>,
    pub cancelled: bool,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "qlaunch", version, about = "Prefix-filtering command launcher")]
pub struct CliOptions {
    /// Configuration file (defaults to the user config directory).
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Text shown before the input.
    #[arg(long, value_name = "TEXT")]
    pub prompt: Option<String>,

    /// Write the effective configuration to its path and exit.
    #[arg(long)]
    pub write_default_config: bool,

    /// Log at debug level.
    #[arg(short, long)]
    pub verbose: bool,
}

pub fn parse_cli_args<I, T>(args: I) -> Result<CliOptions, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    CliOptions::try_parse_from(args)
}

/// Drives one session: draw, wait for a key, apply it, redraw, until the
/// state stops running. The surface is torn down on every exit path.
pub fn run_session<S, L>(
    state: &mut SessionState<'_>,
    prompt: &str,
    surface: &mut S,
    launcher: &mut L,
) -> Result<SessionOutcome, RuntimeError>
where
    S: KeySource + Renderer,
    L: CommandLauncher,
{
    let result = drive(state, prompt, surface, launcher);
    let teardown = surface.teardown();
    let outcome = result?;
    teardown?;
    Ok(outcome)
}

fn drive<S, L>(
    state: &mut SessionState<'_>,
    prompt: &str,
    surface: &mut S,
    launcher: &mut L,
) -> Result<SessionOutcome, RuntimeError>
where
    S: KeySource + Renderer,
    L: CommandLauncher,
{
    let mut outcome = SessionOutcome::default();
    draw(state, prompt, surface)?;

    while state.is_running() {
        let key = match surface.next_event()? {
            SessionEvent::Redraw => {
                draw(state, prompt, surface)?;
                continue;
            }
            SessionEvent::Key(key) => key,
        };

        match state.apply(key) {
            Transition::Edited | Transition::Unchanged => draw(state, prompt, surface)?,
            Transition::Cancel => {
                tracing::debug!("session cancelled");
                outcome.cancelled = true;
            }
            Transition::Accept(None) => {
                tracing::debug!("accept with nothing to launch");
            }
            Transition::Accept(Some(request)) => {
                match launcher.spawn_detached(&request.command) {
                    Ok(()) => {
                        tracing::info!(command = %request.command, "launched");
                        outcome.launched = Some(request.command);
                    }
                    Err(error) => {
                        tracing::error!(command = %request.command, %error, "launch failed");
                        outcome.launch_error = Some(error);
                    }
                }
            }
        }
    }

    Ok(outcome)
}

fn draw<R: Renderer>(
    state: &SessionState<'_>,
    prompt: &str,
    renderer: &mut R,
) -> Result<(), TerminalError> {
    renderer.render(
        prompt,
        state.input(),
        state.matches(),
        state.highlighted_index(),
    )
}

/// Loads config, discovers candidates, runs the terminal session and reports
/// a failed launch once the terminal is restored.
pub fn run_with_options(options: CliOptions) -> Result<(), RuntimeError> {
    let config = load_config(&options)?;

    if options.write_default_config {
        config::save(&config)?;
        println!(
            "[qlaunch] wrote config to {}",
            config.config_path.display()
        );
        return Ok(());
    }

    tracing::info!(
        config_path = %config.config_path.display(),
        max_input_len = config.limits.max_input_len,
        max_candidates = config.limits.max_candidates,
        "startup"
    );

    let provider: Box<dyn CandidateEnumerator> = match PathDiscoveryProvider::from_env() {
        Ok(provider) => Box::new(provider),
        Err(error) => Box::new(UnavailableProvider::new(error)),
    };
    let store = CandidateStore::load(provider.as_ref(), config.limits.max_candidates);
    tracing::info!(candidates = store.len(), "candidates loaded");

    let mut bar = TerminalBar::open(
        BarColors::from_config(&config.colors),
        config.geometry.horz_padding,
    )?;
    let mut state = SessionState::new(&store, config.limits.max_input_len);
    let outcome = run_session(&mut state, &config.prompt, &mut bar, &mut DetachedLauncher)?;

    if let Some(error) = outcome.launch_error {
        eprintln!("[qlaunch] {error}");
    }
    Ok(())
}

/// Reads the config file and applies command-line overrides.
pub fn load_config(options: &CliOptions) -> Result<Config, RuntimeError> {
    let mut config = config::load(options.config.as_deref())?;
    if let Some(prompt) = &options.prompt {
        config.prompt = prompt.clone();
    }
    config::validate(&config)?;
    Ok(config)
}
