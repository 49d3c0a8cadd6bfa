use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use logistic_lab::{
    animation::PlaybackState,
    evaluator::HeadlessEvaluator,
    logging::init_tracing,
    particles::AsciiCanvas,
    session::{Session, UiAction},
    web::{self, WebServerConfig},
    LabConfig,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Logistic growth lab")]
struct Cli {
    /// Path to the lab configuration YAML file
    #[arg(long, default_value = "scenarios/classroom.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Play the animation headlessly and print the final state
    Run {
        /// Number of animation frames to play
        #[arg(long, default_value_t = 120)]
        ticks: u64,

        /// YAML list of UI actions to replay before playing
        #[arg(long)]
        script: Option<PathBuf>,

        /// Print the dot cloud as text
        #[arg(long)]
        ascii: bool,
    },
    /// Serve the session over HTTP
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
    /// Print the configured parameters as JSON
    Params,
}

fn load_config(path: &Path) -> Result<LabConfig> {
    if path.exists() {
        LabConfig::load(path)
    } else {
        Ok(LabConfig::classroom())
    }
}

fn load_script(path: &Path) -> Result<Vec<UiAction>> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read script {}", path.display()))?;
    serde_yaml::from_str(&data).with_context(|| format!("Failed to parse {}", path.display()))
}

fn run_headless(config: &LabConfig, ticks: u64, script: Option<PathBuf>, ascii: bool) -> Result<()> {
    let mut session = Session::new(config, HeadlessEvaluator::new());
    session.pump();

    if let Some(path) = script {
        let actions = load_script(&path)?;
        info!(count = actions.len(), "replaying script");
        for action in actions {
            session.apply(action);
            session.pump();
        }
    }

    if session.playback() != PlaybackState::Playing {
        session.apply(UiAction::TogglePlay);
    }
    for _ in 0..ticks {
        if session.animation_tick().is_none() {
            break;
        }
        session.pump();
    }

    let panel = session.panel();
    println!(
        "Session '{}' played {} frames. T = {}, N(T) = {}, slope = {}",
        config.name,
        ticks,
        panel.inputs.time,
        panel.population_label,
        panel.slope_label
    );

    if ascii {
        let mut canvas = AsciiCanvas::new(config.canvas.width, config.canvas.height, 60, 20);
        session.particles().draw(&mut canvas);
        print!("{}", canvas.render());
    }

    println!("{}", serde_json::to_string_pretty(&session.get_parameters())?);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;
    init_tracing(&config.logging);

    match cli.command {
        Command::Run {
            ticks,
            script,
            ascii,
        } => run_headless(&config, ticks, script, ascii),
        Command::Serve { host, port } => {
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(web::run(WebServerConfig {
                lab: config,
                host,
                port,
            }))
        }
        Command::Params => {
            println!("{}", serde_json::to_string_pretty(&config.parameters)?);
            Ok(())
        }
    }
}
