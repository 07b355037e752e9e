use anyhow::Result;
use clap::Parser;
use parley::mic::MicMode;
use parley::plugins::{PluginCatalog, PluginRegistry};
use parley::profile::ConsolePrompt;
use parley::{bootstrap, BootstrapOptions};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Parley voice assistant
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Use text input and output instead of audio devices
    #[arg(long, conflicts_with = "batch")]
    local: bool,

    /// Replay commands from a file, one per line
    #[arg(long, value_name = "FILE")]
    batch: Option<PathBuf>,

    /// Rerun the profile questionnaire
    #[arg(long)]
    repopulate: bool,

    /// Print what was heard and said
    #[arg(long)]
    print_transcript: bool,

    /// List installed plugins and exit
    #[arg(long)]
    list_plugins: bool,

    /// List audio devices and exit
    #[arg(long)]
    list_audio_devices: bool,

    /// Verbose logging
    #[arg(long)]
    debug: bool,

    /// Support directory holding configs/profile.toml
    #[arg(long, value_name = "DIR")]
    config_dir: Option<PathBuf>,
}

impl Cli {
    fn options(&self) -> BootstrapOptions {
        let mic_mode = match (&self.batch, self.local) {
            (Some(path), _) => MicMode::Batch(path.clone()),
            (None, true) => MicMode::Text,
            (None, false) => MicMode::Live,
        };
        BootstrapOptions {
            config_dir: self.config_dir.clone(),
            mic_mode,
            repopulate: self.repopulate,
            print_transcript: self.print_transcript,
        }
    }
}

fn run(cli: &Cli) -> parley::Result<()> {
    let catalog: Arc<dyn PluginCatalog> = Arc::new(PluginRegistry::with_builtins());

    // The prompt holds stdin and must be released before the conversation reads it
    let mut assistant = {
        let mut prompt = ConsolePrompt::stdio();
        bootstrap(&cli.options(), catalog, &mut prompt)?
    };

    if cli.list_plugins {
        assistant.list_plugins();
        return Ok(());
    }
    if cli.list_audio_devices {
        return assistant.list_audio_devices();
    }
    assistant.run()
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.debug {
        "parley=debug,info"
    } else {
        "parley=info,warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Parley voice assistant");

    if let Err(e) = run(&cli) {
        error!("{}", e);
        eprintln!("{}", e.user_message());
        std::process::exit(1);
    }
    Ok(())
}
