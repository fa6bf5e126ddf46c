//! Entry point for the console reader.
//!
//! Parses arguments, loads `conf/config.toml`, wires the reader runtime to
//! the audio output and progress store, then hands stdin and stdout to the
//! console front end.

mod console;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use console::Input;
use novel_reader_core::cache::{FileProgressStore, ProgressStore};
use novel_reader_core::config::{AppConfig, load_config};
use novel_reader_core::playback::{PlaybackRuntime, RodioOutput};
use novel_reader_core::reader::{Reader, ReaderCommand};
use novel_reader_core::speech::{SpeechRouter, find_voice};
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*, reload};

type ReloadHandle = reload::Handle<EnvFilter, tracing_subscriber::Registry>;

#[derive(Parser, Debug)]
#[command(name = "novel-reader", about = "Read documents aloud, phrase by phrase")]
struct Args {
    /// Document to open (txt, epub, pdf, docx, rtf).
    file: Option<PathBuf>,
    /// Start with the built-in sample novel.
    #[arg(long, conflicts_with = "file")]
    sample: bool,
    #[arg(long, default_value = "conf/config.toml")]
    config: PathBuf,
    /// Voice id, overriding the config.
    #[arg(long)]
    voice: Option<String>,
    #[arg(long)]
    speed: Option<f32>,
}

fn main() {
    let reload_handle = init_tracing();
    if let Err(err) = run(&reload_handle) {
        error!("{err:?}");
        std::process::exit(1);
    }
}

fn run(reload_handle: &ReloadHandle) -> Result<()> {
    let args = Args::parse();
    if let Some(path) = &args.file {
        if !path.is_file() {
            return Err(anyhow!("File not found: {}", path.display()));
        }
    }
    let config = apply_overrides(load_config(&args.config), &args);
    set_log_level(reload_handle, config.log_level.as_filter_str());
    info!(
        voice = %config.tts_voice,
        provider = %config.tts_provider,
        speed = config.tts_speed,
        words_per_page = config.words_per_page,
        "Starting reader"
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start the async runtime")?;
    runtime.block_on(serve(config, args));
    Ok(())
}

fn apply_overrides(mut config: AppConfig, args: &Args) -> AppConfig {
    if let Some(speed) = args.speed {
        config.tts_speed = speed;
    }
    if let Some(voice) = &args.voice {
        match find_voice(voice) {
            Some(option) => {
                config.tts_voice = option.id.to_string();
                config.tts_provider = option.provider;
            }
            None => warn!(%voice, "Unknown voice on the command line; keeping config voice"),
        }
    }
    config.normalized()
}

async fn serve(config: AppConfig, args: Args) {
    let store = FileProgressStore::new(&config.cache_dir);
    let startup = startup_command(&args, &store);
    let fetch_timeout = Duration::from_secs(config.request_timeout_secs);
    let router = SpeechRouter::from_config(&config);

    let (updates_tx, mut updates_rx) = mpsc::unbounded_channel();
    let (commands_tx, commands_rx) = mpsc::unbounded_channel();
    let mut runtime = PlaybackRuntime::new(
        Reader::new(config),
        router,
        Box::new(store),
        updates_tx,
        |events, generation| Box::new(RodioOutput::spawn(events, generation, fetch_timeout)),
    );

    let printer = tokio::spawn(async move {
        while let Some(update) = updates_rx.recv().await {
            if let Some(text) = console::render(&update) {
                println!("{text}");
            }
        }
    });

    println!("{}", console::HELP);
    if let Some(command) = startup {
        runtime.submit(command);
    }
    spawn_input(commands_tx.clone());
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received; shutting down");
            let _ = commands_tx.send(ReaderCommand::Quit);
        }
    });

    runtime.run(commands_rx).await;
    // Dropping the runtime closes the update channel and joins the audio thread.
    drop(runtime);
    let _ = printer.await;
}

/// What to open before the first command: the argument, the sample, or the
/// last document read when it is still on disk.
fn startup_command(args: &Args, store: &dyn ProgressStore) -> Option<ReaderCommand> {
    if args.sample {
        return Some(ReaderCommand::LoadSample);
    }
    if let Some(path) = &args.file {
        return Some(ReaderCommand::Open(path.clone()));
    }
    match store.last_source() {
        Ok(Some(name)) if Path::new(&name).is_file() => {
            info!(source = %name, "Reopening last document");
            Some(ReaderCommand::Open(PathBuf::from(name)))
        }
        Ok(_) => None,
        Err(err) => {
            warn!("Could not read the last document: {err}");
            None
        }
    }
}

/// Blocking stdin reader on its own thread; quits the reader on EOF.
fn spawn_input(commands: UnboundedSender<ReaderCommand>) {
    let spawned = thread::Builder::new()
        .name("console-input".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(err) => {
                        warn!("Failed to read input: {err}");
                        break;
                    }
                };
                match console::parse_line(&line) {
                    Ok(Input::Command(command)) => {
                        if commands.send(command).is_err() {
                            return;
                        }
                    }
                    Ok(Input::Help) => println!("{}", console::HELP),
                    Ok(Input::Voices) => println!("{}", console::voices_text()),
                    Ok(Input::Empty) => {}
                    Err(message) => println!("{message}"),
                }
            }
            let _ = commands.send(ReaderCommand::Quit);
        });
    if let Err(err) = spawned {
        warn!("Failed to start console input: {err}");
    }
}

fn init_tracing() -> ReloadHandle {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let (filter_layer, handle) = reload::Layer::new(env_filter);
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_filter(filter_layer),
        )
        .init();
    handle
}

fn set_log_level(handle: &ReloadHandle, level: &str) {
    let parsed = EnvFilter::builder()
        .parse(level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(err) = handle.modify(|filter| *filter = parsed.clone()) {
        warn!(%level, "Failed to update log level from config: {err}");
    } else {
        info!(%level, "Applied log level from config");
    }
}
