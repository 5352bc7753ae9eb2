use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use voxshift::audio::AudioFormat;
use voxshift::cli::{Cli, Commands, ConfigAction, VoicesAction};
use voxshift::client::{ApiClient, AudioFile};
use voxshift::config::Config;
use voxshift::output;
use voxshift::tts::VoiceReference;
use voxshift::voices::VoiceCatalog;

#[tokio::main]
async fn main() -> Result<()> {
    let Cli {
        command,
        config,
        quiet,
        verbose,
        server,
        timeout,
    } = Cli::parse();
    init_tracing(quiet, verbose);

    match command {
        Commands::Serve {
            bind,
            storage,
            in_memory,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            if let Some(dir) = storage {
                config.storage.dir = Some(dir);
                config.storage.in_memory = false;
            }
            if in_memory {
                config.storage.in_memory = true;
            }
            voxshift::server::run_server(config).await?;
        }
        Commands::Upload { file } => {
            let client = connect(&server, timeout)?;
            let response = client.upload_audio(read_audio(&file).await?).await?;
            println!("{}", response.audio_id.bold());
        }
        Commands::Transcribe { file, audio_id } => {
            let client = connect(&server, timeout)?;
            let transcript = match (file, audio_id) {
                (Some(file), _) => client.transcribe_file(read_audio(&file).await?).await?,
                (None, Some(id)) => client.transcribe_id(&id).await?,
                (None, None) => anyhow::bail!("Provide an audio file or --audio-id"),
            };
            if !quiet {
                eprintln!("{} {}", "audio:".dimmed(), transcript.audio_id);
            }
            println!("{}", output::format_transcript(&transcript));
        }
        Commands::Synthesize {
            text,
            voice,
            reference_audio,
            out,
        } => {
            let reference = VoiceReference::from_fields(reference_audio.as_deref(), voice.as_deref())?;
            let client = connect(&server, timeout)?;
            let response = client.synthesize(&text, &reference).await?;
            println!("{}", response.audio_id.bold());
            if let Some(out) = out {
                let download = client.download(&response.audio_id).await?;
                write_output(&out, &download.bytes).await?;
                if !quiet {
                    eprintln!("{} {}", "Saved".green(), out.display());
                }
            }
        }
        Commands::Download { id, out } => {
            let client = connect(&server, timeout)?;
            let download = client.download(&id).await?;
            let path = out.unwrap_or_else(|| {
                PathBuf::from(download.file_name.clone().unwrap_or_else(|| format!("{id}.bin")))
            });
            write_output(&path, &download.bytes).await?;
            if !quiet {
                eprintln!(
                    "{} {} ({} bytes)",
                    "Saved".green(),
                    path.display(),
                    download.bytes.len()
                );
            }
        }
        Commands::Status => {
            let client = connect(&server, timeout)?;
            match client.health().await {
                Ok(health) => println!("{}", output::format_health(&health)),
                Err(e) => {
                    eprintln!("{} {}: {}", "Server unavailable".red(), server, e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Voices { action } => handle_voices_command(action)?,
        Commands::Config { action } => handle_config_command(action, config.as_deref())?,
        Commands::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "voxshift",
                &mut std::io::stdout(),
            );
        }
    }

    Ok(())
}

/// Log level from `-q`/`-v`, unless `VOXSHIFT_LOG` or `RUST_LOG` is set.
fn init_tracing(quiet: bool, verbose: u8) {
    let level = match (quiet, verbose) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    let filter = std::env::var("VOXSHIFT_LOG")
        .ok()
        .and_then(|v| EnvFilter::try_new(v).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(format!("warn,voxshift={level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Load configuration from file or use defaults.
///
/// Priority order:
/// 1. Custom config path from CLI (--config)
/// 2. Default config path (~/.config/voxshift/config.toml)
/// 3. Built-in defaults with environment variable overrides
fn load_config(custom_path: Option<&Path>) -> Result<Config> {
    let config = match custom_path {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::load_or_default(&Config::default_path())?,
    };
    Ok(config.with_env_overrides())
}

fn connect(server: &str, timeout: Duration) -> Result<ApiClient> {
    Ok(ApiClient::with_timeout(server, timeout)?)
}

async fn read_audio(path: &Path) -> Result<AudioFile> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "audio".to_string());
    let mime = AudioFormat::sniff(&bytes).map(|format| format.mime());
    let file = AudioFile::new(bytes, name);
    Ok(match mime {
        Some(mime) => file.with_mime(mime),
        None => file,
    })
}

async fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    tokio::fs::write(path, bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// Browse the built-in catalog without a server.
fn handle_voices_command(action: VoicesAction) -> Result<()> {
    let catalog = VoiceCatalog::with_builtins();
    match action {
        VoicesAction::List => println!("{}", output::format_voice_list(&catalog.list())),
        VoicesAction::Search { query } => {
            let results = catalog.search(&query)?;
            if results.is_empty() {
                eprintln!("{} '{}'", "No voices match".yellow(), query);
            } else {
                println!("{}", output::format_voice_list(&results));
            }
        }
        VoicesAction::Show { id } => println!("{}", output::format_voice(&catalog.get(&id)?)),
    }
    Ok(())
}

fn handle_config_command(action: ConfigAction, custom_path: Option<&Path>) -> Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let config = load_config(custom_path)?;
            println!("{}", config.get_value_by_path(&key)?);
        }
        ConfigAction::Dump => {
            let config = load_config(custom_path)?;
            print!("{}", config.to_display_toml()?);
        }
        ConfigAction::Path => {
            let path = custom_path
                .map(Path::to_path_buf)
                .unwrap_or_else(Config::default_path);
            println!("{}", path.display());
        }
    }
    Ok(())
}
