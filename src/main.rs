// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::error::Error;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use clacker::audio::{self, AudioMixer};
use clacker::config::{self, Settings};
use clacker::engine::SoundEngine;
use clacker::input::{self, CaptureError, InputCaptureAdapter};
use clacker::pack::{self, PackInfo};
use clacker::samples::{PackLoader, SoundCategory};
use clap::{crate_version, Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "Mechanical keyboard sounds for every key press."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start plays key sounds until interrupted. SIGHUP reloads the pack.
    Start {
        /// The path to the settings file.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// The sound pack to load, by display name or directory name.
        #[arg(short, long)]
        pack: Option<String>,
        /// The directory containing the sound packs.
        #[arg(long)]
        packs_dir: Option<PathBuf>,
        /// The key capture backend: rdev, stdin or mock.
        #[arg(short, long)]
        input: Option<String>,
    },
    /// Lists the sound packs in the given directory.
    Packs {
        /// The directory containing the sound packs.
        path: PathBuf,
    },
    /// Lists the available audio output devices.
    Devices {},
    /// Plays a single sound file once.
    Preview {
        /// The WAV file to play.
        path: PathBuf,
        /// The device name to play through.
        #[arg(short, long)]
        device: Option<String>,
        /// The volume, from 0.0 to 2.0.
        #[arg(short, long)]
        volume: Option<f32>,
    },
    /// Loads a sound pack without playing it and prints what it contains.
    Verify {
        /// The sound pack directory.
        path: PathBuf,
        /// Skip pitch variants even if the pack asks for them.
        #[arg(long)]
        no_variants: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Start {
            config,
            pack,
            packs_dir,
            input,
        } => {
            let mut settings = match config {
                Some(path) => Settings::load(&path)?,
                None => Settings::default(),
            };
            if let Some(pack) = pack {
                settings.set_sound_pack(&pack);
            }
            if let Some(packs_dir) = packs_dir {
                settings.set_packs_directory(packs_dir);
            }
            if let Some(input) = input {
                settings.set_input(&input);
            }

            start(settings).await?;
        }
        Commands::Packs { path } => {
            let packs = pack::discover_packs(&path)?;

            if packs.is_empty() {
                println!("No sound packs found in {}.", path.display());
                return Ok(());
            }

            println!("Sound packs (count: {}):", packs.len());
            for pack in packs {
                println!("- {}", pack);
            }
        }
        Commands::Devices {} => {
            let devices = audio::list_devices()?;

            if devices.is_empty() {
                println!("No devices found.");
                return Ok(());
            }

            println!("Devices:");
            for device in devices {
                println!("- {}", device);
            }
        }
        Commands::Preview {
            path,
            device,
            volume,
        } => {
            let audio_config = config::Audio::new(device.as_deref().unwrap_or("default"));
            let mixer = AudioMixer::new(audio_config.sample_rate());
            let output = audio::open_output(&audio_config, mixer.clone())?;
            let engine = SoundEngine::new(input::create_adapter("mock")?, mixer, Some(output));
            if let Some(volume) = volume {
                engine.set_volume(volume);
            }

            let duration = engine.preview_one_shot(&path)?;
            // Give the device time to drain its buffers.
            tokio::time::sleep(duration + audio_config.buffer_duration() * 2).await;
            engine.dispose();
        }
        Commands::Verify { path, no_variants } => {
            let pack = PackInfo::load_or_default(&path);
            let wants_variants = pack.has_pitch_variants() && !no_variants;
            let bank = PackLoader::new(config::Audio::default().sample_rate())
                .load(&path, wants_variants)?;

            println!("{}", pack);
            if let Some(cover) = pack.resolved_cover_image() {
                println!("Cover image: {}", cover.display());
            }
            println!("Standard key: {} variant(s)", bank.standard().len());
            for category in SoundCategory::ALL.iter().skip(1) {
                println!(
                    "- {}: {}",
                    category,
                    if bank.has_dedicated(*category) {
                        "dedicated"
                    } else {
                        "standard key sound"
                    }
                );
            }
            println!("Memory: {} KiB", bank.memory_size() / 1024);
        }
    }

    Ok(())
}

/// Runs the engine until Ctrl-C.
async fn start(settings: Settings) -> Result<(), Box<dyn Error>> {
    let adapter = create_adapter(settings.input())?;
    let mixer = AudioMixer::new(settings.audio().sample_rate());
    let output = audio::open_output(settings.audio(), mixer.clone())?;
    let engine = Arc::new(SoundEngine::new(adapter, mixer, Some(output)));
    engine.set_volume(settings.volume());

    let events = engine.subscribe();
    tokio::task::spawn_blocking(move || {
        // Ends when the engine is disposed.
        for event in events.iter() {
            info!(event = ?event, "Engine event");
        }
    });

    let packs_directory = settings.packs_directory();
    let pack = pack::find_pack(&packs_directory, settings.sound_pack())?.ok_or_else(|| {
        format!(
            "sound pack {} not found in {}",
            settings.sound_pack(),
            packs_directory.display()
        )
    })?;

    let loader = engine.clone();
    tokio::task::spawn_blocking(move || loader.load_pack_info(&pack)).await??;
    engine.set_enabled(settings.enabled())?;

    let mut hangup = Hangup::new()?;
    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result?;
                info!("Interrupted, shutting down");
                break;
            }
            _ = hangup.recv() => {
                let Some(directory) = engine.current_pack() else {
                    continue;
                };
                info!(path = ?directory, "Reloading sound pack");
                let reloader = engine.clone();
                match tokio::task::spawn_blocking(move || reloader.reload(&directory)).await? {
                    Ok(()) => {}
                    Err(e) => error!(err = %e, "Reload failed, keeping the previous pack"),
                }
            }
        }
    }

    engine.dispose();
    Ok(())
}

/// Creates the configured capture adapter, falling back to stdin when the
/// global hook isn't compiled in.
fn create_adapter(name: &str) -> Result<Arc<dyn InputCaptureAdapter>, Box<dyn Error>> {
    match input::create_adapter(name) {
        Ok(adapter) => Ok(adapter),
        Err(CaptureError::Unavailable(name)) => {
            warn!(
                input = name,
                "Key capture backend not available, reading key names from stdin"
            );
            Ok(input::create_adapter("stdin")?)
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(unix)]
struct Hangup(tokio::signal::unix::Signal);

#[cfg(unix)]
impl Hangup {
    fn new() -> Result<Hangup, io::Error> {
        Ok(Hangup(tokio::signal::unix::signal(
            tokio::signal::unix::SignalKind::hangup(),
        )?))
    }

    async fn recv(&mut self) {
        self.0.recv().await;
    }
}

#[cfg(not(unix))]
struct Hangup;

#[cfg(not(unix))]
impl Hangup {
    fn new() -> Result<Hangup, io::Error> {
        Ok(Hangup)
    }

    async fn recv(&mut self) {
        std::future::pending::<()>().await
    }
}
