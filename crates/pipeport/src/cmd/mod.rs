use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Subcommand};
use pipeport_port::AudioFormat;

use crate::exit::{CliError, CliResult, INTERNAL, USAGE};
use crate::output::OutputFormat;

pub mod info;
pub mod play;
pub mod record;
pub mod tone;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Read frames from a pipe and write the PCM out.
    Play(PlayArgs),
    /// Feed raw PCM into a pipe frame by frame.
    Record(RecordArgs),
    /// Write a sine tone into a pipe.
    Tone(ToneArgs),
    /// Show frame geometry for a format.
    Info(InfoArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Play(args) => play::run(args, format),
        Command::Record(args) => record::run(args, format),
        Command::Tone(args) => tone::run(args, format),
        Command::Info(args) => info::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Format negotiated for the port.
#[derive(Args, Debug, Clone)]
pub struct AudioArgs {
    /// Sample rate in Hz.
    #[arg(long, default_value_t = 8000, env = "PIPEPORT_RATE")]
    pub rate: u32,
    /// Channel count (1 or 2).
    #[arg(long, default_value_t = 1, env = "PIPEPORT_CHANNELS")]
    pub channels: u16,
    /// Carry 8-bit A-law on the pipe instead of 16-bit PCM.
    #[arg(long)]
    pub alaw: bool,
    /// Frame period in milliseconds.
    #[arg(long, default_value_t = 20)]
    pub ptime_ms: u64,
}

impl AudioArgs {
    pub fn format(&self) -> AudioFormat {
        AudioFormat::pcm16(self.rate, self.channels).with_companding(self.alaw)
    }

    pub fn ptime(&self) -> CliResult<Duration> {
        if self.ptime_ms == 0 {
            return Err(CliError::new(USAGE, "--ptime-ms must be greater than zero"));
        }
        Ok(Duration::from_millis(self.ptime_ms))
    }
}

#[derive(Args, Debug)]
pub struct PlayArgs {
    /// Pipe (FIFO or file) to read from.
    pub pipe: PathBuf,
    #[command(flatten)]
    pub audio: AudioArgs,
    /// Write PCM here instead of stdout.
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
    /// Stop after N frames.
    #[arg(long)]
    pub frames: Option<u64>,
    /// Pace reads at the frame period instead of as fast as the pipe allows.
    #[arg(long)]
    pub realtime: bool,
}

#[derive(Args, Debug)]
pub struct RecordArgs {
    /// Pipe (FIFO or file) to write to.
    pub pipe: PathBuf,
    #[command(flatten)]
    pub audio: AudioArgs,
    /// Read raw 16-bit little-endian PCM from here instead of stdin.
    #[arg(long, short = 'i')]
    pub input: Option<PathBuf>,
    /// Conversion buffer capacity hint in bytes.
    #[arg(long)]
    pub buffer_size: Option<usize>,
    /// Pace writes at the frame period.
    #[arg(long)]
    pub realtime: bool,
}

#[derive(Args, Debug)]
pub struct ToneArgs {
    /// Pipe (FIFO or file) to write to.
    pub pipe: PathBuf,
    #[command(flatten)]
    pub audio: AudioArgs,
    /// Tone frequency in Hz.
    #[arg(long, default_value_t = 440.0)]
    pub frequency: f64,
    /// Amplitude as a fraction of full scale.
    #[arg(long, default_value_t = 0.5)]
    pub amplitude: f64,
    /// Tone length in milliseconds.
    #[arg(long, default_value_t = 1000)]
    pub duration_ms: u64,
    /// Pace writes at the frame period.
    #[arg(long)]
    pub realtime: bool,
}

#[derive(Args, Debug)]
pub struct InfoArgs {
    #[command(flatten)]
    pub audio: AudioArgs,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub(crate) fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
