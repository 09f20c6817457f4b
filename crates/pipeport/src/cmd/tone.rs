use std::f64::consts::TAU;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use pipeport_port::{Frame, MediaPort, PipeWriterPort};
use tracing::debug;

use crate::clock::FrameClock;
use crate::cmd::{install_ctrlc_handler, ToneArgs};
use crate::exit::{port_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_summary, Geometry, OutputFormat, ReportStream, SessionSummary};

pub fn run(args: ToneArgs, format: OutputFormat) -> CliResult<i32> {
    if !(0.0..=1.0).contains(&args.amplitude) {
        return Err(CliError::new(USAGE, "--amplitude must be between 0 and 1"));
    }
    let audio = args.audio.format();
    let ptime = args.audio.ptime()?;
    let samples_per_frame = audio.samples_per_frame(ptime);

    let mut port = PipeWriterPort::create(args.pipe.as_path(), audio, samples_per_frame, None)
        .map_err(|err| port_error("open failed", err))?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let info = port.info().clone();
    let total_frames = args.duration_ms / args.audio.ptime_ms;
    let mut oscillator = Oscillator::new(
        args.frequency,
        args.amplitude,
        audio.sample_rate,
        usize::from(audio.channel_count),
    );
    let mut clock = args
        .realtime
        .then(|| FrameClock::new(Duration::from_micros(info.frame_time_usec)));
    let mut samples = vec![0i16; samples_per_frame];
    let mut frames = 0u64;

    while frames < total_frames && running.load(Ordering::SeqCst) {
        oscillator.fill(&mut samples);
        if let Err(err) = port.put_frame(&Frame::audio(&samples)) {
            let _ = port.destroy();
            return Err(port_error("write failed", err));
        }
        frames += 1;

        if let Some(clock) = clock.as_mut() {
            clock.wait();
        }
    }

    port.destroy()
        .map_err(|err| port_error("close failed", err))?;
    debug!(frames, "tone finished");

    let summary = SessionSummary {
        command: "tone",
        pipe: args.pipe.display().to_string(),
        frames,
        samples: frames * samples_per_frame as u64,
        pipe_bytes: frames * info.wire_frame_bytes() as u64,
        end_of_stream: frames == total_frames,
        interrupted: !running.load(Ordering::SeqCst),
        geometry: Geometry::from_info(&info),
    };
    print_summary(&summary, format, ReportStream::Stdout);
    Ok(SUCCESS)
}

/// Sine generator writing interleaved frames (same sample on every channel).
struct Oscillator {
    phase: f64,
    step: f64,
    scale: f64,
    channels: usize,
}

impl Oscillator {
    fn new(frequency: f64, amplitude: f64, sample_rate: u32, channels: usize) -> Self {
        Self {
            phase: 0.0,
            step: TAU * frequency / f64::from(sample_rate),
            scale: amplitude * f64::from(i16::MAX),
            channels: channels.max(1),
        }
    }

    fn fill(&mut self, samples: &mut [i16]) {
        for group in samples.chunks_mut(self.channels) {
            let value = (self.phase.sin() * self.scale).round() as i16;
            group.fill(value);
            self.phase = (self.phase + self.step) % TAU;
        }
    }
}
