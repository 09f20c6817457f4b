use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use pipeport_port::{Frame, MediaPort, PipeWriterPort};
use tracing::{debug, warn};

use crate::clock::FrameClock;
use crate::cmd::{install_ctrlc_handler, RecordArgs};
use crate::exit::{io_error, port_error, CliResult, SUCCESS};
use crate::output::{print_summary, Geometry, OutputFormat, ReportStream, SessionSummary};

pub fn run(args: RecordArgs, format: OutputFormat) -> CliResult<i32> {
    let audio = args.audio.format();
    let ptime = args.audio.ptime()?;
    let samples_per_frame = audio.samples_per_frame(ptime);

    let mut input: Box<dyn Read> = match &args.input {
        Some(path) => {
            let file = File::open(path).map_err(|err| {
                io_error(&format!("failed opening {}", path.display()), err)
            })?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(std::io::stdin().lock()),
    };

    let mut port = PipeWriterPort::create(
        args.pipe.as_path(),
        audio,
        samples_per_frame,
        args.buffer_size,
    )
    .map_err(|err| port_error("open failed", err))?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let info = port.info().clone();
    let mut chunk = vec![0u8; info.pcm_frame_bytes()];
    let mut clock = args
        .realtime
        .then(|| FrameClock::new(Duration::from_micros(info.frame_time_usec)));
    let mut frames = 0u64;
    let mut samples = 0u64;
    let mut pipe_bytes = 0u64;
    let mut end_of_stream = false;

    while running.load(Ordering::SeqCst) {
        let filled = fill(&mut input, &mut chunk)
            .map_err(|err| io_error("read input failed", err))?;
        if filled < chunk.len() {
            if filled > 0 {
                warn!(bytes = filled, "dropping partial trailing frame");
            }
            end_of_stream = true;
            break;
        }

        let frame = Frame::audio_bytes(&chunk);
        if let Err(err) = port.put_frame(&frame) {
            let _ = port.destroy();
            return Err(port_error("write failed", err));
        }
        frames += 1;
        samples += frame.sample_count() as u64;
        pipe_bytes += info.wire_frame_bytes() as u64;

        if let Some(clock) = clock.as_mut() {
            clock.wait();
        }
    }

    port.destroy()
        .map_err(|err| port_error("close failed", err))?;
    debug!(frames, "writer finished");

    let summary = SessionSummary {
        command: "record",
        pipe: args.pipe.display().to_string(),
        frames,
        samples,
        pipe_bytes,
        end_of_stream,
        interrupted: !running.load(Ordering::SeqCst),
        geometry: Geometry::from_info(&info),
    };
    print_summary(&summary, format, ReportStream::Stdout);
    Ok(SUCCESS)
}

/// Read until `buf` is full or the input ends; returns the bytes read.
fn fill<R: Read>(input: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0usize;
    while filled < buf.len() {
        match input.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
    Ok(filled)
}
