use std::fs::File;
use std::io::{BufWriter, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use pipeport_port::{Frame, MediaPort, PipePlayerPort, PortError, PortInfo};
use tracing::{debug, info};

use crate::clock::FrameClock;
use crate::cmd::{install_ctrlc_handler, PlayArgs};
use crate::exit::{io_error, port_error, CliResult, SUCCESS};
use crate::output::{print_summary, Geometry, OutputFormat, ReportStream, SessionSummary};

pub fn run(args: PlayArgs, format: OutputFormat) -> CliResult<i32> {
    let ptime = args.audio.ptime()?;
    let mut port = PipePlayerPort::create_with_ptime(args.pipe.as_path(), args.audio.format(), ptime)
        .map_err(|err| port_error("open failed", err))?;

    let eof_seen = Arc::new(AtomicBool::new(false));
    {
        let eof_seen = Arc::clone(&eof_seen);
        port.set_eof_callback(move |info: &PortInfo| {
            info!(port = %info.name, "player drained");
            eof_seen.store(true, Ordering::SeqCst);
        })
        .map_err(|err| port_error("register eof handler", err))?;
    }

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let (mut out, stream): (Box<dyn Write>, ReportStream) = match &args.output {
        Some(path) => {
            let file = File::create(path).map_err(|err| {
                io_error(&format!("failed creating {}", path.display()), err)
            })?;
            (Box::new(BufWriter::new(file)), ReportStream::Stdout)
        }
        None => (Box::new(std::io::stdout().lock()), ReportStream::Stderr),
    };

    let info = port.info().clone();
    let mut frame = Frame::with_capacity(info.pcm_frame_bytes());
    let mut clock = args
        .realtime
        .then(|| FrameClock::new(Duration::from_micros(info.frame_time_usec)));
    let mut frames = 0u64;
    let mut samples = 0u64;

    while running.load(Ordering::SeqCst) {
        if args.frames.is_some_and(|limit| frames >= limit) {
            break;
        }
        match port.get_frame(&mut frame) {
            Ok(()) => {}
            Err(PortError::EndOfStream) => break,
            Err(err) => {
                let _ = port.destroy();
                return Err(port_error("read failed", err));
            }
        }

        out.write_all(frame.payload())
            .map_err(|err| io_error("write output failed", err))?;
        frames += 1;
        samples += frame.sample_count() as u64;

        if let Some(clock) = clock.as_mut() {
            clock.wait();
        }
    }

    out.flush()
        .map_err(|err| io_error("flush output failed", err))?;
    port.destroy()
        .map_err(|err| port_error("close failed", err))?;
    debug!(frames, "player finished");

    let summary = SessionSummary {
        command: "play",
        pipe: args.pipe.display().to_string(),
        frames,
        samples,
        pipe_bytes: frames * info.wire_frame_bytes() as u64,
        end_of_stream: eof_seen.load(Ordering::SeqCst),
        interrupted: !running.load(Ordering::SeqCst),
        geometry: Geometry::from_info(&info),
    };
    print_summary(&summary, format, stream);
    Ok(SUCCESS)
}
