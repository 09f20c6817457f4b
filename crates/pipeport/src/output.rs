use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use pipeport_port::{AudioFormat, PortInfo};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// Where a report goes. PCM on stdout pushes reports to stderr.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportStream {
    Stdout,
    Stderr,
}

/// Frame geometry derived from a port's format.
#[derive(Serialize)]
pub struct Geometry {
    pub sample_rate: u32,
    pub channels: u16,
    pub alaw: bool,
    pub samples_per_frame: usize,
    pub frame_time_usec: u64,
    pub pcm_frame_bytes: usize,
    pub wire_frame_bytes: usize,
    pub avg_bps: u64,
}

impl Geometry {
    pub fn new(format: AudioFormat, samples_per_frame: usize) -> Self {
        Self {
            sample_rate: format.sample_rate,
            channels: format.channel_count,
            alaw: format.companded,
            samples_per_frame,
            frame_time_usec: format.frame_time_usec(samples_per_frame),
            pcm_frame_bytes: format.pcm_frame_bytes(samples_per_frame),
            wire_frame_bytes: format.wire_frame_bytes(samples_per_frame),
            avg_bps: format.avg_bps(),
        }
    }

    pub fn from_info(info: &PortInfo) -> Self {
        Self::new(info.format, info.samples_per_frame)
    }
}

/// What a play/record/tone session moved.
#[derive(Serialize)]
pub struct SessionSummary {
    pub command: &'static str,
    pub pipe: String,
    pub frames: u64,
    pub samples: u64,
    pub pipe_bytes: u64,
    pub end_of_stream: bool,
    pub interrupted: bool,
    #[serde(flatten)]
    pub geometry: Geometry,
}

pub fn print_geometry(geometry: &Geometry, format: OutputFormat) {
    let rows = geometry_rows(geometry);
    emit(&rows, geometry, format, ReportStream::Stdout);
}

pub fn print_summary(summary: &SessionSummary, format: OutputFormat, stream: ReportStream) {
    let mut rows = vec![
        ("command", summary.command.to_string()),
        ("pipe", summary.pipe.clone()),
        ("frames", summary.frames.to_string()),
        ("samples", summary.samples.to_string()),
        ("pipe_bytes", summary.pipe_bytes.to_string()),
        ("end_of_stream", summary.end_of_stream.to_string()),
        ("interrupted", summary.interrupted.to_string()),
    ];
    rows.extend(geometry_rows(&summary.geometry));
    emit(&rows, summary, format, stream);
}

fn geometry_rows(geometry: &Geometry) -> Vec<(&'static str, String)> {
    vec![
        ("sample_rate", geometry.sample_rate.to_string()),
        ("channels", geometry.channels.to_string()),
        ("alaw", geometry.alaw.to_string()),
        ("samples_per_frame", geometry.samples_per_frame.to_string()),
        ("frame_time_usec", geometry.frame_time_usec.to_string()),
        ("pcm_frame_bytes", geometry.pcm_frame_bytes.to_string()),
        ("wire_frame_bytes", geometry.wire_frame_bytes.to_string()),
        ("avg_bps", geometry.avg_bps.to_string()),
    ]
}

fn emit<T: Serialize>(
    rows: &[(&'static str, String)],
    value: &T,
    format: OutputFormat,
    stream: ReportStream,
) {
    let text = match format {
        OutputFormat::Json => serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string()),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FIELD", "VALUE"]);
            for (field, value) in rows {
                table.add_row(vec![field.to_string(), value.clone()]);
            }
            table.to_string()
        }
        OutputFormat::Pretty => rows
            .iter()
            .map(|(field, value)| format!("{field}={value}"))
            .collect::<Vec<_>>()
            .join(" "),
    };

    match stream {
        ReportStream::Stdout => {
            let mut out = std::io::stdout();
            let _ = writeln!(out, "{text}");
            let _ = out.flush();
        }
        ReportStream::Stderr => {
            let _ = writeln!(std::io::stderr(), "{text}");
        }
    }
}
