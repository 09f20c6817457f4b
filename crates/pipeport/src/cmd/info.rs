use crate::cmd::InfoArgs;
use crate::exit::{port_error, CliResult, SUCCESS};
use crate::output::{print_geometry, Geometry, OutputFormat};

pub fn run(args: InfoArgs, format: OutputFormat) -> CliResult<i32> {
    let audio = args.audio.format();
    audio
        .validate()
        .map_err(|err| port_error("invalid format", err))?;
    let ptime = args.audio.ptime()?;

    let geometry = Geometry::new(audio, audio.samples_per_frame(ptime));
    print_geometry(&geometry, format);
    Ok(SUCCESS)
}
