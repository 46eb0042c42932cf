use clap::Parser;
use log::LevelFilter;
use lithdat_utils::{ok, AnyResult};

fn main() -> AnyResult {
    let cli = lithdat_dump::Cli::parse_from(wild::args());

    pretty_env_logger::formatted_builder()
        .format_indent(None)
        .format_timestamp(None)
        .filter_level(match cli.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        })
        .init();

    lithdat_dump::run(cli)?;
    ok()
}
