//! `lithdat_dump` - command line inspector for LithTech world files
//!
//! Decodes a world file with the `lithdat` crate, and prints parts of it in a readable form.

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use commands::{dump::DumpCommand, info::InfoCommand, objects::ObjectsCommand};
use lithdat::{DecodeOptions, SectionFlags, WorldDocument};
use lithdat_utils::{ok, AnyResult, AnyhowResultExt};
use log::{debug, warn};
use std::{fs::File, io::BufReader, path::PathBuf};

pub mod commands;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Prints decoding progress. Can be repeated for more detail.
    #[arg(long, short = 'v', global = true, action = ArgAction::Count)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Subcommand)]
pub enum CliCommand {
    /// Prints the header, section offsets and a summary of every section
    Info(InfoCommand),
    /// Lists world objects and their properties
    Objects(ObjectsCommand),
    /// Dumps the whole decoded document
    Dump(DumpCommand),
}

pub trait Command {
    fn run(self) -> AnyResult;
}

/// Runs `lithdat_dump` as if it was ran from the command line.
pub fn run(cli: Cli) -> AnyResult {
    match cli.command {
        CliCommand::Info(c) => c.run()?,
        CliCommand::Objects(c) => c.run()?,
        CliCommand::Dump(c) => c.run()?,
    }
    ok()
}

/// Sections that can be skipped with `--defer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DeferArg {
    /// World info and world tree
    WorldTree,
    LightGrid,
    Collision,
    ParticleBlockers,
    RenderData,
}

impl From<DeferArg> for SectionFlags {
    fn from(value: DeferArg) -> Self {
        match value {
            DeferArg::WorldTree => SectionFlags::WORLD_TREE,
            DeferArg::LightGrid => SectionFlags::LIGHT_GRID,
            DeferArg::Collision => SectionFlags::COLLISION,
            DeferArg::ParticleBlockers => SectionFlags::PARTICLE_BLOCKERS,
            DeferArg::RenderData => SectionFlags::RENDER_DATA,
        }
    }
}

/// Input file and decoding options, shared by every command.
#[derive(Args)]
pub struct WorldArgs {
    /// Path to the world file
    pub file: PathBuf,
    /// Treats every decoding warning as an error
    #[arg(long)]
    pub strict: bool,
    /// Sections to locate, but not decode
    #[arg(long, value_enum, value_delimiter = ',')]
    pub defer: Vec<DeferArg>,
}

impl WorldArgs {
    pub fn options(&self) -> DecodeOptions {
        let deferred = self
            .defer
            .iter()
            .fold(SectionFlags::empty(), |flags, &arg| flags | arg.into());

        DecodeOptions {
            strict: self.strict,
            deferred,
        }
    }

    /// Opens and decodes the world, reporting decoding warnings through the log.
    pub fn load(&self) -> AnyResult<WorldDocument> {
        let path = self.file.display();
        let file = File::open(&self.file).otherwise(format!("couldn't open {path}"))?;

        debug!("decoding {path} with {:?}", self.options());
        let world = WorldDocument::decode_with(BufReader::new(file), self.options())
            .otherwise(format!("couldn't decode {path}"))?;

        for warning in &world.warnings {
            warn!("{path}: {warning}");
        }
        Ok(world)
    }
}

#[cfg(test)]
mod tests {
    use super::{Cli, CliCommand};
    use clap::{CommandFactory, Parser};
    use lithdat::SectionFlags;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defer_flags_accumulate() {
        let cli = Cli::parse_from([
            "lithdat_dump",
            "info",
            "world.dat",
            "--strict",
            "--defer",
            "render-data,light-grid",
            "--defer",
            "world-tree",
        ]);

        let CliCommand::Info(info) = cli.command else {
            panic!("expected the info command");
        };
        let options = info.world.options();
        assert!(options.strict);
        assert_eq!(
            options.deferred,
            SectionFlags::RENDER_DATA | SectionFlags::LIGHT_GRID | SectionFlags::WORLD_TREE
        );
    }

    #[test]
    fn verbosity_counts() {
        let cli = Cli::parse_from(["lithdat_dump", "dump", "-vv", "world.dat"]);
        assert_eq!(cli.verbose, 2);
    }
}
