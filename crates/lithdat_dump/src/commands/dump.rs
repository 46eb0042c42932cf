use crate::WorldArgs;
use clap::{Args, ValueEnum};
use lithdat_utils::{ok, AnyResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DumpFormat {
    /// Rust debug representation
    Debug,
    /// TOML document, with blobs summarized
    Toml,
}

#[derive(Args)]
pub struct DumpCommand {
    #[command(flatten)]
    pub world: WorldArgs,
    #[arg(long, value_enum, default_value_t = DumpFormat::Debug)]
    pub format: DumpFormat,
}

impl crate::Command for DumpCommand {
    fn run(self) -> AnyResult {
        let world = self.world.load()?;

        match self.format {
            DumpFormat::Debug => println!("{world:#?}"),
            DumpFormat::Toml => print!("{}", toml::to_string_pretty(&world)?),
        }
        ok()
    }
}
