// Fri Jan 16 2026 - Alex

use crate::config::{OutputFormat, Target};
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "struct-flattener")]
#[command(author = "Alex")]
#[command(version = "1.0.0")]
#[command(about = "Rewrites annotated struct declarations into flat, explicit-offset layouts", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true, default_value = "info")]
    pub log_level: String,

    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Flatten every struct marked [Flatten] in the input unit.
    Flatten(FlattenArgs),
    /// Print the computed layouts without rewriting anything.
    Inspect(InspectArgs),
}

/// Where declarations come from and how they are laid out.
#[derive(ClapArgs, Debug)]
pub struct SourceArgs {
    #[arg(short, long)]
    pub input: PathBuf,

    /// Units that only provide referenced declarations.
    #[arg(short, long = "aux")]
    pub aux: Vec<PathBuf>,

    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[arg(short, long, value_parser = parse_target)]
    pub target: Option<Target>,

    #[arg(short = 'D', long = "define")]
    pub defines: Vec<String>,

    /// Keep named nested structs behind a single `_Start` field.
    #[arg(long)]
    pub no_inline: bool,

    #[arg(long)]
    pub no_padding: bool,
}

#[derive(ClapArgs, Debug)]
pub struct FlattenArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[arg(short, long, value_parser = parse_format)]
    pub format: Option<OutputFormat>,

    /// Defaults to stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Also write every computed layout as JSON.
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Validate the result and check that re-flattening it is stable.
    #[arg(long)]
    pub verify: bool,
}

#[derive(ClapArgs, Debug)]
pub struct InspectArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Only show this struct (simple or fully qualified name).
    #[arg(long = "type")]
    pub type_name: Option<String>,

    /// Also list accessors.
    #[arg(long)]
    pub accessors: bool,
}

fn parse_target(s: &str) -> Result<Target, String> {
    s.parse().map_err(|e| format!("{}", e))
}

fn parse_format(s: &str) -> Result<OutputFormat, String> {
    s.parse().map_err(|e| format!("{}", e))
}

impl SourceArgs {
    pub fn validate(&self) -> Result<(), String> {
        if !self.input.exists() {
            return Err(format!("Input file does not exist: {:?}", self.input));
        }
        if let Some(missing) = self.aux.iter().find(|p| !p.exists()) {
            return Err(format!("Auxiliary file does not exist: {:?}", missing));
        }
        if let Some(config) = self.config.as_ref().filter(|p| !p.exists()) {
            return Err(format!("Config file does not exist: {:?}", config));
        }
        Ok(())
    }
}
