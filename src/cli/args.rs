use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use asc_units::Flavor;

/// CLI arguments for the asc binary.
#[derive(Parser, Debug)]
#[command(name = "asc", version, about = "ActionScript 3 compiler front end")]
pub struct CliArgs {
    /// Project configuration (JSON). Flags below override it.
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Language flavor; `royale` applies the [Bindable] rewrite.
    #[arg(long, value_enum, ignore_case = true)]
    pub flavor: Option<FlavorArg>,

    /// Parse function bodies eagerly.
    #[arg(long = "no-defer")]
    pub no_defer: bool,

    /// Source root; files below it define the qname their path spells.
    #[arg(long = "source-path", value_name = "DIR")]
    pub source_path: Vec<PathBuf>,

    /// Library source compiled at the lowest definition priority.
    #[arg(long = "library", value_name = "FILE")]
    pub library: Vec<PathBuf>,

    /// Report unresolved identifiers in function bodies as warnings.
    #[arg(long)]
    pub strict: bool,

    /// Build units one at a time.
    #[arg(long)]
    pub sequential: bool,

    /// Print the syntax tree of every source file as JSON and stop.
    #[arg(long = "dump-ast")]
    pub dump_ast: bool,

    /// Print problems as JSON.
    #[arg(long)]
    pub json: bool,

    /// Colorize text output (default: when stdout is a terminal).
    #[arg(long)]
    pub pretty: Option<bool>,

    /// Source files.
    #[arg(value_name = "FILES")]
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FlavorArg {
    Royale,
    Flash,
}

impl From<FlavorArg> for Flavor {
    fn from(value: FlavorArg) -> Flavor {
        match value {
            FlavorArg::Royale => Flavor::Royale,
            FlavorArg::Flash => Flavor::Flash,
        }
    }
}
