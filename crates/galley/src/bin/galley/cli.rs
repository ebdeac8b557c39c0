//! galley cli interface

use clap::{Parser, Subcommand, ValueEnum};
use std::fmt::Formatter;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Change the work directory
    ///
    /// Can be specified multiple times. Note that all
    /// paths on the way to the final path must exist.
    ///
    /// This is equivalent to running { cd <directory>; galley ... }
    #[clap(short = 'C', long = "directory", global(true))]
    pub directory: Vec<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile recipe files into a shell script
    ///
    /// Reads HCL from stdin unless any other source is provided (via --input-*).
    /// The script is written to stdout.
    Compile(CompileCommand),

    /// Print debug information for development
    Dev(DevCommand),
}

#[derive(Parser, Debug)]
pub struct CompileCommand {
    #[clap(flatten)]
    pub input: InputArgs,

    #[clap(flatten)]
    pub node: NodeArgs,

    /// Start the script with `#!/bin/sh`
    #[clap(long = "shebang")]
    pub shebang: bool,
}

#[derive(Parser, Debug)]
pub struct InputArgs {
    /// Load recipe files from work directory
    #[clap(short = 'w', long = "input-workdir")]
    pub workdir: bool,

    /// Load a recipe file
    #[clap(short = 'f', long = "input-file")]
    pub files: Vec<PathBuf>,

    /// Load recipe files from given directory
    ///
    /// Only files ending in `galley.hcl` are loaded, ordered by name.
    #[clap(short = 'd', long = "input-dir")]
    pub directories: Vec<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct NodeArgs {
    /// Node data file (YAML or JSON), visible to recipes as `node`
    #[clap(short = 'n', long = "node")]
    pub node: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct OutputArgs {
    #[arg(short = 'F', long = "output-format", default_value_t)]
    pub format: OutputFormat,
}

#[derive(ValueEnum, Clone, Default, Debug)]
pub enum OutputFormat {
    Json,
    #[default]
    Yaml,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => f.write_str("json"),
            OutputFormat::Yaml => f.write_str("yaml"),
        }
    }
}

#[derive(Parser, Debug)]
pub struct DevCommand {
    #[clap(flatten)]
    pub input: InputArgs,

    #[clap(flatten)]
    pub node: NodeArgs,

    #[command(subcommand)]
    pub command: DevSubCommand,
}

#[derive(Subcommand, Debug)]
pub enum DevSubCommand {
    /// Loaded documents
    Documents,
    /// Declaration tree, before rendering
    Tree,
    /// Node data as seen by recipes
    Node(OutputArgs),
}
