use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// rload: inspect component scripts and load component graphs
#[derive(Parser, Debug)]
#[command(name = "rload", version, about = "Component loader toolkit")]
pub struct CliArgs {
    /// Project file to read settings from (defaults to ./rload.json when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Disable colored error output
    #[arg(long = "noColor", alias = "no-color", global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print the masked regions (strings, comments, regexes, template text) of a script
    Scan {
        file: PathBuf,

        /// Print the regions as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print a script with every masked region blanked out
    Erase { file: PathBuf },

    /// Print the require() targets that appear in code
    Requires { file: PathBuf },

    /// Print the source map of a component's script
    Sourcemap {
        component: PathBuf,

        /// One mapping segment per line instead of per character
        #[arg(long)]
        coarse: bool,

        /// Number of generated lines that precede the script
        #[arg(long)]
        offset: Option<usize>,

        /// Print a data URI instead of JSON
        #[arg(long)]
        url: bool,
    },

    /// Load a component and print its import tree
    Deps {
        component: String,

        /// Base URL for non-relative identifiers
        #[arg(long = "baseUrl", alias = "base-url")]
        base_url: Option<String>,

        /// Build every import, even ones seen before
        #[arg(long = "noCache", alias = "no-cache")]
        no_cache: bool,
    },
}
