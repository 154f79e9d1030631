use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use heatmap_core::ScaleKind;
use std::path::PathBuf;

mod commands;
mod config;
mod error;

use config::Config;

#[derive(Parser)]
#[command(name = "heatmap")]
#[command(about = "Clustered heatmap renderer")]
#[command(version)]
#[command(long_about = "
Renders a taxon-by-sample matrix as a clustered heatmap with dendrograms,
metadata tracks and a print caption, or exports the current view as CSV.

Input is a JSON document with `values`, `row_labels`, `column_labels` and
optionally `metrics` and `threshold_mask`.

Examples:
  heatmap render --input data.json --out heatmap.svg
  heatmap render --input data.json --out heatmap.png --scale symlog
  heatmap csv --input data.json --out view.csv --header Genus
  heatmap config > heatmap.toml
")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Export the heatmap to SVG or PNG
    Render {
        /// Input data file (JSON)
        #[arg(short, long, required = true)]
        input: PathBuf,

        /// Output file (SVG/PNG)
        #[arg(short, long, required = true)]
        out: PathBuf,

        /// Output format (auto-detected from extension)
        #[arg(long)]
        format: Option<RenderFormat>,

        /// Value scale
        #[arg(long)]
        scale: Option<ScaleArg>,

        /// Surface zoom factor
        #[arg(long)]
        zoom: Option<f64>,

        /// Keep input order instead of clustering
        #[arg(long)]
        no_cluster: bool,

        /// Sort rows alphabetically instead of clustering them
        #[arg(long)]
        sort_rows: bool,

        /// Sort columns alphabetically instead of clustering them
        #[arg(long)]
        sort_columns: bool,

        /// Rows to remove before export, by label
        #[arg(long = "remove-row")]
        remove_rows: Vec<String>,
    },

    /// Export the visible rows as CSV
    Csv {
        /// Input data file (JSON)
        #[arg(short, long, required = true)]
        input: PathBuf,

        /// Output file; stdout when omitted
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Leading header, repeatable; `Genus` adds a genus column
        #[arg(long = "header")]
        headers: Vec<String>,
    },

    /// Print an example configuration file
    Config,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderFormat {
    Svg,
    Png,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScaleArg {
    Linear,
    Symlog,
}

impl From<ScaleArg> for ScaleKind {
    fn from(arg: ScaleArg) -> Self {
        match arg {
            ScaleArg::Linear => ScaleKind::Linear,
            ScaleArg::Symlog => ScaleKind::Symlog,
        }
    }
}

fn setup_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn main() {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    if let Err(e) = run(cli) {
        match e.downcast_ref::<error::CliError>() {
            Some(cli_error) => eprintln!("Error: {}", error::format_error_with_suggestions(cli_error)),
            None => eprintln!("Error: {:#}", e),
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Render {
            input,
            out,
            format,
            scale,
            zoom,
            no_cluster,
            sort_rows,
            sort_columns,
            remove_rows,
        } => {
            commands::render::execute(
                &config,
                commands::render::RenderArgs {
                    input,
                    output: out,
                    format,
                    scale: scale.map(ScaleKind::from),
                    zoom,
                    no_cluster,
                    sort_rows,
                    sort_columns,
                    remove_rows,
                },
            )?;
        }

        Commands::Csv { input, out, headers } => {
            commands::csv::execute(&config, input, out, headers)?;
        }

        Commands::Config => {
            print!("{}", Config::example_toml()?);
        }
    }

    Ok(())
}
