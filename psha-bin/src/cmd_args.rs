use clap::{ArgGroup, Parser};

/// Input command line arguments.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(group(
    ArgGroup::new("input_mode")
        .required(true)
        .args(&["sites_file", "list_models", "show_model"]),
))]
pub struct CmdArgs {
    /// Input sites CSV file (name, lon, lat, vs30[, z1p0, z2p5]).
    ///
    /// Requires a built-in model (`--model`).
    #[arg(short, long, requires = "model")]
    pub sites_file: Option<String>,

    /// Use a built-in hazard model by name.
    #[arg(short, long)]
    pub model: Option<String>,

    /// Intensity measure to export: pga, pgv, sa0p3, sa1p0 or sa3p0.
    #[arg(short, long, default_value = "pga")]
    pub imt: String,

    /// Fan the calculation out on a Rayon thread pool.
    #[arg(short, long)]
    pub parallel: bool,

    /// Output CSV file to write computed hazard curves.
    ///
    /// Defaults to `out_hazard_curves.txt`.
    #[arg(short, long, default_value = "out_hazard_curves.txt")]
    pub out_file: String,

    /// Delimiter character for input and output CSV files.
    ///
    /// Defaults to tab (`'\t'`).
    #[arg(short, long, default_value = "\t")]
    pub delimeter: char,

    /// List all built-in hazard models.
    #[arg(short, long)]
    pub list_models: bool,

    /// Show details of a built-in hazard model by name.
    #[arg(long)]
    pub show_model: Option<String>,
}
