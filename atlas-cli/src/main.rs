use biogas_atlas_core::{
    AnalysisConfig, BuiltinScenario, ConfigError, CorrectionFactors, Factor, Scenario, Volume,
    VolumeUnit,
};
use clap::{Parser, ValueEnum};
use std::fmt;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod report;

use report::Report;

/// Theoretical volume used when neither `--volume` nor a config file gives one
const DEFAULT_VOLUME: f64 = 1_000_000.0;

/// Effective availability (FDE) analysis for biogas residues
#[derive(Parser, Debug)]
#[command(name = "atlas-cli")]
#[command(about = "Biogas residue availability analysis", long_about = None)]
struct Args {
    /// Theoretical annual production (overrides the config file)
    #[arg(short, long)]
    volume: Option<f64>,

    /// Unit of the volume (tonnes, m3)
    #[arg(short, long)]
    unit: Option<String>,

    /// Collection factor FC (0.55-0.95)
    #[arg(long)]
    fc: Option<f64>,

    /// Competition factor FCp (0.00-1.00)
    #[arg(long)]
    fcp: Option<f64>,

    /// Seasonality factor FS (0.70-1.00)
    #[arg(long)]
    fs: Option<f64>,

    /// Logistics factor FL (0.65-1.00)
    #[arg(long)]
    fl: Option<f64>,

    /// Start from a built-in scenario (optimistic, realistic, conservative, pessimistic)
    #[arg(short, long)]
    preset: Option<String>,

    /// JSON analysis config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Which view to print
    #[arg(long, value_enum, default_value_t = View::All)]
    view: View,

    /// Snap out-of-range factors into range instead of rejecting them
    #[arg(long)]
    clamp: bool,

    /// Print JSON instead of tables
    #[arg(long)]
    json: bool,

    /// Monte Carlo samples over the factor ranges (0 = skip)
    #[arg(long, default_value_t = 0)]
    samples: usize,

    /// Seed for the Monte Carlo sampler
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum View {
    Cascade,
    Flow,
    Scenarios,
    All,
}

impl View {
    pub(crate) fn shows(self, section: View) -> bool {
        self == View::All || self == section
    }
}

#[derive(Debug)]
enum CliError {
    Config(ConfigError),
    UnknownUnit(String),
    UnknownPreset(String),
    Json(serde_json::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(e) => write!(f, "{e}"),
            CliError::UnknownUnit(name) => {
                write!(f, "Unknown unit '{name}' (expected tonnes or m3)")
            }
            CliError::UnknownPreset(name) => {
                let known: Vec<&str> = BuiltinScenario::ALL.iter().map(|s| s.id()).collect();
                write!(f, "Unknown preset '{name}' (expected one of: {})", known.join(", "))
            }
            CliError::Json(e) => write!(f, "Failed to serialize report: {e}"),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Json(e)
    }
}

/// Inputs after merging the config file, preset and factor flags
pub(crate) struct Analysis {
    pub theoretical: Volume,
    pub factors: CorrectionFactors,
    pub scenarios: Vec<Scenario>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    // Logs go to stderr so `--json` output stays machine readable
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn resolve(args: &Args) -> Result<Analysis, CliError> {
    let mut config = match &args.config {
        Some(path) => AnalysisConfig::load(path)?,
        None => AnalysisConfig::new(Volume::tonnes_per_year(DEFAULT_VOLUME)),
    };

    if let Some(volume) = args.volume {
        config.theoretical_volume = volume;
    }
    if let Some(name) = &args.unit {
        config.unit =
            VolumeUnit::parse(name).ok_or_else(|| CliError::UnknownUnit(name.clone()))?;
    }
    if let Some(name) = &args.preset {
        let preset =
            BuiltinScenario::from_id(name).ok_or_else(|| CliError::UnknownPreset(name.clone()))?;
        info!(preset = preset.id(), "starting from preset");
        config.factors = preset.factors();
    }

    let overrides = [
        (Factor::Collection, args.fc),
        (Factor::Competition, args.fcp),
        (Factor::Seasonality, args.fs),
        (Factor::Logistics, args.fl),
    ];
    for (factor, value) in overrides {
        if let Some(value) = value {
            config.factors = config.factors.with(factor, value);
        }
    }

    if args.clamp {
        let clamped = config.factors.clamped();
        if clamped != config.factors {
            warn!(from = ?config.factors, to = ?clamped, "factors clamped into range");
        }
        config.factors = clamped;
        for scenario in &mut config.scenarios {
            scenario.factors = scenario.factors.clamped();
        }
    } else {
        config.validate()?;
    }

    Ok(Analysis {
        theoretical: config.theoretical(),
        factors: config.factors,
        scenarios: config.scenarios,
    })
}

fn run(args: &Args) -> Result<(), CliError> {
    let analysis = resolve(args)?;
    let report = Report::build(&analysis, args.samples, args.seed);

    if args.json {
        println!("{}", report.to_json(args.view)?);
    } else {
        report.print(args.view);
    }
    Ok(())
}

fn main() -> ExitCode {
    init_tracing();
    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::parse_from(std::iter::once("atlas-cli").chain(argv.iter().copied()))
    }

    #[test]
    fn test_defaults_to_realistic_million_tonnes() {
        let analysis = resolve(&parse(&[])).expect("defaults are valid");
        assert_eq!(analysis.theoretical, Volume::tonnes_per_year(DEFAULT_VOLUME));
        assert_eq!(analysis.factors, CorrectionFactors::REALISTIC);
        assert_eq!(analysis.scenarios.len(), 4);
    }

    #[test]
    fn test_flags_override_preset() {
        let analysis =
            resolve(&parse(&["--preset", "pessimistic", "--fc", "0.9", "--unit", "m3"]))
                .expect("valid");
        assert_eq!(analysis.factors.fc, 0.9);
        assert_eq!(analysis.factors.fcp, 0.65);
        assert_eq!(analysis.theoretical.unit(), VolumeUnit::CubicMetersPerYear);
    }

    #[test]
    fn test_out_of_range_rejected_without_clamp() {
        let err = resolve(&parse(&["--fc", "0.99"])).err().expect("rejected");
        assert!(matches!(err, CliError::Config(ConfigError::InvalidFactors { .. })));
        assert!(err.to_string().contains("FC"));
    }

    #[test]
    fn test_clamp_accepts_out_of_range() {
        let analysis = resolve(&parse(&["--fc", "0.99", "--clamp"])).expect("clamped");
        assert_eq!(analysis.factors.fc, 0.95);
    }

    #[test]
    fn test_unknown_preset() {
        let err = resolve(&parse(&["--preset", "wishful"])).err().expect("rejected");
        assert!(err.to_string().contains("optimistic"));
    }

    #[test]
    fn test_view_selection() {
        assert!(View::All.shows(View::Flow));
        assert!(View::Cascade.shows(View::Cascade));
        assert!(!View::Cascade.shows(View::Scenarios));
    }
}
