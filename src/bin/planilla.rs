use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use log::LevelFilter;
use planilla::{Planilla, PlanillaConfig, Variable};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(version, about, long_about = None)]
/// Fetches the climatological workbooks and builds monthly forms
struct Cli {
    /// Configuration file (defaults to $PLANILLA_CONFIG, ./planilla.toml, then the user config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// More logging; repeat for debug output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a station's form and print it as JSON rows
    Generate { station: String, year: i32, month: u32 },
    /// Generate a station's form and write it as a workbook
    Export {
        station: String,
        year: i32,
        month: u32,
        /// Output directory
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },
    /// Look up a monthly normal
    Normal {
        /// TMAX, TMIN or PP
        variable: Variable,
        station: String,
        /// Month name, e.g. ENERO
        month: String,
    },
    /// List the stations that have normals
    Stations,
    /// Compare one day's register against the normals, per zone
    CompareDaily {
        #[arg(long)]
        variable: Variable,
        #[arg(short, long)]
        date: NaiveDate,
    },
    /// Compare one or two stations over a date range
    ComparePeriod {
        #[arg(short, long)]
        station: String,
        #[arg(long)]
        second_station: Option<String>,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let (config, _) = PlanillaConfig::load(cli.config.as_deref())?;
    let client = Planilla::from_config(config);

    match cli.command {
        Commands::Generate {
            station,
            year,
            month,
        } => {
            let form = client
                .generate_form()
                .station(&station)
                .year(year)
                .month(month)
                .call()
                .await?;
            println!("{}", serde_json::to_string_pretty(&form.to_records())?);
        }
        Commands::Export {
            station,
            year,
            month,
            out,
        } => {
            let exported = client
                .export_form()
                .station(&station)
                .year(year)
                .month(month)
                .call()
                .await?;
            let path = out.join(&exported.filename);
            std::fs::write(&path, &exported.bytes)
                .with_context(|| format!("writing {}", path.display()))?;
            println!("File saved to `{}`", path.display());
        }
        Commands::Normal {
            variable,
            station,
            month,
        } => {
            let value = client
                .normal()
                .variable(variable)
                .station(&station)
                .month(&month)
                .call()
                .await?;
            match value {
                Some(v) => println!("{} {} {}: {} {}", variable, station, month, v, variable.unit()),
                None => println!("No {} normal for {} in {}", variable, station, month),
            }
        }
        Commands::Stations => {
            for station in client.stations().await? {
                println!("{}", station);
            }
        }
        Commands::CompareDaily { variable, date } => {
            let zones = client
                .compare_daily()
                .variable(variable)
                .date(date)
                .call()
                .await?;
            println!("{}", serde_json::to_string_pretty(&zones)?);
        }
        Commands::ComparePeriod {
            station,
            second_station,
            start,
            end,
        } => {
            let comparison = client
                .compare_period()
                .station(&station)
                .maybe_second_station(second_station.as_deref())
                .start(start)
                .end(end)
                .call()
                .await?;
            println!("{}", serde_json::to_string_pretty(&comparison)?);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
