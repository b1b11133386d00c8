use clap::{Parser, Subcommand, ValueEnum};
use eyre::{Result, WrapErr};
use std::fs;
use std::path::PathBuf;

use boilerwatch::dashboard::{Dashboard, Sources, DEFAULT_DATASET_PATH, DEFAULT_MODEL_PATH};
use boilerwatch::form::{self, PredictionInput};
use boilerwatch::importance::ImportanceReport;
use boilerwatch::model::Model;

#[derive(Parser)]
#[command(
    name = "boilerwatch",
    about = "Boiler fault detection dashboard: dataset overview, charts, and Safe/Unsafe predictions."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Summary,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP dashboard
    Serve {
        /// Address to bind to
        #[arg(long, default_value = "127.0.0.1:8080")]
        bind: String,

        /// Boiler sensor CSV
        #[arg(long, default_value = DEFAULT_DATASET_PATH)]
        dataset: PathBuf,

        /// Fitted model artifact (JSON)
        #[arg(long, default_value = DEFAULT_MODEL_PATH)]
        model: PathBuf,

        /// Prediction rate limit in requests per minute per IP (0 = no limit)
        #[arg(long, default_value_t = 60)]
        rate_limit: u32,

        /// Dashboard snapshots kept in memory
        #[arg(long, default_value_t = boilerwatch::cache::DEFAULT_CACHE_CAPACITY)]
        cache_capacity: usize,
    },

    /// Predict the status of one boiler (exit code 1 when Unsafe)
    Predict {
        /// Fitted model artifact (JSON)
        #[arg(long, default_value = DEFAULT_MODEL_PATH)]
        model: PathBuf,

        #[arg(long)]
        flue_gas_temp: Option<f64>,
        #[arg(long)]
        steam_pressure: Option<f64>,
        #[arg(long)]
        feedwater_conductivity: Option<f64>,
        #[arg(long)]
        drum_level: Option<f64>,
        #[arg(long)]
        fuel_flow: Option<f64>,
        #[arg(long)]
        oxygen_content: Option<f64>,

        /// Output format
        #[arg(long, value_enum, default_value = "summary")]
        format: Format,
    },

    /// Print the summary metrics and feature importance, optionally writing every chart as SVG
    Report {
        /// Boiler sensor CSV
        #[arg(long, default_value = DEFAULT_DATASET_PATH)]
        dataset: PathBuf,

        /// Fitted model artifact (JSON)
        #[arg(long, default_value = DEFAULT_MODEL_PATH)]
        model: PathBuf,

        /// Directory to write `<chart id>.svg` files into
        #[arg(long)]
        svg_dir: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "summary")]
        format: Format,
    },
}

fn cmd_serve(
    bind: String,
    dataset: PathBuf,
    model: PathBuf,
    rate_limit: u32,
    cache_capacity: usize,
) -> Result<()> {
    use boilerwatch::server::{run_server, ServerConfig};

    let bind_addr = bind
        .parse()
        .wrap_err_with(|| format!("Invalid bind address: {bind}"))?;

    let config = ServerConfig {
        bind_addr,
        dataset_path: dataset,
        model_path: model,
        rate_limit_rpm: rate_limit,
        cache_capacity,
    };

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run_server(config))?;

    Ok(())
}

fn cmd_predict(model_path: PathBuf, input: PredictionInput, format: Format) -> Result<i32> {
    let model = Model::load(&model_path)
        .wrap_err_with(|| format!("failed to load model {}", model_path.display()))?;
    let prediction = form::submit(&model, &input)?;

    match format {
        Format::Json => {
            let result = serde_json::json!({
                "success": true,
                "model_kind": model.kind(),
                "prediction": prediction,
            });
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Format::Summary => {
            println!("Boiler Status Prediction");
            println!("========================");
            for (field, value) in form::FIELDS.iter().zip(prediction.input) {
                println!("{:<24}{value}", format!("{}:", field.label));
            }
            println!();
            println!("Status: {}", prediction.label);
            println!("{}", prediction.message);
        }
    }

    Ok(if prediction.safe { 0 } else { 1 })
}

fn cmd_report(sources: Sources, svg_dir: Option<PathBuf>, format: Format) -> Result<()> {
    let dash = Dashboard::load(&sources).wrap_err("failed to build dashboard")?;

    if let Some(dir) = &svg_dir {
        fs::create_dir_all(dir).wrap_err_with(|| format!("failed to create {}", dir.display()))?;
        for chart in &dash.charts {
            let path = dir.join(format!("{}.svg", chart.chart.id));
            fs::write(&path, &chart.svg)
                .wrap_err_with(|| format!("failed to write {}", path.display()))?;
        }
        if let Some(svg) = &dash.importance_svg {
            fs::write(dir.join("importance.svg"), svg)?;
        }
    }

    match format {
        Format::Json => {
            let result = serde_json::json!({
                "success": true,
                "fingerprint": dash.fingerprint,
                "summary": dash.summary,
                "charts": dash.charts.iter().map(|c| &c.chart.id).collect::<Vec<_>>(),
                "importance": dash.importance,
            });
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Format::Summary => {
            println!("{}", boilerwatch::dashboard::TITLE);
            println!("{}", boilerwatch::dashboard::SUBTITLE);
            println!();
            println!("Rows: {}", dash.summary.rows);
            for metric in &dash.summary.metrics {
                println!("{:<22}{}", format!("{}:", metric.label), metric.value);
            }
            println!();
            match &dash.importance {
                ImportanceReport::Ranked { table, .. } => {
                    println!("Feature Importance:");
                    for row in table {
                        println!("  {:<24}{:.4}", row.feature, row.importance);
                    }
                }
                ImportanceReport::Unavailable { warning } => println!("{warning}"),
            }
            println!();
            println!("Charts: {}", dash.charts.len());
            if let Some(dir) = &svg_dir {
                println!("SVG written to {}", dir.display());
            }
            println!("Fingerprint: {}", dash.fingerprint);
        }
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve {
            bind,
            dataset,
            model,
            rate_limit,
            cache_capacity,
        } => cmd_serve(bind, dataset, model, rate_limit, cache_capacity),
        Commands::Predict {
            model,
            flue_gas_temp,
            steam_pressure,
            feedwater_conductivity,
            drum_level,
            fuel_flow,
            oxygen_content,
            format,
        } => {
            let input = PredictionInput {
                flue_gas_temp,
                steam_pressure,
                feedwater_conductivity,
                drum_level,
                fuel_flow,
                oxygen_content,
            };
            match cmd_predict(model, input, format) {
                Ok(code) => {
                    if code != 0 {
                        std::process::exit(code);
                    }
                    Ok(())
                }
                Err(e) => Err(e),
            }
        }
        Commands::Report {
            dataset,
            model,
            svg_dir,
            format,
        } => cmd_report(Sources { dataset, model }, svg_dir, format),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:?}");
        std::process::exit(1);
    }
}
