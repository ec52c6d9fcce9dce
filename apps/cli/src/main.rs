#![deny(warnings)]

//! Command-line front end: forecasts, cost parameters, scenarios,
//! reference data and the vehicle data validator. Results are JSON on
//! stdout; logs go to stderr.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{Datelike, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use fleet_core::{CostParameters, EvTransitionRates, ScenarioParameters};
use fleet_econ::{calculate_price_trend, project_price, recommend_replacement};
use fleet_runtime::{build_comparison, AppContext, ComparisonSelection, FleetConfig};
use persistence::SqliteStore;
use serde::Serialize;
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_SHA"),
    ", ",
    env!("BUILD_DATE"),
    ")"
);

#[derive(Parser, Debug)]
#[command(name = "fleetcast", version = VERSION, about = "Fleet cost forecasting")]
struct Args {
    /// YAML config file (default: $FLEETCAST_CONFIG or fleetcast.yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the engine over the current cost parameters
    Forecast {
        #[arg(long)]
        start_year: Option<i32>,
        #[arg(long, default_value_t = 10)]
        years: i32,
    },
    #[command(subcommand)]
    Params(ParamsCommand),
    /// Price trend of a category, optionally projected to a year
    Trend {
        category: String,
        #[arg(long)]
        project_to: Option<i32>,
    },
    /// Replacement advice for a vehicle of the given category and age
    Recommend { category: String, age: i32 },
    /// Check a JSON array of vehicle records
    Validate {
        file: PathBuf,
        /// Apply every suggested fix and report the result
        #[arg(long)]
        fix: bool,
    },
    #[command(subcommand)]
    Scenario(ScenarioCommand),
    Export {
        collection: Collection,
        /// Write to a file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Replace a reference collection with CSV contents
    Import { collection: Reference, file: PathBuf },
}

#[derive(Subcommand, Debug)]
enum ParamsCommand {
    Show,
    Set {
        #[arg(long)]
        inflation: f64,
        #[arg(long)]
        tariff: f64,
        #[arg(long)]
        small_to_ev: f64,
        #[arg(long)]
        big_to_ev: f64,
    },
    History,
    Revert { history_id: String },
}

#[derive(Subcommand, Debug)]
enum ScenarioCommand {
    List,
    /// Create a scenario; unset rates come from the current parameters
    Create {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        start_year: Option<i32>,
        #[arg(long)]
        end_year: Option<i32>,
        #[arg(long)]
        inflation: Option<f64>,
        #[arg(long)]
        tariff: Option<f64>,
        #[arg(long)]
        small_ev: Option<f64>,
        #[arg(long)]
        large_ev: Option<f64>,
    },
    Run { id: String },
    Duplicate { id: String },
    Delete { id: String },
    /// Total spending per year, side by side (at most four)
    Compare {
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Collection {
    Categories,
    Prices,
    Scenarios,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Reference {
    Categories,
    Prices,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

async fn run(ctx: &AppContext<SqliteStore>, command: Command) -> Result<()> {
    let this_year = Utc::now().year();
    match command {
        Command::Forecast { start_year, years } => {
            print_json(&ctx.forecast(start_year.unwrap_or(this_year), years).await)?;
        }
        Command::Params(cmd) => match cmd {
            ParamsCommand::Show => print_json(&ctx.params.get_current().await)?,
            ParamsCommand::Set {
                inflation,
                tariff,
                small_to_ev,
                big_to_ev,
            } => {
                let params = CostParameters::with_rates(inflation, tariff, small_to_ev, big_to_ev);
                print_json(&ctx.params.update(&params).await?)?;
            }
            ParamsCommand::History => print_json(&ctx.params.get_history().await?)?,
            ParamsCommand::Revert { history_id } => {
                print_json(&ctx.params.revert(&history_id).await?)?;
            }
        },
        Command::Trend {
            category,
            project_to,
        } => {
            let history = ctx.prices.list().await;
            let trend = calculate_price_trend(&history, &category);
            let projected = project_to.map(|year| project_price(&history, &category, year));
            print_json(&json!({
                "category": category,
                "trend": trend,
                "projectedYear": project_to,
                "projectedPrice": projected.flatten(),
            }))?;
        }
        Command::Recommend { category, age } => {
            let Some(cat) = ctx
                .categories
                .list()
                .await
                .into_iter()
                .find(|c| c.name == category)
            else {
                bail!("unknown category: {category}");
            };
            let trend = ctx.price_trend(&category).await;
            let advice = recommend_replacement(age, cat.default_lifespan, trend.trend);
            print_json(&json!({
                "category": category,
                "age": age,
                "lifespan": cat.default_lifespan,
                "trend": trend,
                "recommendation": advice,
            }))?;
        }
        Command::Validate { file, fix } => {
            let value: serde_json::Value = serde_json::from_str(&read_text(&file)?)
                .with_context(|| format!("parsing {}", file.display()))?;
            let records = data_pipeline::VehicleRecord::from_json_array(&value);
            let checked = data_pipeline::validate_records(&records);
            if fix {
                let outcome = data_pipeline::auto_fix(&records, &checked.issues);
                let score = data_pipeline::quality_score(&outcome.result.report);
                print_json(&json!({ "qualityScore": score, "autoFix": outcome }))?;
            } else {
                let score = data_pipeline::quality_score(&checked.report);
                print_json(&json!({ "qualityScore": score, "result": checked }))?;
            }
        }
        Command::Scenario(cmd) => scenario(ctx, cmd, this_year).await?,
        Command::Export { collection, out } => {
            let text = match collection {
                Collection::Categories => data_pipeline::export_csv(&ctx.categories.list().await)?,
                Collection::Prices => data_pipeline::export_csv(&ctx.prices.list().await)?,
                Collection::Scenarios => data_pipeline::export_csv(&ctx.scenarios.list().await)?,
            };
            match out {
                Some(path) => {
                    std::fs::write(&path, text)
                        .with_context(|| format!("writing {}", path.display()))?;
                    info!(path = %path.display(), ?collection, "exported");
                }
                None => print!("{text}"),
            }
        }
        Command::Import { collection, file } => {
            let text = read_text(&file)?;
            let count = match collection {
                Reference::Categories => {
                    let rows = data_pipeline::import_categories(&text)?;
                    ctx.categories.save_all(&rows).await?;
                    rows.len()
                }
                Reference::Prices => {
                    let rows = data_pipeline::import_price_history(&text)?;
                    ctx.prices.save_all(&rows).await?;
                    rows.len()
                }
            };
            print_json(&json!({ "imported": count }))?;
        }
    }
    Ok(())
}

async fn scenario(
    ctx: &AppContext<SqliteStore>,
    cmd: ScenarioCommand,
    this_year: i32,
) -> Result<()> {
    match cmd {
        ScenarioCommand::List => print_json(&ctx.scenarios.list().await)?,
        ScenarioCommand::Create {
            name,
            description,
            start_year,
            end_year,
            inflation,
            tariff,
            small_ev,
            large_ev,
        } => {
            let current = ctx.params.get_current().await;
            let start_year = start_year.unwrap_or(this_year);
            let parameters = ScenarioParameters {
                start_year,
                end_year: end_year.unwrap_or(start_year + 4),
                inflation_rate: inflation.unwrap_or(current.inflation_rate),
                tariff_rate: tariff.unwrap_or(current.tariff_rate),
                ev_transition_rates: EvTransitionRates {
                    small_vehicles: small_ev.unwrap_or(current.small_to_ev_ratio),
                    large_vehicles: large_ev.unwrap_or(current.big_to_ev_ratio),
                },
            };
            print_json(&ctx.scenarios.create(&name, &description, parameters).await?)?;
        }
        ScenarioCommand::Run { id } => print_json(&ctx.scenarios.run_forecast(&id).await?)?,
        ScenarioCommand::Duplicate { id } => print_json(&ctx.scenarios.duplicate(&id).await?)?,
        ScenarioCommand::Delete { id } => {
            ctx.scenarios.delete(&id).await?;
            print_json(&json!({ "deleted": id }))?;
        }
        ScenarioCommand::Compare { ids } => {
            let selection = ComparisonSelection::from_ids(ids)?;
            let picked = selection.resolve(&ctx.scenarios.list().await);
            if picked.len() < selection.len() {
                bail!("some selected scenarios do not exist");
            }
            print_json(&build_comparison(&picked))?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = FleetConfig::load_from_env(args.config.as_deref())?;

    // Logging setup
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!(version = VERSION, command = ?args.command, "starting fleetcast");
    let ctx = AppContext::open(config).await?;
    run(&ctx, args.command).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn parses_nested_subcommands() {
        let args = Args::parse_from(["fleetcast", "scenario", "compare", "a", "b"]);
        assert!(matches!(
            args.command,
            Command::Scenario(ScenarioCommand::Compare { ref ids }) if ids.len() == 2
        ));
        let args = Args::parse_from([
            "fleetcast", "-c", "x.yaml", "params", "set", "--inflation", "3", "--tariff", "1",
            "--small-to-ev", "20", "--big-to-ev", "10",
        ]);
        assert_eq!(args.config.as_deref(), Some(Path::new("x.yaml")));
        assert!(matches!(args.command, Command::Params(ParamsCommand::Set { .. })));
        assert!(Args::try_parse_from(["fleetcast", "export", "vehicles"]).is_err());
    }
}
