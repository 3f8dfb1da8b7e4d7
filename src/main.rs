use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::{Path, PathBuf};

use lifeplan::api::{AppState, run_http_server};
use lifeplan::core::{
    PlanError, PlanInputs, PlanResult, PlannerConfig, ProjectionMode, advise, national_bracket,
    project, score, snapshot, timeline,
};
use lifeplan::session::SessionStore;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliProjectionMode {
    Forward,
    RequiredEarningCurve,
    RequiredFlat,
}

impl From<CliProjectionMode> for ProjectionMode {
    fn from(value: CliProjectionMode) -> Self {
        match value {
            CliProjectionMode::Forward => ProjectionMode::Forward,
            CliProjectionMode::RequiredEarningCurve => ProjectionMode::RequiredEarningCurve,
            CliProjectionMode::RequiredFlat => ProjectionMode::RequiredFlat,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "lifeplan",
    about = "Life-event cash-flow planner (forward projection + required-income solve)"
)]
struct Cli {
    #[arg(long, global = true, help = "Planner tables as JSON; missing fields keep defaults")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the JSON API.
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
        #[arg(long, default_value = "session.json")]
        state: PathBuf,
    },
    /// Project a plan read from a JSON file.
    Project {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, value_enum, help = "Overrides settings.mode in the input")]
        mode: Option<CliProjectionMode>,
        #[arg(long)]
        end_age: Option<u32>,
    },
    /// Summarize a plan at one age.
    Snapshot {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        age: u32,
    },
    /// Score an annual income against the age-matched salary table.
    Score {
        #[arg(long)]
        income: f64,
        #[arg(long)]
        age: u32,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ScoreOutput {
    #[serde(flatten)]
    score: lifeplan::core::SalaryScore,
    national_bracket: lifeplan::core::NationalBracket,
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> PlanResult<()> {
    let config = match &cli.config {
        Some(path) => PlannerConfig::from_json_file(path)?,
        None => PlannerConfig::default(),
    };

    match cli.command {
        Command::Serve { port, state } => {
            let state = AppState::new(config, SessionStore::new(state));
            run_http_server(port, state).await?;
        }
        Command::Project {
            input,
            mode,
            end_age,
        } => {
            let mut inputs = read_plan(&input, &config)?;
            if let Some(mode) = mode {
                inputs.settings.mode = mode.into();
            }
            if end_age.is_some() {
                inputs.settings.end_age = end_age;
                inputs.validate(&config)?;
            }
            let projection = project(&inputs, &config);
            let advice = advise(&inputs, &config, &projection);
            print_json(&serde_json::json!({
                "projection": projection,
                "advice": advice,
                "timeline": timeline(&inputs, &config),
            }))?;
        }
        Command::Snapshot { input, age } => {
            let inputs = read_plan(&input, &config)?;
            print_json(&snapshot(&inputs, &config, age))?;
        }
        Command::Score { income, age } => {
            if !income.is_finite() || income < 0.0 {
                return Err(PlanError::InvalidInput(
                    "income must be a non-negative number".to_string(),
                ));
            }
            print_json(&ScoreOutput {
                score: score(&config, income, age),
                national_bracket: national_bracket(&config, income),
            })?;
        }
    }
    Ok(())
}

fn read_plan(path: &Path, config: &PlannerConfig) -> PlanResult<PlanInputs> {
    let raw = std::fs::read_to_string(path)?;
    let inputs: PlanInputs = serde_json::from_str(&raw)?;
    inputs.validate(config)?;
    log::debug!("loaded plan from {}", path.display());
    Ok(inputs)
}

fn print_json<T: Serialize>(value: &T) -> PlanResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
