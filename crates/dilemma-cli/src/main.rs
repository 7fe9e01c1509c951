mod command;
mod display;
mod session;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser};
use dilemma_core::{ForecastConfig, Forecaster};
use dilemma_store::ProfileStore;
use dilemma_sync::http::DEFAULT_SOURCE_URL;
use dilemma_sync::{IssueClient, IssueRef};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::command::{Command, MENU};
use crate::session::{Session, Step};

#[derive(Parser)]
#[command(
    name = "dilemma",
    version,
    about = "Forecast the most favorable option of a NationStates issue"
)]
struct Cli {
    /// Nation whose profile files to use (alphanumeric)
    nation: Option<String>,

    /// Issue number, or "?" for a random one
    issue: Option<String>,

    /// Directory holding `<nation>_category_scale.csv` and `<nation>_policy_exclusions.csv`
    #[arg(long, env = "DILEMMA_DATA_DIR", default_value = ".")]
    data_dir: PathBuf,

    /// Results archive base URL
    #[arg(long, env = "DILEMMA_SOURCE_URL", default_value = DEFAULT_SOURCE_URL)]
    source_url: String,

    /// Print each forecast as JSON instead of tables
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    forecast: ForecastArgs,
}

#[derive(Args)]
struct ForecastArgs {
    /// Base of the score-to-weight exponential (> 1)
    #[arg(long, env = "DILEMMA_EXPONENT_BASE", default_value_t = 11.3)]
    exponent_base: f64,

    /// Total the percentages are rounded to
    #[arg(long, env = "DILEMMA_PERCENT_TOTAL", default_value_t = 100)]
    percent_total: u32,

    /// Extra divisor for ranged effects
    #[arg(long, env = "DILEMMA_RANGE_DIVISOR", default_value_t = 2.0)]
    range_divisor: f64,

    /// Prefix of effect statements to ignore
    #[arg(long, env = "DILEMMA_UNKNOWN_MARKER", default_value = "unknown effect")]
    unknown_marker: String,

    /// Appended to options that enact an excluded policy
    #[arg(long, env = "DILEMMA_POLICY_REFORM_SUFFIX", default_value = " policy reform")]
    policy_reform_suffix: String,

    /// Leave the "Dismiss issue." option out of the ranking
    #[arg(long, env = "DILEMMA_NO_DISMISS")]
    no_dismiss: bool,

    /// Scale deltas by their observation counts
    #[arg(long, env = "DILEMMA_CONFIDENCE_WEIGHTING")]
    confidence_weighting: bool,
}

impl From<ForecastArgs> for ForecastConfig {
    fn from(args: ForecastArgs) -> Self {
        ForecastConfig {
            exponent_base: args.exponent_base,
            percent_total: args.percent_total,
            range_divisor: args.range_divisor,
            unknown_marker: args.unknown_marker,
            policy_reform_suffix: args.policy_reform_suffix,
            include_dismiss: !args.no_dismiss,
            confidence_weighting: args.confidence_weighting,
        }
    }
}

/// Line-oriented prompt on stdin/stdout. `None` means stdin closed.
struct Prompt {
    lines: Lines<BufReader<Stdin>>,
}

impl Prompt {
    fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    async fn ask(&mut self, text: &str) -> anyhow::Result<Option<String>> {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(text.as_bytes()).await?;
        stdout.flush().await?;
        Ok(self.lines.next_line().await?)
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run(cli))
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    info!("dilemma v{}", env!("CARGO_PKG_VERSION"));
    let forecaster =
        Forecaster::new(cli.forecast.into()).context("invalid forecast configuration")?;
    let store = ProfileStore::new(cli.data_dir);
    let client = IssueClient::new(cli.source_url);
    let mut prompt = Prompt::new();

    let Some(nation) = resolve_nation(&store, cli.nation, &mut prompt).await? else {
        return Ok(());
    };
    let Some(issue) = resolve_issue(cli.issue, &mut prompt).await? else {
        return Ok(());
    };

    let profile = store
        .load_profile(&nation)
        .with_context(|| format!("loading bias profile for {nation}"))?;
    let policies = store
        .load_policy_rules(&nation)
        .with_context(|| format!("loading policy rules for {nation}"))?;
    let document = client
        .fetch(issue)
        .await
        .with_context(|| format!("fetching issue {issue}"))?;

    let mut session = Session::new(forecaster, nation, profile, policies, document);
    loop {
        show(&session, cli.json)?;

        let command = loop {
            let Some(line) = prompt.ask(MENU).await? else {
                return Ok(());
            };
            if let Some(command) = Command::parse(&line) {
                break command;
            }
        };

        match session.apply(&command) {
            Step::Refresh => {}
            Step::Fetch(issue) => match client.fetch(issue).await {
                Ok(document) => session.set_document(document),
                Err(err) => {
                    error!(%issue, error = %err, "fetch failed");
                    eprintln!("could not fetch issue {issue}: {err}");
                }
            },
            Step::Exit => return Ok(()),
        }
    }
}

fn show(session: &Session, json: bool) -> anyhow::Result<()> {
    let toggles = session.toggles();
    let excluded: Vec<&str> = session.exclusions().iter().collect();
    info!(
        issue = session.document().number,
        zero_bias_filter = toggles.zero_bias_filter,
        cumulative = toggles.cumulative,
        excluded = ?excluded,
        "refreshing forecast"
    );

    let forecast = match session.forecast() {
        Ok(forecast) => forecast,
        Err(err) => {
            eprintln!("error: {err}");
            return Ok(());
        }
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&forecast)?);
    } else {
        let text = display::render(&forecast, session.document()).context("rendering tables")?;
        println!("{text}");
    }
    Ok(())
}

async fn resolve_nation(
    store: &ProfileStore,
    mut nation: Option<String>,
    prompt: &mut Prompt,
) -> anyhow::Result<Option<String>> {
    loop {
        if let Some(name) = nation.take() {
            if store.has_profile(&name) {
                return Ok(Some(name));
            }
            eprintln!(
                "Category csv for nation \"{name}\" not found in {}.",
                store.data_dir().display()
            );
        }
        match prompt.ask("nation: ").await? {
            Some(line) => nation = Some(line.trim().to_string()),
            None => return Ok(None),
        }
    }
}

async fn resolve_issue(
    mut issue: Option<String>,
    prompt: &mut Prompt,
) -> anyhow::Result<Option<IssueRef>> {
    loop {
        if let Some(parsed) = issue.take().and_then(|s| s.parse().ok()) {
            return Ok(Some(parsed));
        }
        match prompt.ask("issue: ").await? {
            Some(line) => issue = Some(line),
            None => return Ok(None),
        }
    }
}
