//! CLI command definitions, routing, and tracing setup.

use std::io::Write as _;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use progscout_core::{AnswerOutcome, IngestProgress, IngestReport, Knowledge, ingest_all};
use progscout_shared::{LearnerProfile, ProgramKey, init_config, load_config};

/// Reply when a program has no usable page text at all.
const NO_DATA_REPLY: &str = "Пока нет данных для ответа. Попробуйте еще раз позже.";

/// Reply when no stored fragment is close enough to the question.
const OUT_OF_DOMAIN_REPLY: &str =
    "Я отвечаю только по двум программам ИТМО (AI и AI Product). Уточните вопрос.";

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// progscout — ITMO program knowledge from the command line.
#[derive(Parser)]
#[command(
    name = "progscout",
    version,
    about = "Ingest ITMO master's program pages and answer questions about them.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Fetch every configured program and rebuild the local artifacts.
    Ingest,

    /// Ask a question about one program.
    Ask {
        /// Program key (e.g. ai, ai_product).
        #[arg(short, long)]
        program: String,

        /// The question, as free words.
        #[arg(required = true)]
        question: Vec<String>,
    },

    /// Print or save the parsed curriculum as CSV.
    Plan {
        /// Program key (e.g. ai, ai_product).
        #[arg(short, long)]
        program: String,

        /// Write the CSV here instead of stdout.
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Recommend electives for a learner profile.
    Recommend {
        /// Program key (e.g. ai, ai_product).
        #[arg(short, long)]
        program: String,

        /// Career goal: ml_engineer, data_engineer, ai_product_manager, analyst.
        #[arg(short, long)]
        goal: String,

        /// Python level: none, basic, intermediate, advanced.
        #[arg(long, default_value = "basic")]
        python: String,

        /// Math level: weak, medium, strong.
        #[arg(long, default_value = "medium")]
        math: String,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "progscout=info",
        1 => "progscout=debug",
        _ => "progscout=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Ingest => cmd_ingest().await,
        Command::Ask { program, question } => cmd_ask(&program, &question.join(" ")).await,
        Command::Plan { program, out } => cmd_plan(&program, out.as_deref()).await,
        Command::Recommend {
            program,
            goal,
            python,
            math,
        } => cmd_recommend(&program, &goal, &python, &math).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_ingest() -> Result<()> {
    let config = load_config()?;
    info!(programs = config.programs.len(), "starting ingestion");

    let reporter = CliProgress::new();
    let report = ingest_all(&config, &reporter).await?;

    println!();
    println!("  Ingestion complete!");
    for program in &report.programs {
        let plan = if program.plan_found {
            "plan found"
        } else {
            "no plan"
        };
        println!(
            "  {:<12} {} fragments, {} courses, {plan}",
            program.program.as_str(),
            program.fragments,
            program.rows,
        );
    }
    for (key, reason) in &report.failures {
        println!("  {key:<12} failed: {reason}");
    }
    println!("  Time: {:.1}s", report.elapsed.as_secs_f64());
    println!();

    Ok(())
}

async fn cmd_ask(program: &str, question: &str) -> Result<()> {
    let config = load_config()?;
    let knowledge = Knowledge::load(&config)?;
    let key = resolve_program(&knowledge, program)?;

    info!(program = %key, question, "answering");

    match knowledge.answer(&key, question)? {
        AnswerOutcome::Answered { text, sources } => {
            println!("{text}");
            println!();
            println!("  Sources:");
            for (i, source) in sources.iter().enumerate() {
                println!("  [{}] {source}", i + 1);
            }
        }
        AnswerOutcome::NoData => println!("{NO_DATA_REPLY}"),
        AnswerOutcome::OutOfDomain => println!("{OUT_OF_DOMAIN_REPLY}"),
    }

    Ok(())
}

async fn cmd_plan(program: &str, out: Option<&Path>) -> Result<()> {
    let config = load_config()?;
    let knowledge = Knowledge::load(&config)?;
    let key = resolve_program(&knowledge, program)?;

    let rows = knowledge.plan_rows(&key)?.len();
    if rows == 0 {
        info!(program = %key, "no curriculum rows stored, emitting header only");
    }
    let csv = knowledge.plan_csv(&key)?;

    match out {
        Some(path) => {
            std::fs::write(path, &csv).map_err(|e| eyre!("cannot write '{}': {e}", path.display()))?;
            println!("  Courses: {rows}");
            println!("  Written: {}", path.display());
        }
        None => std::io::stdout().write_all(&csv)?,
    }

    Ok(())
}

async fn cmd_recommend(program: &str, goal: &str, python: &str, math: &str) -> Result<()> {
    let config = load_config()?;
    let knowledge = Knowledge::load(&config)?;
    let key = resolve_program(&knowledge, program)?;

    // Unrecognized profile values fall back (goal -> other, which scores
    // nothing) instead of erroring, matching the scorer's behavior.
    let profile = LearnerProfile::from_raw(goal, python, math);
    info!(program = %key, ?profile, "scoring electives");

    let picks = knowledge.recommend(&key, &profile)?;
    if picks.is_empty() {
        println!("No electives reached the qualifying score for this profile.");
        return Ok(());
    }

    println!();
    println!("  Recommended electives for '{key}':");
    for pick in &picks {
        let semester = match pick.semester {
            Some(s) => format!("semester {s}"),
            None => "semester n/a".to_owned(),
        };
        let kind = if pick.course_type.is_empty() {
            String::new()
        } else {
            format!(", {}", pick.course_type)
        };
        println!("  {:>2}  {} ({semester}{kind})", pick.score, pick.title);
    }
    println!();

    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

/// Parse and check a program key against the loaded knowledge, listing
/// the available keys on failure.
fn resolve_program(knowledge: &Knowledge, raw: &str) -> Result<ProgramKey> {
    let key = ProgramKey::new(raw)?;
    if !knowledge.contains(&key) {
        let available: Vec<&str> = knowledge.programs().iter().map(|p| p.as_str()).collect();
        return Err(eyre!(
            "unknown program '{raw}', available: {}",
            available.join(", ")
        ));
    }
    Ok(key)
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// Ingestion progress shown as an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl IngestProgress for CliProgress {
    fn phase(&self, program: &ProgramKey, name: &str) {
        self.spinner.set_message(format!("[{program}] {name}"));
    }

    fn done(&self, _report: &IngestReport) {
        self.spinner.finish_and_clear();
    }
}
