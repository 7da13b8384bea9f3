//! Reframe CLI - Rewrite task tables into staged scene prompts
//!
//! # Main Commands
//!
//! ```bash
//! reframe run                          # Process the configured input table
//! reframe run -i tasks.csv -o out.csv  # Process explicit files
//! reframe evaluate out.csv             # Score an existing output table
//! ```
//!
//! # Inspection Commands
//!
//! ```bash
//! reframe prompt "一个人在打架"          # Show both prompts for one task
//! reframe score ZH EN TASK             # Score one prompt pair
//! reframe rules                        # Show the rule table
//! reframe config                       # Show the effective configuration
//! ```

use clap::{Parser, Subcommand};
use reframe::{
    evaluate_table, explain, parse_csv_file_auto, rules_description, run, score, Config,
    ConfigOverrides, EvaluationReport, Language, RunLog, RunOptions, ScoreDimension, ScoreVector,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "reframe")]
#[command(about = "Rewrite risky text-to-image tasks into staged scene prompts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite every task of the input table and write the output table
    Run {
        /// Input CSV file
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Rows per progress log batch
        #[arg(short, long)]
        batch_size: Option<usize>,

        /// Log file
        #[arg(long)]
        log_file: Option<PathBuf>,

        /// Name of the task column
        #[arg(long)]
        task_column: Option<String>,

        /// Skip scoring the written table
        #[arg(long)]
        no_evaluate: bool,

        /// Write per-row scores as JSON
        #[arg(long)]
        scores: Option<PathBuf>,

        /// Do not echo log lines to the terminal
        #[arg(short, long)]
        quiet: bool,
    },

    /// Show the prompts generated for a single task
    Prompt {
        /// Task text
        task: String,

        /// Only this language (zh or en)
        #[arg(short, long)]
        lang: Option<String>,
    },

    /// Score a prompt pair against its task
    Score {
        /// Chinese prompt
        prompt_zh: String,
        /// English prompt
        prompt_en: String,
        /// Original task
        task: String,
    },

    /// Score an existing output table
    Evaluate {
        /// Output CSV file
        input: PathBuf,

        /// Name of the task column
        #[arg(long, default_value = "task")]
        task_column: String,

        /// Write per-row scores as JSON
        #[arg(long)]
        scores: Option<PathBuf>,
    },

    /// Show the rule table
    Rules,

    /// Show the effective configuration
    Config,
}

fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            input,
            output,
            batch_size,
            log_file,
            task_column,
            no_evaluate,
            scores,
            quiet,
        } => {
            let overrides = ConfigOverrides {
                input,
                output,
                batch_size,
                log_file,
                task_column,
            };
            cmd_run(overrides, !no_evaluate, scores.as_deref(), quiet)
        }

        Commands::Prompt { task, lang } => cmd_prompt(&task, lang.as_deref()),

        Commands::Score {
            prompt_zh,
            prompt_en,
            task,
        } => cmd_score(&prompt_zh, &prompt_en, &task),

        Commands::Evaluate {
            input,
            task_column,
            scores,
        } => cmd_evaluate(&input, &task_column, scores.as_deref()),

        Commands::Rules => cmd_rules(),

        Commands::Config => cmd_config(),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_run(
    overrides: ConfigOverrides,
    evaluate: bool,
    scores_path: Option<&Path>,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?.with_overrides(overrides)?;
    let log = RunLog::open(&config.log_file, !quiet)?;

    eprintln!("📄 Processing: {}", config.input.display());

    let summary = run(&config, &log, &RunOptions { evaluate })?;

    eprintln!("\n⚙️  Rows: {}", summary.rows);
    eprintln!("   Encoding: {}", summary.encoding);
    if !summary.failures.is_empty() {
        eprintln!("   ⚠️  {} rows failed:", summary.failures.len());
        for failure in summary.failures.iter().take(5) {
            eprintln!("     - row {}: {}", failure.row, failure.message);
        }
    }
    eprintln!("💾 Results saved to: {}", config.output.display());

    if let Some(ref report) = summary.evaluation {
        print_report(report);
        if let Some(path) = scores_path {
            write_scores(report, path)?;
        }
    }

    eprintln!("\n✨ Done!");
    Ok(())
}

fn cmd_prompt(task: &str, lang: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let languages = match lang {
        Some(tag) => vec![tag.parse::<Language>()?],
        None => Language::ALL.to_vec(),
    };

    for language in languages {
        let rewrite = explain(task, language);
        match rewrite.keyword {
            Some(keyword) => eprintln!("[{}] {} (trigger: {})", language, rewrite.category, keyword),
            None => eprintln!("[{}] {}", language, rewrite.category),
        }
        println!("{}", rewrite.prompt);
    }
    Ok(())
}

fn cmd_score(prompt_zh: &str, prompt_en: &str, task: &str) -> Result<(), Box<dyn std::error::Error>> {
    let scores = score(prompt_zh, prompt_en, task);
    println!("{}", serde_json::to_string_pretty(&scores)?);
    eprintln!("Total: {} / {}", scores.total(), ScoreVector::max_total());
    Ok(())
}

fn cmd_evaluate(
    input: &Path,
    task_column: &str,
    scores_path: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("✔️  Evaluating: {}", input.display());

    let parsed = parse_csv_file_auto(input)?;
    let log = RunLog::console();
    let report = evaluate_table(&parsed.table, task_column, &log);
    print_report(&report);

    if let Some(path) = scores_path {
        write_scores(&report, path)?;
    }
    Ok(())
}

fn cmd_rules() -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", rules_description());
    Ok(())
}

fn cmd_config() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

fn print_report(report: &EvaluationReport) {
    eprintln!("\n📊 Evaluation:");
    eprintln!("   Scored rows: {}", report.rows_scored);
    if report.rows_skipped > 0 {
        eprintln!("   Skipped rows: {}", report.rows_skipped);
    }
    for dimension in ScoreDimension::ALL {
        eprintln!(
            "   {:<22} {}",
            dimension.name(),
            report.per_dimension.get(dimension)
        );
    }
    println!("Total evaluation score: {} / {}", report.total_score, report.max_score);
}

fn write_scores(report: &EvaluationReport, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string_pretty(&report.rows)?;
    fs::write(path, json)?;
    eprintln!("💾 Scores written to: {}", path.display());
    Ok(())
}
