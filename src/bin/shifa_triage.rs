//! Command-line interface for the triage engine
//!
//! Validates configuration documents, evaluates stored records, checks single
//! conditions and runs the questionnaire interactively on a terminal.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use shifa_triage::config::{DocumentFormat, REFERENCE_CONFIG};
use shifa_triage::diagnostics::{Diagnostic, DiagnosticFormatter, DiagnosticReporter, Format};
use shifa_triage::flow::StepType;
use shifa_triage::{
    AnswerOutcome, ConditionEvaluator, ConfigLoader, EngineConfig, FieldValue, PatientRecord,
    TriageEngine, TriageSession,
};
use std::fs;
use std::io::{self, BufRead, Read, Write};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "shifa-triage")]
#[command(about = "Rule-driven medical triage: validate configurations, evaluate records, run assessments")]
#[command(version)]
#[command(author = "Shifa Team")]
struct Cli {
    /// Configuration document (.yaml, .yml or .json); built-in questionnaire if omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Profile to select from a multi-profile document
    #[arg(short, long, global = true)]
    profile: Option<String>,

    /// Reject unparsable conditions instead of loading them as never-matching
    #[arg(long, global = true)]
    strict: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load and validate a configuration, printing its diagnostics
    Validate {
        /// Diagnostic output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Classify a patient record (JSON file, or stdin if omitted)
    Evaluate {
        /// JSON file containing the patient record
        #[arg(short, long)]
        record: Option<PathBuf>,
        /// Print the full export report instead of the result
        #[arg(long)]
        report: bool,
        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// Parse a single condition and optionally evaluate it
    Check {
        /// Condition text
        condition: String,
        /// JSON file containing a patient record to evaluate against
        #[arg(short, long)]
        record: Option<PathBuf>,
    },
    /// Run the questionnaire interactively
    Run {
        /// Print the export report as JSON when finished
        #[arg(long)]
        report: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON for machine consumption
    Json,
    /// One line per diagnostic
    Compact,
}

impl From<OutputFormat> for Format {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Text => Format::Text,
            OutputFormat::Json => Format::Json,
            OutputFormat::Compact => Format::Compact,
        }
    }
}

fn main() {
    // Setup human-panic for better error messages
    human_panic::setup_panic!();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    if let Err(error) = run(cli) {
        eprintln!("Error: {error:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut builder = EngineConfig::builder().strict_conditions(cli.strict);
    if let Some(profile) = &cli.profile {
        builder = builder.profile(profile.as_str());
    }
    let loader = ConfigLoader::new(builder.build());

    match cli.command {
        Commands::Validate { format } => handle_validate(&loader, cli.config, format),
        Commands::Evaluate {
            record,
            report,
            pretty,
        } => {
            let engine = load_engine(&loader, cli.config)?;
            handle_evaluate(&engine, record, report, pretty)
        }
        Commands::Check { condition, record } => handle_check(&loader, &condition, record),
        Commands::Run { report } => {
            let engine = Arc::new(load_engine(&loader, cli.config)?);
            handle_run(engine.session(), report)
        }
    }
}

fn block_on<F: Future>(future: F) -> Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start runtime")?;
    Ok(runtime.block_on(future))
}

fn load_engine(loader: &ConfigLoader, config: Option<PathBuf>) -> Result<TriageEngine> {
    let loaded = match config {
        Some(path) => block_on(loader.load_path(&path))?,
        None => loader.reference(),
    };
    loaded.map_err(|error| report_load_error(&error.to_diagnostic(), error))
}

fn report_load_error(diagnostic: &Diagnostic, error: impl Into<anyhow::Error>) -> anyhow::Error {
    eprintln!("{}", DiagnosticFormatter::new(Format::Text).format(diagnostic));
    error.into().context("configuration failed to load")
}

fn handle_validate(loader: &ConfigLoader, config: Option<PathBuf>, format: OutputFormat) -> Result<()> {
    let document = match config {
        Some(path) => block_on(loader.read_document(&path))?,
        None => loader.parse_document(REFERENCE_CONFIG, DocumentFormat::Yaml),
    };
    let engines = document
        .and_then(|document| {
            document.select(loader.config().profile.as_deref())?;
            loader.build_document(&document)
        })
        .map_err(|error| report_load_error(&error.to_diagnostic(), error))?;

    let formatter = DiagnosticFormatter::new(format.into());
    for engine in &engines {
        let mut reporter = DiagnosticReporter::new();
        reporter.add_diagnostics(engine.load_diagnostics().iter().cloned());
        if !reporter.is_empty() {
            println!("{}", formatter.format_all(reporter.diagnostics()));
        }

        let label = engine
            .profile()
            .map(|profile| format!("profile '{profile}': "))
            .unwrap_or_default();
        let summary = reporter.generate_report().summary;
        eprintln!(
            "✓ {label}{} rule(s), {} step(s), {} warning(s)",
            engine.rule_engine().rules().len(),
            engine.flow().total_steps(),
            summary.warning_count
        );
    }
    Ok(())
}

fn read_record(path: Option<PathBuf>) -> Result<PatientRecord> {
    let text = match path {
        Some(path) => fs::read_to_string(&path)
            .with_context(|| format!("failed to read record '{}'", path.display()))?,
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read record from stdin")?;
            buffer
        }
    };
    let json: serde_json::Value = serde_json::from_str(&text).context("record is not valid JSON")?;
    PatientRecord::try_from(json).context("record is not a JSON object of answers")
}

fn handle_evaluate(engine: &TriageEngine, record: Option<PathBuf>, report: bool, pretty: bool) -> Result<()> {
    let record = read_record(record)?;
    let (result, diagnostics) = engine.rule_engine().evaluate_with_diagnostics(&record);

    if !diagnostics.is_empty() {
        eprintln!("{}", DiagnosticFormatter::new(Format::Compact).format_all(&diagnostics));
    }

    let value = if report {
        shifa_triage::AssessmentReport::new(&result, &record).to_json()
    } else {
        serde_json::to_value(&result)?
    };
    let output = if pretty {
        serde_json::to_string_pretty(&value)?
    } else {
        serde_json::to_string(&value)?
    };
    println!("{output}");
    Ok(())
}

fn handle_check(loader: &ConfigLoader, condition: &str, record: Option<PathBuf>) -> Result<()> {
    let ast = match shifa_triage::parser::parse_condition_with_depth(condition, loader.config().max_condition_depth) {
        Ok(ast) => ast,
        Err(error) => {
            let mut diagnostic = error.to_diagnostic();
            diagnostic.location.source_text = Some(condition.to_string());
            eprintln!("{}", DiagnosticFormatter::new(Format::Text).format(&diagnostic));
            bail!("condition does not parse");
        }
    };
    println!("✓ {ast}");

    if record.is_some() {
        let record = read_record(record)?;
        let evaluator = ConditionEvaluator::new();
        match evaluator.evaluate_value(&ast, &record) {
            Ok(Some(value)) => println!("= {value}"),
            Ok(None) => println!("= <missing>"),
            Err(error) => {
                eprintln!("{}", DiagnosticFormatter::new(Format::Text).format(&error.to_diagnostic()));
                bail!("condition failed to evaluate");
            }
        }
    }
    Ok(())
}

/// Parse terminal input for the current step
fn parse_input(input: &str, session: &TriageSession) -> Option<FieldValue> {
    let step = session.current_step()?;
    if step.step_type == StepType::Scale {
        return input.parse::<i64>().ok().map(FieldValue::Integer);
    }
    if let Ok(number) = input.parse::<usize>() {
        if let Some(option) = number.checked_sub(1).and_then(|i| step.options.get(i)) {
            return Some(option.value.clone());
        }
    }
    let text = FieldValue::text(input);
    step.option(&text).map(|option| option.value.clone()).or(Some(text))
}

fn handle_run(mut session: TriageSession, report: bool) -> Result<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let mut stdout = io::stdout();

    session.start();
    while let Some(step) = session.current_step() {
        println!();
        println!("[{:>3.0}%] {}", session.progress() * 100.0, step.question);
        if let Some(help) = &step.help_text {
            println!("       {help}");
        }
        for (index, option) in step.options.iter().enumerate() {
            let marker = if option.critical { " (!)" } else { "" };
            println!("  {}. {}{marker}", index + 1, option.label);
        }
        match step.step_type {
            StepType::Scale => {
                let (min, max) = step.scale_range();
                print!("{min}-{max}> ");
            }
            StepType::Multi => print!("toggle, empty line to continue> "),
            StepType::Single => print!("> "),
        }
        stdout.flush()?;

        let Some(line) = lines.next() else {
            bail!("input ended before the assessment finished");
        };
        let line = line?;
        let input = line.trim();
        if input == "q" {
            return Ok(());
        }

        let field = step.field.clone();
        let is_multi = step.step_type == StepType::Multi;
        let outcome = if is_multi && input.is_empty() {
            session.complete_step()
        } else {
            match parse_input(input, &session) {
                Some(value) => session.answer(&field, value),
                None => {
                    println!("  Please enter a number.");
                    continue;
                }
            }
        };

        match outcome {
            AnswerOutcome::Ignored(reason) => println!("  Answer not accepted ({reason:?})"),
            AnswerOutcome::AwaitingCompletion => {
                if let Some(selection) = session.record().get(&field) {
                    println!("  Selected: {selection}");
                }
            }
            AnswerOutcome::CriticalHalt => println!("\n!! Critical finding: assessment stopped"),
            AnswerOutcome::Next(_) | AnswerOutcome::Completed => {}
        }
    }

    let Some(result) = session.result() else {
        bail!("assessment ended without a result");
    };
    println!();
    println!("Priority:   {}", result.priority);
    println!("Confidence: {:.0}%", result.confidence * 100.0);
    if let Some(minutes) = result.reassess_time {
        println!("Reassess:   in {minutes} min");
    }
    println!("Actions:");
    for action in &result.actions {
        println!("  - {action}");
    }

    if report {
        if let Some(report) = session.report() {
            println!("{}", report.to_json_string()?);
        }
    }
    Ok(())
}
