//! riskgate CLI - Command-line interface for the riskgate decision engine
//!
//! Commands:
//! - assess: Assess a batch of session requests (file or stdin)
//! - run: Assess streaming NDJSON requests from stdin
//! - validate: Validate request envelopes without scoring them
//! - doctor: Diagnose configuration, model and state
//! - schema: Print the classifier feature schema
//! - serve: Run the HTTP surface (requires the `server` feature)

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use riskgate::classifier::check_feature_order;
use riskgate::pipeline::BatchRecord;
use riskgate::session::parse_request;
use riskgate::store::StateStore;
use riskgate::{
    ConfigError, DecisionEngine, EngineConfig, LogisticClassifier, MemoryStore, RiskError,
    RiskProcessor, FEATURE_ORDER, FEATURE_SCHEMA_VERSION, PRODUCER_NAME, RISKGATE_VERSION,
};

/// riskgate - Adaptive human/bot risk decisions from session telemetry
#[derive(Parser)]
#[command(name = "riskgate")]
#[command(version = RISKGATE_VERSION)]
#[command(about = "Assess browsing sessions and decide ALLOW / CAPTCHA / BLOCK", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Engine wiring shared by every scoring command
#[derive(Args, Clone)]
struct EngineArgs {
    /// Engine configuration JSON (built-in calibration if omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Model artifact JSON (scaler + logistic weights)
    #[arg(long)]
    model: Option<PathBuf>,

    /// Load attack intensity and trust from this file and save them back on exit
    #[arg(long)]
    state: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Assess a batch of session requests
    Assess {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long)]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,

        #[command(flatten)]
        engine: EngineArgs,
    },

    /// Assess streaming NDJSON requests from stdin
    Run {
        /// Flush output after each record
        #[arg(long, default_value = "true")]
        flush: bool,

        #[command(flatten)]
        engine: EngineArgs,
    },

    /// Validate request envelopes without scoring them
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose configuration, model and state
    Doctor {
        #[command(flatten)]
        engine: EngineArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the classifier feature schema
    Schema {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run the HTTP surface
    #[cfg(feature = "server")]
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1:8000")]
        bind: String,

        /// Worker threads
        #[arg(long, default_value = "4")]
        workers: usize,

        #[command(flatten)]
        engine: EngineArgs,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one request per line)
    Ndjson,
    /// JSON array of requests
    Json,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one assessment per line)
    Ndjson,
    /// JSON array of assessments
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), RiskCliError> {
    match cli.command {
        Commands::Assess {
            input,
            output,
            input_format,
            output_format,
            engine,
        } => cmd_assess(&input, &output, input_format, output_format, &engine),

        Commands::Run { flush, engine } => cmd_run(flush, &engine),

        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),

        Commands::Doctor { engine, json } => cmd_doctor(&engine, json),

        Commands::Schema { json } => cmd_schema(json),

        #[cfg(feature = "server")]
        Commands::Serve {
            bind,
            workers,
            engine,
        } => cmd_serve(&bind, workers, &engine),
    }
}

/// Engine plus the concrete store so state can be saved on exit
struct Wired {
    processor: RiskProcessor,
    store: Arc<MemoryStore>,
}

fn wire_engine(args: &EngineArgs) -> Result<Wired, RiskCliError> {
    let config = match &args.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };

    let model_path = args.model.as_ref().ok_or(RiskCliError::NoModel)?;
    let classifier = LogisticClassifier::from_file(model_path)?;

    let store = match &args.state {
        Some(path) if path.exists() => Arc::new(MemoryStore::from_json(&fs::read_to_string(path)?)?),
        _ => Arc::new(MemoryStore::new()),
    };

    let engine = DecisionEngine::new(config, Arc::new(classifier), store.clone() as Arc<dyn StateStore>)?;

    Ok(Wired {
        processor: RiskProcessor::new(Arc::new(engine)),
        store,
    })
}

fn save_state(args: &EngineArgs, store: &MemoryStore) -> Result<(), RiskCliError> {
    if let Some(path) = &args.state {
        fs::write(path, store.to_json()?)?;
        info!(path = %path.display(), keys = store.len(), "state saved");
    }
    Ok(())
}

fn read_input(input: &Path) -> Result<String, RiskCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

/// Split input into one JSON document per request
fn split_requests(data: &str, format: &InputFormat) -> Result<Vec<String>, RiskCliError> {
    let requests: Vec<String> = match format {
        InputFormat::Ndjson => data
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect(),
        InputFormat::Json => {
            let values: Vec<serde_json::Value> = serde_json::from_str(data)?;
            values.iter().map(|v| v.to_string()).collect()
        }
    };

    if requests.is_empty() {
        return Err(RiskCliError::NoRequests);
    }
    Ok(requests)
}

fn cmd_assess(
    input: &Path,
    output: &Path,
    input_format: InputFormat,
    output_format: OutputFormat,
    args: &EngineArgs,
) -> Result<(), RiskCliError> {
    let data = read_input(input)?;
    let requests = split_requests(&data, &input_format)?;
    let wired = wire_engine(args)?;

    let records = wired
        .processor
        .assess_lines(requests.iter().map(String::as_str));

    let failed = records
        .iter()
        .filter(|r| matches!(r, BatchRecord::Failed(_)))
        .count();
    info!(total = records.len(), failed, "batch assessed");

    let output_data = format_output(&records, &output_format)?;
    if output.to_string_lossy() == "-" {
        print!("{}", output_data);
    } else {
        fs::write(output, output_data)?;
    }

    save_state(args, &wired.store)
}

fn cmd_run(flush: bool, args: &EngineArgs) -> Result<(), RiskCliError> {
    let wired = wire_engine(args)?;

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = line?;
        let trimmed = line.trim();

        if trimmed.is_empty() {
            continue;
        }

        for record in wired.processor.assess_lines([trimmed]) {
            writeln!(stdout, "{}", serde_json::to_string(&record)?)?;
        }
        if flush {
            stdout.flush()?;
        }
    }

    save_state(args, &wired.store)
}

#[derive(serde::Serialize)]
struct ValidationReport {
    total: usize,
    valid: usize,
    invalid: usize,
    errors: Vec<ValidationIssue>,
}

#[derive(serde::Serialize)]
struct ValidationIssue {
    index: usize,
    kind: String,
    message: String,
}

fn cmd_validate(input: &Path, input_format: InputFormat, json: bool) -> Result<(), RiskCliError> {
    let data = read_input(input)?;
    let requests = split_requests(&data, &input_format)?;

    let errors: Vec<ValidationIssue> = requests
        .iter()
        .enumerate()
        .filter_map(|(index, request)| {
            parse_request(request).err().map(|e| ValidationIssue {
                index,
                kind: e.kind().to_string(),
                message: e.to_string(),
            })
        })
        .collect();

    let report = ValidationReport {
        total: requests.len(),
        valid: requests.len() - errors.len(),
        invalid: errors.len(),
        errors,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validated {} requests: {} valid, {} invalid", report.total, report.valid, report.invalid);
        for issue in &report.errors {
            println!("  [{}] {}: {}", issue.index, issue.kind, issue.message);
        }
    }

    if report.invalid > 0 {
        return Err(RiskCliError::ValidationFailed(report.invalid));
    }
    Ok(())
}

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize, PartialEq)]
#[serde(rename_all = "lowercase")]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl DoctorCheck {
    fn new(name: &str, status: CheckStatus, message: String) -> Self {
        Self {
            name: name.to_string(),
            status,
            message,
        }
    }
}

fn cmd_doctor(args: &EngineArgs, json: bool) -> Result<(), RiskCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck::new(
        "feature_schema",
        CheckStatus::Ok,
        format!("{} ({} features)", FEATURE_SCHEMA_VERSION, FEATURE_ORDER.len()),
    ));

    // Configuration
    let config = match &args.config {
        Some(path) => EngineConfig::from_file(path),
        None => Ok(EngineConfig::default()),
    };
    match &config {
        Ok(config) => {
            checks.push(DoctorCheck::new(
                "config",
                CheckStatus::Ok,
                format!("Configuration {} valid", config.version),
            ));

            let t0 = config.thresholds.dynamic(0.0);
            let t1 = config.thresholds.dynamic(1.0);
            checks.push(DoctorCheck::new(
                "decision_bands",
                CheckStatus::Ok,
                format!(
                    "allow/soft/hard {:.1}/{:.1}/{:.1} at rest, {:.1}/{:.1}/{:.1} at full attack",
                    t0.allow, t0.soft, t0.hard, t1.allow, t1.soft, t1.hard
                ),
            ));

            match config.remapper() {
                Ok(remapper) if remapper.is_monotonic() => checks.push(DoctorCheck::new(
                    "remapper",
                    CheckStatus::Ok,
                    format!("{} anchors, monotonic", remapper.anchors().len()),
                )),
                Ok(remapper) => checks.push(DoctorCheck::new(
                    "remapper",
                    CheckStatus::Warning,
                    format!(
                        "{} anchors, targets decrease somewhere; scores are not monotonic",
                        remapper.anchors().len()
                    ),
                )),
                Err(e) => checks.push(DoctorCheck::new("remapper", CheckStatus::Error, e.to_string())),
            }
        }
        Err(e) => checks.push(DoctorCheck::new("config", CheckStatus::Error, e.to_string())),
    }

    // Model artifact
    match &args.model {
        Some(path) => match LogisticClassifier::from_file(path) {
            Ok(classifier) => match check_feature_order(&classifier) {
                Ok(()) => checks.push(DoctorCheck::new(
                    "model",
                    CheckStatus::Ok,
                    format!("Model {} matches feature schema", classifier.artifact().version),
                )),
                Err(e) => checks.push(DoctorCheck::new("model", CheckStatus::Error, e.to_string())),
            },
            Err(e) => checks.push(DoctorCheck::new("model", CheckStatus::Error, e.to_string())),
        },
        None => checks.push(DoctorCheck::new(
            "model",
            CheckStatus::Warning,
            "No model artifact given (--model); scoring commands will refuse to run".to_string(),
        )),
    }

    // Persisted state
    if let Some(path) = &args.state {
        if path.exists() {
            match fs::read_to_string(path)
                .map_err(RiskCliError::from)
                .and_then(|content| MemoryStore::from_json(&content).map_err(RiskCliError::from))
            {
                Ok(store) => checks.push(DoctorCheck::new(
                    "state",
                    CheckStatus::Ok,
                    format!("State file valid ({} keys)", store.len()),
                )),
                Err(e) => checks.push(DoctorCheck::new(
                    "state",
                    CheckStatus::Error,
                    CliError::from(e).message,
                )),
            }
        } else {
            checks.push(DoctorCheck::new(
                "state",
                CheckStatus::Warning,
                "State file does not exist yet; it will be created on exit".to_string(),
            ));
        }
    }

    let stdin_message = if atty::is(atty::Stream::Stdin) {
        "stdin is a TTY (interactive mode)"
    } else {
        "stdin is a pipe (streaming mode ready)"
    };
    checks.push(DoctorCheck::new("stdin", CheckStatus::Ok, stdin_message.to_string()));

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: RISKGATE_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("riskgate Doctor Report");
        println!("======================");
        println!("Version: {}", report.version);
        println!();
        for check in &report.checks {
            let icon = match check.status {
                CheckStatus::Ok => "✓",
                CheckStatus::Warning => "!",
                CheckStatus::Error => "✗",
            };
            println!("[{}] {}: {}", icon, check.name, check.message);
        }
    }

    if report.checks.iter().any(|c| c.status == CheckStatus::Error) {
        return Err(RiskCliError::DoctorFailed);
    }
    Ok(())
}

fn cmd_schema(json: bool) -> Result<(), RiskCliError> {
    if json {
        let schema = serde_json::json!({
            "schema_version": FEATURE_SCHEMA_VERSION,
            "feature_order": FEATURE_ORDER,
            "flags": ["honeypotTriggered"],
            "envelope": ["user_id"],
        });
        println!("{}", serde_json::to_string_pretty(&schema)?);
    } else {
        println!("Feature schema: {}", FEATURE_SCHEMA_VERSION);
        println!();
        for (index, name) in FEATURE_ORDER.iter().enumerate() {
            println!("{:>3}  {}", index, name);
        }
        println!();
        println!("honeypotTriggered (0/1) bypasses the classifier and is not part of the vector.");
        println!("Each request envelope also carries a non-blank user_id.");
    }
    Ok(())
}

#[cfg(feature = "server")]
fn cmd_serve(bind: &str, workers: usize, args: &EngineArgs) -> Result<(), RiskCliError> {
    let wired = wire_engine(args)?;
    actix_web::rt::System::new().block_on(riskgate::server::serve(
        wired.processor.clone(),
        bind,
        workers,
    ))?;
    save_state(args, &wired.store)
}

fn format_output(records: &[BatchRecord], format: &OutputFormat) -> Result<String, RiskCliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut lines: Vec<String> = Vec::new();
            for record in records {
                lines.push(serde_json::to_string(record)?);
            }
            Ok(lines.join("\n") + "\n")
        }
        OutputFormat::Json => Ok(serde_json::to_string(records)?),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(records)?),
    }
}

#[derive(Debug)]
enum RiskCliError {
    Io(io::Error),
    Risk(RiskError),
    Config(ConfigError),
    Json(serde_json::Error),
    NoRequests,
    NoModel,
    ValidationFailed(usize),
    DoctorFailed,
}

impl From<io::Error> for RiskCliError {
    fn from(e: io::Error) -> Self {
        RiskCliError::Io(e)
    }
}

impl From<RiskError> for RiskCliError {
    fn from(e: RiskError) -> Self {
        RiskCliError::Risk(e)
    }
}

impl From<ConfigError> for RiskCliError {
    fn from(e: ConfigError) -> Self {
        RiskCliError::Config(e)
    }
}

impl From<serde_json::Error> for RiskCliError {
    fn from(e: serde_json::Error) -> Self {
        RiskCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<RiskCliError> for CliError {
    fn from(e: RiskCliError) -> Self {
        match e {
            RiskCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            RiskCliError::Risk(e) => CliError {
                code: e.kind().to_uppercase(),
                message: e.to_string(),
                hint: Some("Run 'riskgate validate' for details".to_string()),
            },
            RiskCliError::Config(e) => CliError {
                code: "CONFIG_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Run 'riskgate doctor' to check configuration and model".to_string()),
            },
            RiskCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            RiskCliError::NoRequests => CliError {
                code: "NO_REQUESTS".to_string(),
                message: "No requests found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            RiskCliError::NoModel => CliError {
                code: "NO_MODEL".to_string(),
                message: "No classifier model artifact given".to_string(),
                hint: Some("Pass --model <artifact.json>".to_string()),
            },
            RiskCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} requests failed validation", count),
                hint: None,
            },
            RiskCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: None,
            },
        }
    }
}
