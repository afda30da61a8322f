//! scriptdoc CLI - Document Python data pipeline scripts with an LLM
//!
//! Usage:
//!   scriptdoc serve [--port <port>] [--host <host>] [--open]
//!   scriptdoc generate <file.py> [--stream] [--format docx|markdown] [--output <path>] [--json]
//!   scriptdoc prompt <file.py>
//!   scriptdoc render <report.json> [--filename <name>] [--format docx|markdown] [--output <path>]
//!
//! Examples:
//!   scriptdoc serve --open
//!   scriptdoc generate jobs/orders_daily.py --stream
//!   scriptdoc generate jobs/orders_daily.py --json > orders_daily.json
//!   scriptdoc render orders_daily.json --format markdown

use clap::{Parser, Subcommand, ValueEnum};
use scriptdoc::config::Settings;
use scriptdoc::export::{export, ExportArtifact, ExportFormat};
use scriptdoc::generate::{generate, generate_streaming, GeneratedReport};
use scriptdoc::llm::DocumentationClient;
use scriptdoc::prompt::build_messages;
use scriptdoc::report::parse_response;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "scriptdoc")]
#[command(about = "scriptdoc - Business documentation for Python data pipeline scripts")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web UI
    #[cfg(feature = "ui")]
    Serve {
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Open the UI in a browser once started
        #[arg(long)]
        open: bool,
    },

    /// Generate documentation for one Python file
    Generate {
        /// Path to the .py file
        file: PathBuf,

        /// Stream the model output to stderr while it arrives
        #[arg(short, long)]
        stream: bool,

        /// Export format
        #[arg(short, long, default_value = "docx")]
        format: FormatArg,

        /// Where to write the export (defaults to <stem>_documentation.<ext>)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the parsed report as JSON instead of writing an export
        #[arg(long)]
        json: bool,
    },

    /// Print the messages that would be sent, without calling the model
    Prompt {
        /// Path to the .py file
        file: PathBuf,
    },

    /// Export a previously saved JSON report
    Render {
        /// Path to the report JSON
        report: PathBuf,

        /// Source filename shown in the document (defaults to <stem>.py)
        #[arg(long)]
        filename: Option<String>,

        /// Export format
        #[arg(short, long, default_value = "docx")]
        format: FormatArg,

        /// Where to write the export (defaults to <stem>_documentation.<ext>)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Docx,
    Markdown,
}

impl From<FormatArg> for ExportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Docx => ExportFormat::Docx,
            FormatArg::Markdown => ExportFormat::Markdown,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("scriptdoc=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        #[cfg(feature = "ui")]
        Commands::Serve { port, host, open } => cmd_serve(port, host, open).await,
        Commands::Generate {
            file,
            stream,
            format,
            output,
            json,
        } => cmd_generate(file, stream, format.into(), output, json).await,
        Commands::Prompt { file } => cmd_prompt(file),
        Commands::Render {
            report,
            filename,
            format,
            output,
        } => cmd_render(report, filename, format.into(), output),
    }
}

fn load_settings() -> Option<Settings> {
    match Settings::load() {
        Ok(settings) => Some(settings),
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            None
        }
    }
}

/// Build the upstream client; a missing credential is fatal.
fn build_client(settings: &Settings) -> Option<DocumentationClient> {
    let api_key = match settings.api_key() {
        Ok(key) => key,
        Err(e) => {
            eprintln!("Error: {}", e);
            return None;
        }
    };

    match DocumentationClient::from_settings(&settings.llm, api_key) {
        Ok(client) => Some(client),
        Err(e) => {
            eprintln!("Error creating completion client: {}", e);
            None
        }
    }
}

fn read_source(file: &Path) -> Option<String> {
    match fs::read_to_string(file) {
        Ok(s) => Some(s),
        Err(e) => {
            eprintln!("Error reading file '{}': {}", file.display(), e);
            None
        }
    }
}

fn display_name(file: &Path) -> String {
    file.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.display().to_string())
}

#[cfg(feature = "ui")]
async fn cmd_serve(port: Option<u16>, host: Option<String>, open: bool) -> ExitCode {
    let Some(mut settings) = load_settings() else {
        return ExitCode::FAILURE;
    };
    if let Some(port) = port {
        settings.server.port = port;
    }
    if let Some(host) = host {
        settings.server.host = host;
    }
    settings.server.open_browser |= open;

    let Some(client) = build_client(&settings) else {
        return ExitCode::FAILURE;
    };

    match scriptdoc::web::serve(settings, std::sync::Arc::new(client)).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Server error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn cmd_generate(
    file: PathBuf,
    stream: bool,
    format: ExportFormat,
    output: Option<PathBuf>,
    json: bool,
) -> ExitCode {
    let Some(settings) = load_settings() else {
        return ExitCode::FAILURE;
    };
    let Some(client) = build_client(&settings) else {
        return ExitCode::FAILURE;
    };
    let Some(source) = read_source(&file) else {
        return ExitCode::FAILURE;
    };
    let filename = display_name(&file);

    let result = if stream {
        let result = generate_streaming(&client, &source, &filename, |fragment| {
            eprint!("{}", fragment);
        })
        .await;
        eprintln!();
        result
    } else {
        generate(&client, &source, &filename, false).await
    };

    let generated = match result {
        Ok(generated) => generated,
        Err(e) => {
            eprintln!("Generation failed: {}", e);
            if let Some(raw) = e.raw() {
                eprintln!();
                eprintln!("Raw response:");
                eprintln!("{}", raw);
            }
            return ExitCode::FAILURE;
        }
    };

    for warning in &generated.warnings {
        eprintln!("Warning: {}", warning);
    }

    if json {
        return match serde_json::to_string_pretty(&generated.report) {
            Ok(text) => {
                println!("{}", text);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Error encoding report: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    write_export(&generated, format, output)
}

fn cmd_prompt(file: PathBuf) -> ExitCode {
    let Some(source) = read_source(&file) else {
        return ExitCode::FAILURE;
    };
    let prompt = build_messages(&source, &display_name(&file));

    println!("--- system ---");
    println!("{}", prompt.system.content);
    println!();
    println!("--- user ---");
    println!("{}", prompt.user.content);
    ExitCode::SUCCESS
}

fn cmd_render(
    report: PathBuf,
    filename: Option<String>,
    format: ExportFormat,
    output: Option<PathBuf>,
) -> ExitCode {
    let Some(text) = read_source(&report) else {
        return ExitCode::FAILURE;
    };

    let filename = filename.unwrap_or_else(|| {
        let stem = report
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "report".to_string());
        format!("{stem}.py")
    });

    let parsed = match parse_response(&text) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("Invalid report '{}': {}", report.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let generated = GeneratedReport::new(filename, parsed, text);
    for warning in &generated.warnings {
        eprintln!("Warning: {}", warning);
    }

    write_export(&generated, format, output)
}

fn write_export(
    generated: &GeneratedReport,
    format: ExportFormat,
    output: Option<PathBuf>,
) -> ExitCode {
    let artifact: ExportArtifact = match export(&generated.report, &generated.filename, format) {
        Ok(artifact) => artifact,
        Err(e) => {
            eprintln!("Export failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let path = output.unwrap_or_else(|| PathBuf::from(&artifact.filename));
    match fs::write(&path, &artifact.bytes) {
        Ok(()) => {
            println!("Wrote {} ({} bytes)", path.display(), artifact.bytes.len());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error writing '{}': {}", path.display(), e);
            ExitCode::FAILURE
        }
    }
}
