// Folio CLI - deterministic document analysis from the shell

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use folio_core::config::{load_corpus, schema_source};
use folio_core::{
    hasher, parse_document, Domain, DocumentEnvelope, ParseOptions, ParseReport,
    PdfTextDiagnostics, PipelineConfig, Profile,
};

const EXIT_SUCCESS: u8 = 0;
const EXIT_ERROR: u8 = 1;
/// The run succeeded but found what the caller asked to fail on
const EXIT_FINDINGS: u8 = 2;

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Deterministic analysis of legal and linguistic documents")]
#[command(version)]
struct Cli {
    /// Log pipeline stages to stderr (RUST_LOG overrides)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a document and print the report
    #[command(after_help = "\
Examples:
  folio parse pleading.txt --domain legal
  folio parse pleading.txt --config folio.yaml --corpus case.json --format summary
  folio parse transcript.txt --domain linguistic --language iku
  cat notes.txt | folio parse - --domain linguistic --format yaml")]
    Parse {
        /// Input text file (- for stdin)
        file: PathBuf,

        /// Pipeline config (YAML or JSON)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Document domain; overrides the config
        #[arg(long, short = 'd')]
        domain: Option<Domain>,

        /// ISO 639-3 language code; overrides the config
        #[arg(long, short = 'l')]
        language: Option<String>,

        /// Explicit profile; overrides the language
        #[arg(long, short = 'p')]
        profile: Option<Profile>,

        /// Case corpus JSON for reference integrity
        #[arg(long)]
        corpus: Option<PathBuf>,

        /// PDF/OCR layout diagnostics JSON
        #[arg(long)]
        diagnostics: Option<PathBuf>,

        /// Output format
        #[arg(long, short = 'f', default_value = "json")]
        format: OutputFormat,

        /// Exit with code 2 when the legal report has critical violations
        #[arg(long)]
        fail_on_critical: bool,
    },

    /// Print the content hash of a string
    #[command(after_help = "\
Examples:
  folio hash 'line one'
  folio hash 'line one' --line 0")]
    Hash {
        text: String,

        /// Hash as a block id at this line number
        #[arg(long)]
        line: Option<usize>,
    },

    /// Recompute the ids in a saved envelope or report
    #[command(after_help = "\
Examples:
  folio parse doc.txt > report.json && folio verify report.json")]
    Verify {
        /// Envelope JSON, or a full report containing one (- for stdin)
        file: PathBuf,
    },

    /// Validate a pipeline config without running it
    CheckConfig {
        file: PathBuf,
    },

    /// Print the JSON Schema configs are validated against
    Schema,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Yaml,
    Summary,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Parse {
            file,
            config,
            domain,
            language,
            profile,
            corpus,
            diagnostics,
            format,
            fail_on_critical,
        } => {
            let args = ParseArgs {
                config,
                domain,
                language,
                profile,
                corpus,
                diagnostics,
            };
            cmd_parse(&file, args, format, fail_on_critical)
        }
        Commands::Hash { text, line } => cmd_hash(&text, line),
        Commands::Verify { file } => cmd_verify(&file),
        Commands::CheckConfig { file } => cmd_check_config(&file),
        Commands::Schema => write_stdout(schema_source()).map(|()| EXIT_SUCCESS),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "folio_core=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Parse flags that shape the options.
struct ParseArgs {
    config: Option<PathBuf>,
    domain: Option<Domain>,
    language: Option<String>,
    profile: Option<Profile>,
    corpus: Option<PathBuf>,
    diagnostics: Option<PathBuf>,
}

impl ParseArgs {
    /// Config file first, then flag overrides.
    fn into_options(self) -> Result<ParseOptions> {
        let config = match &self.config {
            Some(path) => Some(
                PipelineConfig::from_file(path)
                    .with_context(|| format!("loading config {}", path.display()))?,
            ),
            None => None,
        };

        let mut options = match (config, self.domain) {
            (Some(config), domain) => {
                let mut options = ParseOptions::from(config);
                if let Some(domain) = domain {
                    options.domain = domain;
                }
                options
            }
            (None, Some(domain)) => ParseOptions::new(domain),
            (None, None) => anyhow::bail!("either --domain or --config is required"),
        };

        if let Some(language) = self.language {
            options.language = Some(language);
        }
        if let Some(profile) = self.profile {
            options.profile = Some(profile);
        }
        if let Some(path) = &self.corpus {
            let corpus = load_corpus(path)
                .with_context(|| format!("loading corpus {}", path.display()))?;
            options.corpus = Some(corpus);
        }
        if let Some(path) = &self.diagnostics {
            let raw = read_input(path)?;
            let diagnostics: PdfTextDiagnostics = serde_json::from_str(&raw)
                .with_context(|| format!("parsing diagnostics {}", path.display()))?;
            options.diagnostics = Some(diagnostics);
        }

        Ok(options)
    }
}

fn cmd_parse(
    file: &Path,
    args: ParseArgs,
    format: OutputFormat,
    fail_on_critical: bool,
) -> Result<u8> {
    let text = read_input(file)?;
    let options = args.into_options()?;
    tracing::debug!(
        domain = %options.domain,
        profile = %options.resolved_profile(),
        bytes = text.len(),
        "Parsing {}",
        file.display()
    );
    let report = parse_document(&text, &options);

    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(&report)?,
        OutputFormat::Yaml => serde_yaml::to_string(&report)?,
        OutputFormat::Summary => render_summary(&report),
    };
    write_stdout(&rendered)?;

    let critical = report.legal.as_ref().map_or(0, |legal| legal.critical_count);
    if fail_on_critical && critical > 0 {
        return Ok(EXIT_FINDINGS);
    }
    Ok(EXIT_SUCCESS)
}

fn cmd_hash(text: &str, line: Option<usize>) -> Result<u8> {
    let digest = match line {
        Some(line) => hasher::block_id(text, line),
        None => hasher::hash_hex(text),
    };
    write_stdout(&digest)?;
    Ok(EXIT_SUCCESS)
}

fn cmd_verify(file: &Path) -> Result<u8> {
    let raw = read_input(file)?;
    let envelope = envelope_from_json(&raw)
        .with_context(|| format!("reading envelope from {}", file.display()))?;

    match envelope.verify() {
        Ok(()) => {
            write_stdout(&format!(
                "ok {} ({} blocks)",
                envelope.document_id,
                envelope.blocks.len()
            ))?;
            Ok(EXIT_SUCCESS)
        }
        Err(mismatches) => {
            for mismatch in &mismatches {
                eprintln!("mismatch: {}", mismatch);
            }
            Ok(EXIT_FINDINGS)
        }
    }
}

fn cmd_check_config(file: &Path) -> Result<u8> {
    let config = PipelineConfig::from_file(file)
        .with_context(|| format!("loading config {}", file.display()))?;

    let pattern_errors = config.pattern_errors();
    for error in &pattern_errors {
        eprintln!("rule: {}", error);
    }
    if !pattern_errors.is_empty() {
        return Ok(EXIT_FINDINGS);
    }

    write_stdout(&format!(
        "ok: {} domain, {} rules, profile {}",
        config.domain,
        config.custom_rules.len(),
        ParseOptions::from(config.clone()).resolved_profile()
    ))?;
    Ok(EXIT_SUCCESS)
}

/// Accept a bare envelope or a report wrapping one.
fn envelope_from_json(raw: &str) -> Result<DocumentEnvelope> {
    let value: serde_json::Value = serde_json::from_str(raw)?;
    let envelope = match value.get("envelope") {
        Some(inner) => serde_json::from_value(inner.clone())?,
        None => serde_json::from_value(value)?,
    };
    Ok(envelope)
}

fn render_summary(report: &ParseReport) -> String {
    let mut out = String::new();
    let processing = &report.envelope.processing;

    out.push_str(&format!("document  {}\n", report.document_id()));
    out.push_str(&format!(
        "domain    {} (profile {})\n",
        processing.domain, processing.profile
    ));
    out.push_str(&format!(
        "lines     {} retained of {} (avg confidence {:.2})\n",
        report.stats.extracted_lines, report.stats.total_lines, report.stats.average_confidence
    ));
    out.push_str(&format!(
        "tier      {} ({:.2})\n",
        report.tier.recommended_action, report.tier.confidence
    ));
    for signal in &report.tier.signals {
        out.push_str(&format!("  signal  {}\n", signal.feature));
    }

    if !report.custom_extractions.is_empty() {
        out.push_str(&format!("matches   {}\n", report.custom_extractions.len()));
        for m in &report.custom_extractions {
            out.push_str(&format!("  {:<8}{} @{}\n", m.rule_id, m.matched, m.index));
        }
    }

    if let Some(legal) = &report.legal {
        out.push_str(&format!(
            "legal     {} dates, {} references, {} signatures\n",
            legal.dates.len(),
            legal.references.len(),
            legal.signatures.len()
        ));
        for v in &legal.violations {
            out.push_str(&format!(
                "  [{}] {}: {}\n",
                v.severity, v.constraint_id, v.description
            ));
        }
    }

    for w in &report.warnings {
        out.push_str(&format!("warning   {}: {}\n", w.source, w.message));
    }

    out
}

fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("reading stdin")?;
        return Ok(buf);
    }
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn write_stdout(s: &str) -> Result<()> {
    let mut stdout = io::stdout().lock();
    stdout.write_all(s.as_bytes())?;
    if !s.ends_with('\n') {
        stdout.write_all(b"\n")?;
    }
    Ok(())
}
