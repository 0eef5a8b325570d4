use std::fs;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use flag_resolver_core::{
    Application, Context, ResolveError, Resolved, ResolverChain, validate_application,
};
use flag_resolver_sources::{ChainBuilder, DocumentFormat, FileSource, SourceConfig};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// CLI-specific output format enum with clap argument parsing support.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliOutputFormat {
    Json,
    Yaml,
}

#[derive(Debug, Parser)]
#[command(name = "flag-resolve")]
#[command(about = "Inspect how flag values resolve from the command line, environment and config files")]
struct Cli {
    /// Log resolution decisions to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the effective value and origin of every visible flag.
    Resolve(ResolveArgs),
    /// Validate an application schema and its configured sources.
    Validate(ChainArgs),
}

#[derive(Debug, Args)]
struct ChainArgs {
    /// Application schema JSON file.
    #[arg(long)]
    schema: PathBuf,
    /// Chain configuration YAML file (replaces --source and --strict).
    #[arg(long)]
    config: Option<PathBuf>,
    /// JSON or YAML document to consult, in order, between env and defaults.
    #[arg(long = "source", conflicts_with = "config")]
    sources: Vec<PathBuf>,
    /// Reject --source keys that match no declared flag.
    #[arg(long, conflicts_with = "config")]
    strict: bool,
}

#[derive(Debug, Args)]
struct ResolveArgs {
    #[command(flatten)]
    chain: ChainArgs,
    /// Space-separated command path (e.g. "remote add").
    #[arg(long, default_value = "")]
    command: String,
    /// Literal command-line value, as NAME=VALUE.
    #[arg(long = "set", value_parser = parse_assignment)]
    values: Vec<(String, String)>,
    /// Output format.
    #[arg(long, default_value = "json")]
    format: CliOutputFormat,
}

#[derive(Debug, Serialize)]
struct ResolveReport {
    command: String,
    resolvers: Vec<String>,
    values: Vec<Resolved>,
}

fn main() {
    let cli = Cli::parse();
    setup_tracing(cli.verbose);

    let result = match cli.command {
        Command::Resolve(args) => run_resolve(args),
        Command::Validate(args) => run_validate(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn setup_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run_resolve(args: ResolveArgs) -> Result<(), String> {
    let app = load_schema(&args.chain.schema)?;
    check_schema(&app, &args.chain.schema)?;
    let chain = build_chain(&args.chain)?;
    chain.validate(&app).map_err(|err| err.to_string())?;

    let path: Vec<&str> = args.command.split_whitespace().collect();
    let mut ctx = Context::for_command(&app, &path).map_err(|err| err.to_string())?;
    for (name, value) in &args.values {
        ctx.set_value(name, value);
    }

    let values = chain.resolve_context(&ctx).map_err(|err| err.to_string())?;
    let report = ResolveReport {
        command: ctx.command_path(),
        resolvers: chain.names().into_iter().map(String::from).collect(),
        values,
    };

    let output = match args.format {
        CliOutputFormat::Json => serde_json::to_string_pretty(&report)
            .map_err(|err| format!("Failed to serialize report: {err}"))?,
        CliOutputFormat::Yaml => serde_yaml::to_string(&report)
            .map_err(|err| format!("Failed to serialize report: {err}"))?,
    };
    println!("{output}");
    Ok(())
}

fn run_validate(args: ChainArgs) -> Result<(), String> {
    let app = load_schema(&args.schema)?;
    check_schema(&app, &args.schema)?;

    let chain = build_chain(&args)?;
    chain.validate(&app).map_err(|err| err.to_string())?;

    println!("ok");
    Ok(())
}

fn load_schema(path: &Path) -> Result<Application, String> {
    let file = fs::File::open(path)
        .map_err(|err| format!("Failed to open schema '{}': {err}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|err| format!("Failed to parse schema '{}': {err}", path.display()))
}

/// Rejects schemas whose flags cannot be resolved unambiguously.
fn check_schema(app: &Application, path: &Path) -> Result<(), String> {
    match validate_application(app).into_iter().next() {
        Some(err) => Err(format!(
            "{}: {}",
            path.display(),
            ResolveError::InvalidApplication(err)
        )),
        None => Ok(()),
    }
}

fn build_chain(args: &ChainArgs) -> Result<ResolverChain, String> {
    let builder = match &args.config {
        Some(config) => ChainBuilder::from_config_file(config).map_err(|err| err.to_string())?,
        None => {
            let mut builder = ChainBuilder::new().env();
            for path in &args.sources {
                builder = builder.source(file_source(path, args.strict)?);
            }
            builder.defaults()
        }
    };

    let chain = builder.build().map_err(|err| err.to_string())?;
    debug!(resolvers = ?chain.names(), "Resolver chain ready");
    Ok(chain)
}

fn file_source(path: &Path, strict: bool) -> Result<SourceConfig, String> {
    let file = FileSource {
        path: path.to_path_buf(),
        strict,
        optional: false,
    };
    match DocumentFormat::from_path(path) {
        Some(DocumentFormat::Json) => Ok(SourceConfig::Json(file)),
        Some(DocumentFormat::Yaml) => Ok(SourceConfig::Yaml(file)),
        None => Err(format!(
            "Unsupported source '{}': expected .json, .yaml or .yml",
            path.display()
        )),
    }
}

fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{raw}'"))?;
    let name = name.trim_start_matches('-');
    if name.is_empty() {
        return Err(format!("missing flag name in '{raw}'"));
    }
    Ok((name.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use flag_resolver_core::{Command as CliCommand, Flag};

    use super::*;

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            parse_assignment("max-retries=5").unwrap(),
            ("max-retries".to_string(), "5".to_string())
        );
        assert_eq!(
            parse_assignment("--url=http://x?a=b").unwrap(),
            ("url".to_string(), "http://x?a=b".to_string())
        );
        assert_eq!(parse_assignment("empty=").unwrap().1, "");
        assert!(parse_assignment("novalue").is_err());
        assert!(parse_assignment("=x").is_err());
    }

    #[test]
    fn test_file_source_by_extension() {
        assert!(matches!(
            file_source(Path::new("a.json"), true),
            Ok(SourceConfig::Json(FileSource { strict: true, .. }))
        ));
        assert!(matches!(
            file_source(Path::new("a.yml"), false),
            Ok(SourceConfig::Yaml(_))
        ));
        assert!(file_source(Path::new("a.ini"), false).is_err());
    }

    #[test]
    fn test_config_conflicts_with_source_options() {
        for extra in [["--source", "a.json"].as_slice(), ["--strict"].as_slice()] {
            let mut args = vec!["flag-resolve", "validate", "--schema", "app.json", "--config", "chain.yaml"];
            args.extend_from_slice(extra);
            let err = Cli::try_parse_from(args).unwrap_err();
            assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
        }
    }

    #[test]
    fn test_check_schema_names_file() {
        let app = Application::new("tool")
            .with_flag(Flag::new("port"))
            .with_command(CliCommand::new("run").with_flag(Flag::new("port")));
        let err = check_schema(&app, Path::new("app.json")).unwrap_err();
        assert_eq!(err, "app.json: invalid application: duplicate flag in scope: port");

        assert!(check_schema(&Application::new("tool"), Path::new("app.json")).is_ok());
    }

    #[test]
    fn test_cli_parses_repeated_options() {
        let cli = Cli::try_parse_from([
            "flag-resolve",
            "resolve",
            "--schema",
            "app.json",
            "--source",
            "a.json",
            "--source",
            "b.yaml",
            "--set",
            "port=1",
            "--command",
            "remote add",
            "--format",
            "yaml",
        ])
        .unwrap();
        let Command::Resolve(args) = cli.command else {
            panic!("expected resolve");
        };
        assert_eq!(args.chain.sources.len(), 2);
        assert_eq!(args.values, vec![("port".to_string(), "1".to_string())]);
        assert_eq!(args.command, "remote add");
    }
}
