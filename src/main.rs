use anyhow::{bail, Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use yamlpatch::config::Config;
use yamlpatch::file::apply_file;
use yamlpatch::file::loader::read_yaml_stdin;
use yamlpatch::file::saver::save_yaml_text;
use yamlpatch::patch::{and, apply_str, eq, or, parse_path, set, Condition, StreamReport, Traversal};

/// yamlpatch - set a value in every document of a YAML stream
#[derive(Parser)]
#[command(name = "yamlpatch")]
#[command(version)]
#[command(
    about = "Set a value at a key path in YAML documents, keeping comments and styles",
    long_about = None
)]
struct Cli {
    /// FILE PATH VALUE, or PATH VALUE to read the document from stdin.
    /// PATH is dot-separated; escape a literal dot as `\.`
    #[arg(num_args = 2..=3, required = true, value_name = "ARGS")]
    args: Vec<String>,

    /// Only patch documents where PATH equals VALUE (repeatable)
    #[arg(long = "when", value_name = "PATH=VALUE")]
    when: Vec<String>,

    /// Patch when any --when clause holds instead of all of them
    #[arg(long)]
    any: bool,

    /// Write VALUE as an integer instead of a string
    #[arg(long)]
    int: bool,

    /// Rewrite FILE instead of printing the result
    #[arg(short = 'i', long)]
    in_place: bool,

    /// Spaces per indentation level (overrides the config file)
    #[arg(long)]
    indent: Option<usize>,

    /// Config file to use instead of ~/.config/yamlpatch/config.toml
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log what the patch does to stderr
    #[arg(short, long)]
    verbose: bool,

    /// Log each patched document's node tree as JSON
    #[arg(long)]
    dump_nodes: bool,
}

fn init_tracing(config: &Config, verbose: bool) {
    let fallback = if verbose || config.dump_nodes {
        "debug"
    } else {
        config.log_level.as_str()
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn build_patch(path: &str, value: &str, as_int: bool) -> Result<Traversal> {
    let path = parse_path(path)?;
    let patch = if as_int {
        let number: i64 = value
            .parse()
            .with_context(|| format!("--int given but {:?} is not an integer", value))?;
        set(path, number)?
    } else {
        set(path, value)?
    };
    Ok(patch)
}

fn build_condition(clauses: &[String], any: bool) -> Result<Option<Condition>> {
    if clauses.is_empty() {
        return Ok(None);
    }

    let conditions = clauses
        .iter()
        .map(|clause| -> Result<Condition> {
            let (path, value) = clause
                .split_once('=')
                .with_context(|| format!("--when expects PATH=VALUE, got {:?}", clause))?;
            Ok(eq(parse_path(path)?, value)?)
        })
        .collect::<Result<Vec<_>>>()?;

    let condition = if any { or(conditions)? } else { and(conditions)? };
    Ok(Some(condition))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load(),
    };
    if let Some(indent) = cli.indent {
        config.indent_size = indent;
    }
    if cli.dump_nodes {
        config.dump_nodes = true;
    }

    init_tracing(&config, cli.verbose);

    let (file, path, value) = match cli.args.as_slice() {
        [file, path, value] => (Some(file.as_str()), path.as_str(), value.as_str()),
        [path, value] => (None, path.as_str(), value.as_str()),
        other => bail!(
            "invalid number of args: you should pass 2 or 3 args, but got: {:?}",
            other
        ),
    };
    if cli.in_place && file.is_none() {
        bail!("--in-place needs a FILE argument");
    }

    let patch = build_patch(path, value, cli.int)?;
    let condition = build_condition(&cli.when, cli.any)?;
    let options = config.patch_options();

    let report: StreamReport = match file {
        Some(file) => apply_file(file, &patch, condition.as_ref(), &options)?,
        None => {
            let input = read_yaml_stdin()?;
            apply_str(&input, &patch, condition.as_ref(), &options).context("Failed to patch stdin")?
        }
    };

    for failure in &report.failures {
        tracing::info!(document = failure.index, error = %failure.error, "document left unchanged");
    }
    match file {
        Some(file) if cli.in_place => {
            let output = report.into_result()?;
            save_yaml_text(file, &output, &config)?;
        }
        _ => write_report(report, &mut std::io::stdout().lock())?,
    }

    Ok(())
}

/// Writes the whole stream, then fails if no document could be patched.
fn write_report(report: StreamReport, out: &mut impl Write) -> Result<()> {
    out.write_all(report.output.as_bytes())
        .context("Failed to write output")?;
    out.flush().context("Failed to write output")?;
    report.ensure_any_succeeded()?;
    Ok(())
}
