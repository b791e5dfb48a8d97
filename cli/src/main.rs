use std::path::{Component, Path, PathBuf};
use std::sync::Once;

static TRACE_INIT: Once = Once::new();
const DEFAULT_TRACE_FILTER: &str = "fastx_core::compile=debug,fastx_core=info,fastx_cli=info";

use anyhow::Context;
use clap::{Parser, Subcommand};
use fastx_core::{
    CompileOptions, Evaluated, Interp,
    token::{Token, Tokenizer},
};
use serde::Deserialize;

#[cfg(test)]
mod main_test;
mod repl;

#[derive(Debug, Parser)]
#[command(
    name = "fastx",
    author,
    version,
    about = "Closure-compiling evaluator for Go-style index expressions",
    long_about = None
)]
struct CliArgs {
    /// Subcommands like `eval EXPR`
    #[command(subcommand)]
    command: Option<Commands>,

    /// If no subcommand, treat as a source file to execute
    #[arg(value_name = "FILE", value_parser = parse_sanitized_path)]
    file: Option<PathBuf>,

    /// Do not fold index expressions whose operands are constant
    #[arg(long, global = true)]
    no_fold: bool,

    /// TOML file with a `[compile]` table
    #[arg(long, global = true, value_name = "FILE", value_parser = parse_sanitized_path)]
    config: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Evaluate statements given on the command line.
    Eval {
        /// Source to evaluate, e.g. `[]int{1, 2}[1]`
        #[arg(value_name = "EXPR")]
        source: String,
        /// Bind a variable before evaluating, as `name := EXPR`
        #[arg(long = "let", value_name = "NAME=EXPR")]
        lets: Vec<String>,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Config file layout.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Config {
    compile: CompileOptions,
}

fn read_file_content(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read file '{}'", path.display()))
}

fn sanitize_path(raw: &str) -> anyhow::Result<PathBuf> {
    let p = Path::new(raw);

    for comp in p.components() {
        if matches!(comp, Component::ParentDir) {
            return Err(anyhow::anyhow!(
                "Parent directory components ('..') are not allowed in file paths."
            ));
        }
    }

    Ok(p.to_path_buf())
}

fn parse_sanitized_path(raw: &str) -> Result<PathBuf, String> {
    sanitize_path(raw).map_err(|e| e.to_string())
}

fn env_toggle_enabled(raw: &str) -> bool {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return false;
    }
    !(trimmed.eq_ignore_ascii_case("0") || trimmed.eq_ignore_ascii_case("false") || trimmed.eq_ignore_ascii_case("off"))
}

fn filter_expr_from(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("1")
        || trimmed.eq_ignore_ascii_case("true")
        || trimmed.eq_ignore_ascii_case("on")
    {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// `FASTX_TRACE=1` enables the default filter; any other non-false value is
/// used as the filter itself.
fn maybe_init_tracing() {
    let raw = match std::env::var("FASTX_TRACE") {
        Ok(value) => value,
        Err(_) => return,
    };

    if !env_toggle_enabled(&raw) {
        return;
    }

    TRACE_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        use tracing_subscriber::fmt;

        let filter_expr = filter_expr_from(&raw).or_else(|| std::env::var("RUST_LOG").ok());

        let builder = fmt().with_writer(std::io::stderr);

        let builder = match filter_expr.and_then(|expr| EnvFilter::try_new(expr).ok()) {
            Some(filter) => builder.with_env_filter(filter),
            None => builder.with_env_filter(DEFAULT_TRACE_FILTER),
        };

        let _ = builder.try_init();
    });
}

fn load_options(config: Option<&Path>, no_fold: bool) -> anyhow::Result<CompileOptions> {
    let mut options = match config {
        Some(path) => {
            let raw = read_file_content(path)?;
            let config: Config =
                toml::from_str(&raw).with_context(|| format!("Invalid config file '{}'", path.display()))?;
            config.compile
        }
        None => CompileOptions::default(),
    };
    if no_fold {
        options.fold_constants = false;
    }
    Ok(options)
}

/// Split `name=EXPR` from `--let`.
pub(crate) fn split_let(raw: &str) -> anyhow::Result<(&str, &str)> {
    let (name, expr) = raw
        .split_once('=')
        .ok_or_else(|| anyhow::anyhow!("--let expects NAME=EXPR, got '{}'", raw))?;
    let name = name.trim();
    match Tokenizer::tokenize(name) {
        Ok(tokens) if matches!(tokens.as_slice(), [Token::Id(_)]) => Ok((name, expr.trim())),
        _ => anyhow::bail!("--let name '{}' is not an identifier", name),
    }
}

fn print_results(results: &[Evaluated], json: bool) -> anyhow::Result<()> {
    let shown: Vec<&Evaluated> = results.iter().filter(|r| !matches!(r, Evaluated::Bound(_))).collect();
    if json {
        println!("{}", serde_json::to_string(&shown)?);
        return Ok(());
    }
    for result in shown {
        println!("{}", result);
    }
    Ok(())
}

fn run_eval(interp: &mut Interp, source: &str, lets: &[String], json: bool) -> anyhow::Result<()> {
    for raw in lets {
        let (name, expr) = split_let(raw)?;
        interp
            .eval_line(&format!("{} := {}", name, expr))
            .map_err(|e| anyhow::anyhow!("--let {}: {}", name, e))?;
    }
    let results = interp.eval_line(source).map_err(|e| anyhow::anyhow!("{}", e))?;
    print_results(&results, json)
}

fn run_file(interp: &mut Interp, path: &Path) -> anyhow::Result<()> {
    let src = read_file_content(path)?;
    let results = interp
        .eval_line(&src)
        .map_err(|e| anyhow::anyhow!("{}: {}", path.display(), e))?;
    print_results(&results, false)
}

fn main() -> anyhow::Result<()> {
    maybe_init_tracing();

    let CliArgs {
        command,
        file,
        no_fold,
        config,
    } = CliArgs::parse();
    let options = load_options(config.as_deref(), no_fold)?;
    let mut interp = Interp::with_options(options);

    match (command, file) {
        (Some(Commands::Eval { source, lets, json }), _) => run_eval(&mut interp, &source, &lets, json),
        (None, Some(path)) => run_file(&mut interp, &path),
        // No args: enter REPL
        (None, None) => repl::run(interp),
    }
}
