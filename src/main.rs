use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use std::process::Stdio;
use suthing::cli::{Cli, Command, OutputFormat};
use suthing::compare;
use suthing::connection::ConfigFactory;
use suthing::file_handle::FileHandle;
use suthing::instrument::{profile, secureit, timeit, ArgList, Func, Guarded, Report};
use suthing::profiler::SProfiler;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

fn convert(input: &Path, output: &Path) -> Result<()> {
    let value = FileHandle::load(input)
        .with_context(|| format!("Failed to load {}", input.display()))?;
    FileHandle::dump(&value, output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    tracing::debug!(input = %input.display(), output = %output.display(), "converted");
    Ok(())
}

/// Returns whether the two files hold deeply equal values
fn equals(left: &Path, right: &Path) -> Result<bool> {
    let a = FileHandle::load(left).with_context(|| format!("Failed to load {}", left.display()))?;
    let b =
        FileHandle::load(right).with_context(|| format!("Failed to load {}", right.display()))?;

    if compare::equals(&a, &b) {
        println!("equal");
        return Ok(true);
    }
    for path in compare::differences(&a, &b) {
        println!("{}", path);
    }
    Ok(false)
}

fn connection(source: &str) -> Result<()> {
    let config = ConfigFactory::create_config(source)
        .with_context(|| format!("Failed to resolve connection config from '{}'", source))?;
    let value = config.to_value()?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

/// Run `command` `repeat` times and report timings; returns the exit code
fn time(repeat: u32, format: OutputFormat, command: &[String]) -> Result<i32> {
    let (program, rest) = command
        .split_first()
        .context("No command given to time")?;
    let args = rest
        .iter()
        .fold(ArgList::new().kwarg("program", program), |list, a| list.arg(a));

    let run = timeit(secureit(Func::new("run", move |args: ArgList| -> Result<i32> {
        let program = args.get("program").context("missing program")?;
        let mut child = std::process::Command::new(program);
        child.args(args.positional());
        if format == OutputFormat::Json {
            // keep stdout parseable
            child.stdout(Stdio::from(std::io::stderr()));
        }
        let status = child
            .status()
            .with_context(|| format!("Failed to spawn '{}'", program))?;
        Ok(status.code().unwrap_or(1))
    })));
    let timed = profile("time", |args: ArgList, _: Option<&mut SProfiler>| run.outcome(args))
        .keyed_by("program")?;

    let mut profiler = SProfiler::new();
    let mut reports: Vec<Report> = Vec::with_capacity(repeat as usize);
    let mut exit_code = 0;
    for _ in 0..repeat {
        let outcome = timed.call(args.clone(), Some(&mut profiler));
        if let Some(err) = outcome.failure() {
            eprintln!("error: {:#}", err);
        }
        exit_code = outcome.value().copied().unwrap_or(1);
        reports.push(outcome.report());
    }

    match format {
        OutputFormat::Text => profiler.print_summary(),
        OutputFormat::Json => {
            let out = serde_json::json!({
                "runs": reports,
                "summary": profiler.summary(),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
    }
    Ok(exit_code)
}

fn main() -> Result<()> {
    let args = Cli::parse();

    // Initialize tracing if --debug flag is set
    init_tracing(args.debug);

    match args.command {
        Command::Convert { input, output } => convert(&input, &output)?,
        Command::Equals { left, right } => {
            if !equals(&left, &right)? {
                std::process::exit(1);
            }
        }
        Command::Connection { source } => connection(&source)?,
        Command::Time {
            repeat,
            format,
            command,
        } => {
            let code = time(repeat, format, &command)?;
            if code != 0 {
                std::process::exit(code);
            }
        }
    }

    Ok(())
}
