//! Command-line interface definitions and dispatch.

use anyhow::Context;
use clap::{Parser, Subcommand};
use mugplot_camtools::{convert_file, svg_to_gcode, EnvelopeValidator};
use mugplot_communication::{load_gcode, strip_comments, GcodeStreamer, StreamResult};
use mugplot_core::ProgressFn;
use mugplot_settings::{Config, MachineSettings};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Width of the terminal progress bar in characters
const PROGRESS_WIDTH: usize = 40;

/// Mug pen plotter: SVG to G-code conversion and streaming
#[derive(Parser, Debug)]
#[command(name = "mugplot", version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Config file path (.toml or .json)
    #[arg(short, long, global = true, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert an SVG file to a G-code program
    Convert {
        /// SVG file to convert
        #[arg(value_hint = clap::ValueHint::FilePath)]
        input: PathBuf,

        /// Output path (default: input with a .gcode extension)
        #[arg(value_hint = clap::ValueHint::FilePath)]
        output: Option<PathBuf>,
    },

    /// Stream an existing G-code program to the controller
    Stream {
        /// G-code file to send
        #[arg(value_hint = clap::ValueHint::FilePath)]
        input: PathBuf,
    },

    /// Convert an SVG file and stream it straight away
    Run {
        /// SVG file to plot
        #[arg(value_hint = clap::ValueHint::FilePath)]
        input: PathBuf,
    },

    /// Check an SVG or G-code file against the machine envelope
    Check {
        /// SVG or G-code file
        #[arg(value_hint = clap::ValueHint::FilePath)]
        input: PathBuf,
    },

    /// Print one controller status report
    Status,

    /// Soft-reset the controller
    Reset,
}

/// Run a parsed command line
pub fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Convert { input, output } => {
            let written = convert_file(&input, output.as_deref(), &config.machine)
                .with_context(|| format!("Failed to convert {}", input.display()))?;
            let lines = read_lines(&written)?;
            for violation in EnvelopeValidator::new(&config.machine).check(&lines) {
                tracing::warn!("{}", violation);
            }
            println!("Wrote {} ({} lines)", written.display(), lines.len());
            Ok(ExitCode::SUCCESS)
        }
        Commands::Stream { input } => {
            let lines = load_gcode(&input)
                .with_context(|| format!("Failed to load {}", input.display()))?;
            stream_program(&config, &lines)
        }
        Commands::Run { input } => {
            let program = svg_to_gcode(&input, &config.machine)
                .with_context(|| format!("Failed to convert {}", input.display()))?;
            for violation in EnvelopeValidator::new(&config.machine).check(&program) {
                tracing::warn!("{}", violation);
            }
            let lines: Vec<String> = program
                .iter()
                .map(|line| strip_comments(line))
                .filter(|line| !line.is_empty())
                .collect();
            stream_program(&config, &lines)
        }
        Commands::Check { input } => {
            let violations = check_file(&input, &config.machine)?;
            if violations.is_empty() {
                println!("{}: within envelope", input.display());
                return Ok(ExitCode::SUCCESS);
            }
            for violation in &violations {
                println!("{}", violation);
            }
            println!("{}: {} violations", input.display(), violations.len());
            Ok(ExitCode::FAILURE)
        }
        Commands::Status => {
            let mut streamer = GcodeStreamer::open(&config.serial)?;
            match streamer.query_status()? {
                Some(report) => println!("{}", report),
                None => println!(
                    "No status report within {} ms",
                    config.serial.timeout_ms
                ),
            }
            streamer.close()?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Reset => {
            let mut streamer = GcodeStreamer::open(&config.serial)?;
            streamer.soft_reset()?;
            streamer.close()?;
            println!("Soft reset sent");
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn is_svg(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("svg"))
}

/// Lines of a program file exactly as written, comments and blanks included
fn read_lines(path: &Path) -> anyhow::Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(content.lines().map(str::to_string).collect())
}

/// Envelope violations of an SVG (converted first) or G-code file
///
/// G-code files are checked as written so line numbers match the file.
fn check_file(input: &Path, machine: &MachineSettings) -> anyhow::Result<Vec<String>> {
    let lines = if is_svg(input) {
        svg_to_gcode(input, machine)?
    } else {
        read_lines(input)?
    };
    Ok(EnvelopeValidator::new(machine).check(&lines))
}

fn stream_program(config: &Config, lines: &[String]) -> anyhow::Result<ExitCode> {
    let mut streamer = GcodeStreamer::open(&config.serial)?;

    let mut draw = |done: usize, total: usize| draw_progress(done, total);
    let result = streamer.stream(lines, Some(&mut draw as ProgressFn))?;
    eprintln!();
    streamer.close()?;

    report(&result);
    Ok(if result.completed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn draw_progress(done: usize, total: usize) {
    let filled = if total == 0 {
        PROGRESS_WIDTH
    } else {
        (done * PROGRESS_WIDTH / total).min(PROGRESS_WIDTH)
    };
    let mut stderr = std::io::stderr().lock();
    // Progress output is best effort.
    let _ = write!(
        stderr,
        "\r[{}{}] {}/{}",
        "#".repeat(filled),
        "-".repeat(PROGRESS_WIDTH - filled),
        done,
        total
    );
    let _ = stderr.flush();
}

fn report(result: &StreamResult) {
    println!(
        "Sent {} lines in {:.1}s",
        result.lines_sent,
        result.elapsed.as_secs_f64()
    );
    for error in &result.errors {
        println!("  {}", error);
    }
    if let Some(alarm) = &result.alarm {
        println!(
            "Stopped by {}; {} lines in flight have unknown outcome",
            alarm, result.unacknowledged
        );
    }
    if result.cancelled {
        println!("Cancelled");
    }
}
