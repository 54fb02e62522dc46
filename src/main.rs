mod cli;

use std::fs;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{CaptionsArgs, Cli, Commands, MergeArgs, ProbeArgs, RenderArgs};
use ffcompose::core::caption::{segment_captions, write_ass, CaptionStyle, WordTiming};
use ffcompose::core::config::ToolPaths;
use ffcompose::core::media::MediaInspector;
use ffcompose::core::model::PanZoomPreset;
use ffcompose::core::runner::FfmpegRunner;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli) {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let tools = cli.tool_paths();
    match cli.command {
        Commands::Render(args) => render(args, &tools),
        Commands::Probe(args) => probe(args, &tools),
        Commands::Captions(args) => captions(args),
        Commands::Merge(args) => merge(args, &tools),
        Commands::Presets => {
            for preset in PanZoomPreset::ALL {
                let marker = if preset == PanZoomPreset::default() { " (default)" } else { "" };
                println!("{preset}{marker}");
            }
            Ok(())
        }
    }
}

fn render(args: RenderArgs, tools: &ToolPaths) -> Result<()> {
    let dry_run = args.dry_run;
    let builder = cli::render_args_to_builder(args, tools).context("invalid render request")?;

    if dry_run {
        let command = builder
            .build_command()
            .context("failed to assemble render command")?;
        println!("{command}");
        return Ok(());
    }

    if !builder.execute(&FfmpegRunner::new()) {
        bail!("video build failed");
    }
    println!("{}", builder.output().display());
    Ok(())
}

fn probe(args: ProbeArgs, tools: &ToolPaths) -> Result<()> {
    let inspector = tools.inspector();
    let report = if args.audio {
        serde_json::to_string_pretty(&inspector.audio_info(&args.input)?)?
    } else {
        serde_json::to_string_pretty(&inspector.video_info(&args.input)?)?
    };
    println!("{report}");
    Ok(())
}

fn captions(args: CaptionsArgs) -> Result<()> {
    let raw = fs::read_to_string(&args.words)
        .with_context(|| format!("failed to read word timings from {}", args.words.display()))?;
    let words: Vec<WordTiming> = serde_json::from_str(&raw)
        .context("word timings must be a JSON array of {text, start_ts, end_ts}")?;

    let style = match &args.style {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read caption style from {}", path.display()))?;
            serde_json::from_str::<CaptionStyle>(&raw).context("invalid caption style")?
        }
        None => CaptionStyle::default(),
    };

    let segments = segment_captions(&words, args.limits());
    write_ass(&args.output, &segments, args.size, &style)?;
    tracing::info!(
        words = words.len(),
        segments = segments.len(),
        output = %args.output.display(),
        "subtitles written"
    );
    Ok(())
}

fn merge(args: MergeArgs, tools: &ToolPaths) -> Result<()> {
    let dry_run = args.dry_run;
    let builder = cli::merge_args_to_builder(args, tools);

    if dry_run {
        println!("{}", builder.build_command()?);
        return Ok(());
    }
    if !builder.execute(&FfmpegRunner::new()) {
        bail!("merging videos failed");
    }
    Ok(())
}
