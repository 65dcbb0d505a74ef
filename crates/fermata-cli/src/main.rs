use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use fermata_host::{
    ControlKind, FaustHost, HostConfig, TranslatorConfig, UiElement,
};
use hound::{SampleFormat, WavSpec, WavWriter};
use tracing::warn;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init()
        .ok();

    let cli = Cli::parse();
    match cli.command {
        Commands::Check(args) => execute_check(args),
        Commands::Render(args) => execute_render(args),
    }
}

#[derive(Parser)]
#[command(author, version, about = "Live-recompiling Faust DSP host")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate, compile, and load a DSP source, reporting what it exposes.
    Check(CheckArgs),
    /// Run a DSP source offline and write its output to a WAV file.
    Render(RenderArgs),
}

#[derive(Args)]
struct CheckArgs {
    /// Path to the Faust source file.
    source: PathBuf,
    /// Path to the faust binary.
    #[arg(long)]
    faust: Option<PathBuf>,
}

#[derive(Args)]
struct RenderArgs {
    /// Path to the Faust source file.
    source: PathBuf,
    /// Output WAV path.
    #[arg(short, long)]
    output: PathBuf,
    /// Seconds of audio to render.
    #[arg(long, default_value_t = 2.0)]
    seconds: f64,
    /// Render sample rate.
    #[arg(long, default_value_t = 44_100)]
    sample_rate: u32,
    /// Block size used for processing.
    #[arg(long, default_value_t = 512)]
    block_size: usize,
    /// Path to the faust binary.
    #[arg(long)]
    faust: Option<PathBuf>,
}

fn host_config(faust: Option<PathBuf>, sample_rate: f64, block_size: usize) -> HostConfig {
    let mut translator = TranslatorConfig::default();
    if let Some(path) = faust {
        translator.faust_path = path;
    }
    HostConfig {
        translator,
        max_block_size: block_size,
        sample_rate,
    }
}

fn execute_check(args: CheckArgs) -> Result<()> {
    let mut host = FaustHost::new(host_config(args.faust, 44_100.0, 512))?;
    let report = host
        .request_load(&args.source)
        .with_context(|| format!("loading {}", args.source.display()))?;

    for warning in &report.warnings {
        warn!("{warning}");
    }
    match report.unit {
        Some(unit) => println!("loaded {unit}"),
        None => println!("loaded native module"),
    }
    println!("{} input(s), {} output(s)", report.inputs, report.outputs);
    println!("controls:");
    print_tree(&report.ui_root, 1);
    Ok(())
}

fn print_tree(element: &UiElement, depth: usize) {
    let indent = "  ".repeat(depth);
    match element {
        UiElement::Group(group) => {
            let label = if group.label.is_empty() {
                "(root)"
            } else {
                group.label.as_str()
            };
            println!("{indent}[{label}]");
            for child in &group.children {
                print_tree(child, depth + 1);
            }
        }
        UiElement::Control(control) => {
            let kind = match control.kind {
                ControlKind::Button => "button",
                ControlKind::CheckBox => "checkbox",
                ControlKind::Slider => "slider",
                ControlKind::Knob => "knob",
                ControlKind::Bargraph => "bargraph",
            };
            println!(
                "{indent}{kind} `{}` = {} [{}, {}]",
                control.label,
                control.value(),
                control.min,
                control.max
            );
        }
    }
}

fn execute_render(args: RenderArgs) -> Result<()> {
    let rate = args.sample_rate as f64;
    let mut host = FaustHost::new(host_config(args.faust, rate, args.block_size))?;
    let report = host
        .request_load(&args.source)
        .with_context(|| format!("loading {}", args.source.display()))?;
    for warning in &report.warnings {
        warn!("{warning}");
    }
    if report.outputs == 0 {
        bail!("module has no output channels, nothing to render");
    }

    let spec = WavSpec {
        channels: report.outputs as u16,
        sample_rate: args.sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(&args.output, spec)
        .with_context(|| format!("creating {}", args.output.display()))?;

    let inputs = vec![vec![0.0f64; args.block_size]; report.inputs];
    let mut outputs = vec![vec![0.0f64; args.block_size]; report.outputs];
    let mut remaining = (args.seconds * rate).ceil() as usize;

    while remaining > 0 {
        let frames = remaining.min(args.block_size);
        let input_refs: Vec<&[f64]> = inputs.iter().map(|plane| plane.as_slice()).collect();
        let mut output_refs: Vec<&mut [f64]> = outputs
            .iter_mut()
            .map(|plane| plane.as_mut_slice())
            .collect();
        host.process_block(&input_refs, &mut output_refs, frames);

        for frame in 0..frames {
            for plane in &outputs {
                writer.write_sample(plane[frame] as f32)?;
            }
        }
        remaining -= frames;
    }

    writer.finalize()?;
    println!(
        "rendered {}s at {}Hz to {}",
        args.seconds,
        args.sample_rate,
        args.output.display()
    );
    Ok(())
}
