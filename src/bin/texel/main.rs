//! texel - texel density command-line tool.
//!
//! Usage: texel [-v|-q] <COMMAND> [OPTIONS] <INPUT> [OUTPUT]
//!
//! Run `texel --help` for available commands.
//!
//! # Logging
//!
//! Diagnostics go to stderr. `-v` enables info output from the library,
//! `-vv` debug output; `RUST_LOG` overrides both.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use texel_density::algo::{find_uv_shells, Progress};
use texel_density::density::{
    Aggregation, MeasureOptions, ReferenceResolution, TargetDensity, TexelDensityTool,
};
use texel_density::host::RescaleOptions;
use texel_density::io;

#[derive(Parser)]
#[command(name = "texel")]
#[command(author, version, about = "Texel density CLI", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all log output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display mesh and UV layout information
    Info {
        /// Input mesh file
        input: PathBuf,

        /// Reference texture resolution in texels
        #[arg(short, long, default_value = "2048")]
        resolution: u32,
    },

    /// Measure the texel density of a mesh
    Measure {
        /// Input mesh file
        input: PathBuf,

        /// Reference texture resolution in texels
        #[arg(short, long, default_value = "2048")]
        resolution: u32,

        /// Weight each edge by its world-space length
        #[arg(long)]
        length_weighted: bool,
    },

    /// Rescale UVs to a target texel density
    Set {
        /// Input mesh file
        input: PathBuf,

        /// Output mesh file
        output: PathBuf,

        /// Target density in texels per world unit
        #[arg(short, long)]
        target: TargetDensity,

        /// Reference texture resolution in texels
        #[arg(short, long, default_value = "2048")]
        resolution: u32,

        /// Maximum relaxation iterations per UV shell
        #[arg(short, long, default_value = "5000")]
        iterations: usize,

        /// Relaxation stop threshold, relative to the shell size
        #[arg(long, default_value = "0.001")]
        stop_threshold: f64,

        /// Only scale shells, without relaxing their edge lengths
        #[arg(long)]
        no_relax: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Set up the stderr log subscriber.
fn init_tracing(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }

    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match verbose {
            0 => "warn",
            1 => "texel_density=info",
            2 => "texel_density=debug",
            _ => "trace",
        };
        EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .with(filter)
        .init();
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Info { input, resolution } => {
            cmd_info(&input, resolution)?;
        }

        Commands::Measure {
            input,
            resolution,
            length_weighted,
        } => {
            cmd_measure(&input, resolution, length_weighted)?;
        }

        Commands::Set {
            input,
            output,
            target,
            resolution,
            iterations,
            stop_threshold,
            no_relax,
        } => {
            let options = RescaleOptions::default()
                .with_max_iterations(iterations)
                .with_stop_threshold(stop_threshold)
                .with_relax(!no_relax);
            cmd_set(&input, &output, target, resolution, options)?;
        }
    }

    Ok(())
}

/// Create a progress reporter that displays a progress bar on the terminal.
fn create_progress() -> Progress {
    // Highest percent shown so far; the bar never moves backwards
    let max_percent = Arc::new(AtomicUsize::new(0));

    Progress::new(move |current, total, message| {
        if total == 0 {
            return;
        }

        let raw_percent = if current >= total {
            100
        } else {
            ((current * 100) + (total / 2)) / total
        };

        let previous = max_percent.fetch_max(raw_percent, Ordering::Relaxed);
        let percent = previous.max(raw_percent);
        if percent == previous && percent != 100 {
            return;
        }

        let bar_width = 30;
        let filled = (percent * bar_width) / 100;
        let bar = "=".repeat(filled);
        let space = " ".repeat(bar_width - filled);

        // Use carriage return to overwrite the line
        eprint!("\r[{}{}] {:3}% {}", bar, space, percent, message);
        let _ = std::io::stderr().flush();

        if current >= total {
            eprintln!();
        }
    })
}

fn cmd_info(input: &Path, resolution: u32) -> Result<(), Box<dyn std::error::Error>> {
    let mesh = io::load(input)?;
    let tool = TexelDensityTool::new(ReferenceResolution::new(resolution)?);

    println!("File: {}", input.display());
    println!("Vertices: {}", mesh.num_vertices());
    println!("UVs: {}", mesh.num_uvs());
    println!("Faces: {}", mesh.num_faces());
    println!("Edges: {}", mesh.num_edges());
    println!("Interior edges: {}", mesh.num_interior_edges());
    println!("UV shells: {}", find_uv_shells(&mesh).count());

    println!("Surface area: {:.6}", mesh.surface_area());
    println!("UV area: {:.6}", mesh.uv_area());

    if let Some((min, max)) = mesh.bounding_box() {
        let diag = max - min;
        println!("Dimensions: {:.3} x {:.3} x {:.3}", diag.x, diag.y, diag.z);
    }
    if let Some((min, max)) = mesh.uvs().bounding_box() {
        println!(
            "UV bounds: ({:.4}, {:.4}) to ({:.4}, {:.4})",
            min.x, min.y, max.x, max.y
        );
    }

    let non_manifold = mesh
        .edge_ids()
        .filter(|&e| mesh.is_non_manifold_edge(e))
        .count();
    if non_manifold > 0 {
        println!("Non-manifold edges: {}", non_manifold);
    }

    match tool.measure(Some(&mesh)) {
        Ok(density) => println!("Texel density: {} (at {})", density, tool.resolution()),
        Err(e) => println!("Texel density: unavailable ({})", e),
    }

    Ok(())
}

fn cmd_measure(
    input: &Path,
    resolution: u32,
    length_weighted: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mesh = io::load(input)?;

    let aggregation = if length_weighted {
        Aggregation::LengthWeighted
    } else {
        Aggregation::EdgeMean
    };
    let tool = TexelDensityTool::new(ReferenceResolution::new(resolution)?)
        .with_measure_options(MeasureOptions::default().with_aggregation(aggregation));

    let report = tool.measure_report(Some(&mesh))?;

    println!("{}", report.density);
    println!(
        "Interior edges: {} ({} seam edges skipped)",
        report.interior_edges, report.skipped_edges
    );
    println!(
        "Edge density range: [{:.2}, {:.2}]",
        report.min_edge_density, report.max_edge_density
    );

    Ok(())
}

fn cmd_set(
    input: &Path,
    output: &Path,
    target: TargetDensity,
    resolution: u32,
    options: RescaleOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut mesh = io::load(input)?;

    println!("Loaded: {} vertices, {} faces", mesh.num_vertices(), mesh.num_faces());

    let tool = TexelDensityTool::new(ReferenceResolution::new(resolution)?)
        .with_rescale_options(options);
    let progress = create_progress();

    let rescale = tool.normalizer().rescale_options();
    println!(
        "Normalizing to {} texels per unit (at {}, {} iterations max, {})...",
        target,
        tool.resolution(),
        rescale.max_iterations,
        if rescale.relax { "relaxed" } else { "scale only" }
    );
    let start = Instant::now();
    let outcome = tool.normalize_to_with_progress(Some(&mut mesh), target, &progress)?;
    let elapsed = start.elapsed();

    match outcome.previous_density {
        Some(previous) => println!("Previous density: {}", previous),
        None => println!("Previous density: unavailable"),
    }
    println!(
        "Rescaled {} UV shells (scale {:.6}, {} iterations{})",
        outcome.rescale.shells,
        outcome.scale_factor,
        outcome.rescale.iterations,
        if outcome.rescale.converged {
            ""
        } else {
            ", not converged"
        }
    );
    println!("Density: {}", outcome.displayed_density);
    match tool.measure(Some(&mesh)) {
        Ok(measured) => println!("Measured: {}", measured),
        Err(e) => println!("Measured: unavailable ({})", e),
    }

    io::save(&mesh, output)?;
    println!("Saved: {} ({:.2?})", output.display(), elapsed);

    Ok(())
}
