use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use placement_core::{
    Container, EngineConfig, GridPlacementRequest, PlacementEngine, PlacementOutcome,
    PlacementResponse, ScoreRequest,
};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "placement")]
#[command(about = "Grid Placement Engine - place containers on a fixed grid", long_about = None)]
struct Cli {
    /// Log engine decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Place a new container, reorganizing the grid if needed
    Place {
        /// Input file (YAML or JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file for result (JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Engine configuration file (YAML or JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Abort reorganization after this many candidate layouts
        #[arg(long)]
        max_candidates: Option<usize>,

        /// Abort reorganization after this many milliseconds
        #[arg(long)]
        time_limit_ms: Option<u64>,
    },

    /// Score an existing layout
    Score {
        /// Layout file (YAML or JSON) with gridSize and containers
        #[arg(short, long)]
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "placement_core=debug".into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }

    match cli.command {
        Commands::Place {
            input,
            output,
            config,
            max_candidates,
            time_limit_ms,
        } => {
            let mut engine_config = match config {
                Some(path) => load(&path)?,
                None => EngineConfig::default(),
            };
            if let Some(max) = max_candidates {
                engine_config.budget.max_candidates = Some(max);
            }
            if let Some(ms) = time_limit_ms {
                engine_config.budget.time_limit_ms = ms;
            }
            place_command(input, output, engine_config)?;
        }
        Commands::Score { input } => {
            score_command(input)?;
        }
    }

    Ok(())
}

/// Reads YAML or JSON depending on the file extension.
fn load<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value = match path.extension().and_then(|s| s.to_str()) {
        Some("yaml") | Some("yml") => serde_yaml::from_str(&content)?,
        _ => serde_json::from_str(&content)?,
    };
    Ok(value)
}

fn place_command(input: PathBuf, output: Option<PathBuf>, config: EngineConfig) -> Result<()> {
    println!("{}", "🔍 Loading input...".bright_blue());

    let job: GridPlacementRequest = load(&input)?;

    println!(
        "  {}x{} grid",
        job.grid_size.to_string().bright_white().bold(),
        job.grid_size.to_string().bright_white().bold()
    );
    println!(
        "  {} existing containers",
        job.request
            .existing_containers
            .len()
            .to_string()
            .bright_white()
            .bold()
    );
    println!(
        "  New container: {}",
        job.request
            .new_container_requirements
            .content_type
            .bright_white()
    );
    println!();

    println!("{}", "🚀 Running placement...".bright_blue());

    let engine = PlacementEngine::with_config(job.grid_size, config)?;
    let outcome = engine.place(&job.request)?;

    println!();
    match &outcome {
        PlacementOutcome::Placed { placement, .. } => {
            println!("{}", "✅ Placed without moving anything".bright_green().bold());
            println!(
                "  {} at row {}, col {} ({}x{})",
                placement.id.bright_white(),
                placement.start_row,
                placement.start_col,
                placement.width,
                placement.height
            );
        }
        PlacementOutcome::Reorganized { score, details, .. } => {
            println!("{}", "✅ Grid reorganized".bright_green().bold());
            println!(
                "  Layouts explored: {}",
                details.total_layouts.to_string().bright_white()
            );
            println!("  Score: {:.2}", score);
            println!("  Wasted cells: {}", details.wasted_cells);
        }
        PlacementOutcome::NoValidReorganization => {
            println!("{}", "❌ No valid reorganization found".bright_red().bold());
        }
        PlacementOutcome::BudgetExhausted {
            reason,
            layouts_explored,
        } => {
            println!(
                "{} {}",
                "⏱  Search budget exhausted:".bright_red().bold(),
                reason
            );
            println!("  Layouts explored: {}", layouts_explored);
        }
    }

    if let Some(layout) = outcome.new_layout() {
        println!();
        println!("{}", "📐 Layout:".bright_yellow().bold());
        print!("{}", render_grid(job.grid_size, layout));
    }
    println!();

    let response = PlacementResponse::from(outcome);
    let json = serde_json::to_string_pretty(&response)?;
    if let Some(output_path) = output {
        std::fs::write(&output_path, json)?;
        println!(
            "💾 Saved result to {}",
            output_path.display().to_string().bright_white()
        );
    } else {
        println!("{}", json);
    }

    Ok(())
}

fn score_command(input: PathBuf) -> Result<()> {
    let layout: ScoreRequest = load(&input)?;
    let engine = PlacementEngine::new(layout.grid_size)?;
    let score = engine.score(&layout.containers)?;

    println!("{}", "📊 Score:".bright_yellow().bold());
    println!("  Total: {}", format!("{:.2}", score.total).bright_white().bold());
    println!("  Wasted cells: {}", score.wasted_cells);
    println!("  Fragmentation penalty: {:.2}", score.fragmentation_penalty);
    println!("  Aspect ratio penalty: {:.2}", score.aspect_ratio_penalty);
    println!();
    print!("{}", render_grid(layout.grid_size, &layout.containers));

    Ok(())
}

/// Draws the grid as text, one letter per container in layout order and `.` for free cells.
fn render_grid(grid_size: usize, containers: &[Container]) -> String {
    let mut cells = vec![vec!['.'; grid_size]; grid_size];
    let mut legend = String::new();

    for (idx, container) in containers.iter().enumerate() {
        let mark = char::from(b'A' + (idx % 26) as u8);
        for row in container.start_row..=container.end_row.min(grid_size.saturating_sub(1)) {
            for col in container.start_col..=container.end_col.min(grid_size.saturating_sub(1)) {
                cells[row][col] = mark;
            }
        }
        legend.push_str(&format!(
            "  {} {} ({}, {}x{})\n",
            mark, container.id, container.content_type, container.width, container.height
        ));
    }

    let mut out = String::new();
    for row in cells {
        out.push_str("  ");
        out.extend(row);
        out.push('\n');
    }
    out.push_str(&legend);
    out
}
