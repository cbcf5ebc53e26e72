use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand, ValueEnum};
use evoview::config::RenderSettings;
use evoview::landscape::{benchmark_landscape, write_landscape_csv, Benchmark};
use evoview::loader::{load_trajectory, resolve_statistics, StatisticsSource};
use evoview::report::{inspect, summarize_frames};
use evoview::runner::{render_comparison, LandscapeSource, RenderRequest};
use evoview::util::{parse_bounds, parse_frame_range, write_output};
use evoview_core::{LineUpdate, ParseMode};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "evoview")]
#[command(about = "Animate a recorded evolutionary run over its benchmark landscape")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render the comparison animation to a GIF
    Render {
        /// Trajectory file: one generation per line, `x,y,fitness;` per individual
        #[arg(long)]
        trajectory: PathBuf,
        /// Statistics CSV (average_fitness,best_fitness,selection_pressure)
        #[arg(long, conflicts_with = "derive_statistics")]
        statistics: Option<PathBuf>,
        /// Recompute statistics from the trajectory instead of reading a CSV
        #[arg(long)]
        derive_statistics: bool,
        #[arg(long, value_enum, default_value_t = CliBenchmark::Rastrigin)]
        benchmark: CliBenchmark,
        /// Precomputed Z grid to use instead of evaluating the benchmark
        #[arg(long)]
        landscape_csv: Option<PathBuf>,
        /// Landscape domain as `lo,hi` on both axes
        #[arg(long)]
        bounds: Option<String>,
        #[arg(long)]
        x_limits: Option<String>,
        #[arg(long)]
        y_limits: Option<String>,
        #[arg(long)]
        title: Option<String>,
        /// Appended to the population overlay
        #[arg(long)]
        extra_text: Option<String>,
        #[arg(long, default_value = "evolution.gif")]
        output: PathBuf,
        /// Sub-range of generations, e.g. `10..50`
        #[arg(long)]
        frames: Option<String>,
        #[arg(long, value_enum, default_value_t = CliLineUpdate::Replace)]
        line_update: CliLineUpdate,
        /// Fail on malformed records instead of dropping them
        #[arg(long)]
        strict: bool,
        #[arg(long)]
        width: Option<u32>,
        #[arg(long)]
        height: Option<u32>,
        #[arg(long)]
        interval_ms: Option<u64>,
        #[arg(long)]
        grid_resolution: Option<usize>,
    },
    /// Summarize a trajectory and its statistics
    Inspect {
        #[arg(long)]
        trajectory: PathBuf,
        #[arg(long)]
        statistics: Option<PathBuf>,
        #[arg(long)]
        strict: bool,
        #[arg(long)]
        json: bool,
    },
    /// Derive every frame and write per-frame summaries as JSON
    Frames {
        #[arg(long)]
        trajectory: PathBuf,
        #[arg(long, conflicts_with = "derive_statistics")]
        statistics: Option<PathBuf>,
        #[arg(long)]
        derive_statistics: bool,
        #[arg(long)]
        frames: Option<String>,
        #[arg(long)]
        jobs: Option<usize>,
        #[arg(long)]
        strict: bool,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Write a benchmark landscape as a CSV Z grid
    Landscape {
        #[arg(long, value_enum, default_value_t = CliBenchmark::Rastrigin)]
        benchmark: CliBenchmark,
        #[arg(long)]
        bounds: Option<String>,
        #[arg(long)]
        resolution: Option<usize>,
        #[arg(long)]
        output: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliBenchmark {
    Rastrigin,
    Sphere,
    Ackley,
    Rosenbrock,
}

impl From<CliBenchmark> for Benchmark {
    fn from(value: CliBenchmark) -> Self {
        match value {
            CliBenchmark::Rastrigin => Benchmark::Rastrigin,
            CliBenchmark::Sphere => Benchmark::Sphere,
            CliBenchmark::Ackley => Benchmark::Ackley,
            CliBenchmark::Rosenbrock => Benchmark::Rosenbrock,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliLineUpdate {
    Replace,
    InPlace,
}

impl From<CliLineUpdate> for LineUpdate {
    fn from(value: CliLineUpdate) -> Self {
        match value {
            CliLineUpdate::Replace => LineUpdate::Replace,
            CliLineUpdate::InPlace => LineUpdate::InPlace,
        }
    }
}

fn parse_mode(strict: bool) -> ParseMode {
    if strict {
        ParseMode::Strict
    } else {
        ParseMode::Lenient
    }
}

fn statistics_source(statistics: Option<PathBuf>, derive: bool) -> StatisticsSource {
    match (statistics, derive) {
        (Some(path), _) => StatisticsSource::File(path),
        (None, true) => StatisticsSource::Derived,
        (None, false) => StatisticsSource::None,
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env())
        .init();

    match Cli::parse().command {
        Commands::Render {
            trajectory,
            statistics,
            derive_statistics,
            benchmark,
            landscape_csv,
            bounds,
            x_limits,
            y_limits,
            title,
            extra_text,
            output,
            frames,
            line_update,
            strict,
            width,
            height,
            interval_ms,
            grid_resolution,
        } => {
            let mut settings = RenderSettings::from_env();
            if let Some(width) = width {
                settings.width = width;
            }
            if let Some(height) = height {
                settings.height = height;
            }
            if let Some(interval_ms) = interval_ms {
                settings.frame_interval_ms = interval_ms;
            }
            if let Some(grid_resolution) = grid_resolution {
                settings.grid_resolution = grid_resolution;
            }

            let bounds = bounds.as_deref().map(parse_bounds).transpose()?;
            let landscape = match landscape_csv {
                Some(path) => LandscapeSource::Csv {
                    path,
                    bounds: bounds
                        .ok_or_else(|| anyhow!("--landscape-csv requires --bounds lo,hi"))?,
                },
                None => LandscapeSource::Benchmark {
                    benchmark: benchmark.into(),
                    bounds,
                },
            };

            let outcome = render_comparison(&RenderRequest {
                trajectory,
                statistics: statistics_source(statistics, derive_statistics),
                landscape,
                output,
                title,
                extra_text,
                x_limits: x_limits.as_deref().map(parse_bounds).transpose()?,
                y_limits: y_limits.as_deref().map(parse_bounds).transpose()?,
                frames,
                parse_mode: parse_mode(strict),
                line_update: line_update.into(),
                settings: settings.sanitized(),
            })?;

            println!("output={}", outcome.output.display());
            println!("generations={}", outcome.generations);
            println!("frames={}..{}", outcome.frames.start, outcome.frames.end);
            println!("frames_presented={}", outcome.frames_presented);
            println!("dropped_records={}", outcome.dropped_records);
            if let Some(rows) = outcome.statistics_rows {
                println!("statistics_rows={rows}");
            }
        }
        Commands::Inspect {
            trajectory,
            statistics,
            strict,
            json,
        } => {
            let parsed = load_trajectory(&trajectory, parse_mode(strict))?;
            let table = resolve_statistics(
                &statistics_source(statistics, false),
                &parsed.evolution,
            )?;
            let summary = inspect(&parsed, table.as_ref());
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
                return Ok(());
            }

            println!("trajectory={}", trajectory.display());
            println!("generations={}", summary.generations);
            println!(
                "population={}..={}",
                summary.min_population, summary.max_population
            );
            println!("dropped_records={}", summary.dropped_records);
            println!("blank_lines={}", summary.blank_lines);
            if !summary.empty_generations.is_empty() {
                println!("empty_generations={:?}", summary.empty_generations);
            }
            if let Some(best) = summary.final_best {
                println!(
                    "final_best={},{},{}",
                    best.x(),
                    best.y(),
                    best.fitness()
                );
            }
            if let Some(rows) = summary.statistics_rows {
                println!("statistics_rows={rows}");
            }
        }
        Commands::Frames {
            trajectory,
            statistics,
            derive_statistics,
            frames,
            jobs,
            strict,
            output,
        } => {
            let parsed = load_trajectory(&trajectory, parse_mode(strict))?;
            let evolution = parsed.evolution;
            let table = resolve_statistics(
                &statistics_source(statistics, derive_statistics),
                &evolution,
            )?;
            let range = match frames.as_deref() {
                Some(range) => parse_frame_range(range, evolution.len())?,
                None => 0..evolution.len(),
            };
            let summaries = summarize_frames(&evolution, table.as_ref(), range, jobs)?;
            let encoded = serde_json::to_vec_pretty(&summaries)?;
            if let Some(path) = output {
                write_output(&path, &encoded)?;
                println!("wrote={}", path.display());
                println!("frames={}", summaries.len());
            } else {
                println!("{}", String::from_utf8_lossy(&encoded));
            }
        }
        Commands::Landscape {
            benchmark,
            bounds,
            resolution,
            output,
        } => {
            let benchmark: Benchmark = benchmark.into();
            let bounds = match bounds.as_deref() {
                Some(text) => parse_bounds(text)?,
                None => benchmark.default_bounds(),
            };
            let settings = RenderSettings::from_env();
            let resolution = resolution.unwrap_or(settings.grid_resolution);
            if resolution < 2 {
                return Err(anyhow!("resolution must be at least 2"));
            }
            let landscape = benchmark_landscape(benchmark, bounds, resolution)?;
            write_landscape_csv(&output, &landscape)?;
            println!("benchmark={benchmark}");
            println!("bounds={},{}", bounds.0, bounds.1);
            println!("resolution={resolution}");
            println!("output={}", output.display());
        }
    }

    Ok(())
}
