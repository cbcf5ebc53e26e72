use anyhow::{anyhow, Context, Result};
use evoview_core::Landscape;
use std::f64::consts::{E, PI};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::util::write_output;

/// Two-dimensional minimization benchmarks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Benchmark {
    Rastrigin,
    Sphere,
    Ackley,
    Rosenbrock,
}

impl Benchmark {
    pub const ALL: [Benchmark; 4] = [
        Benchmark::Rastrigin,
        Benchmark::Sphere,
        Benchmark::Ackley,
        Benchmark::Rosenbrock,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rastrigin => "rastrigin",
            Self::Sphere => "sphere",
            Self::Ackley => "ackley",
            Self::Rosenbrock => "rosenbrock",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Rastrigin => "Rastrigin Function",
            Self::Sphere => "Sphere Function",
            Self::Ackley => "Ackley Function",
            Self::Rosenbrock => "Rosenbrock Function",
        }
    }

    pub fn default_bounds(self) -> (f64, f64) {
        match self {
            Self::Rastrigin | Self::Sphere => (-5.12, 5.12),
            Self::Ackley => (-5.0, 5.0),
            Self::Rosenbrock => (-2.0, 2.0),
        }
    }

    pub fn evaluate(self, x: f64, y: f64) -> f64 {
        match self {
            Self::Rastrigin => {
                let a = 10.0;
                2.0 * a + (x * x - a * (2.0 * PI * x).cos()) + (y * y - a * (2.0 * PI * y).cos())
            }
            Self::Sphere => x * x + y * y,
            Self::Ackley => {
                -20.0 * (-0.2 * (0.5 * (x * x + y * y)).sqrt()).exp()
                    - (0.5 * ((2.0 * PI * x).cos() + (2.0 * PI * y).cos())).exp()
                    + E
                    + 20.0
            }
            Self::Rosenbrock => 100.0 * (y - x * x).powi(2) + (1.0 - x).powi(2),
        }
    }
}

impl FromStr for Benchmark {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Benchmark::ALL
            .into_iter()
            .find(|benchmark| benchmark.as_str() == value)
            .ok_or_else(|| {
                anyhow!("unknown benchmark: {value} (expected rastrigin|sphere|ackley|rosenbrock)")
            })
    }
}

impl std::fmt::Display for Benchmark {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn linspace(lo: f64, hi: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![lo],
        _ => {
            let step = (hi - lo) / (count - 1) as f64;
            (0..count)
                .map(|i| if i == count - 1 { hi } else { lo + step * i as f64 })
                .collect()
        }
    }
}

/// `X[r][c] = xs[c]`, `Y[r][c] = ys[r]`.
pub fn meshgrid(xs: &[f64], ys: &[f64]) -> (Vec<Vec<f64>>, Vec<Vec<f64>>) {
    let x_grid = ys.iter().map(|_| xs.to_vec()).collect();
    let y_grid = ys.iter().map(|y| vec![*y; xs.len()]).collect();
    (x_grid, y_grid)
}

pub fn benchmark_landscape(
    benchmark: Benchmark,
    bounds: (f64, f64),
    resolution: usize,
) -> Result<Landscape> {
    let axis = linspace(bounds.0, bounds.1, resolution);
    let (xs, ys) = meshgrid(&axis, &axis);
    let zs = xs
        .iter()
        .zip(&ys)
        .map(|(x_row, y_row)| {
            x_row
                .iter()
                .zip(y_row)
                .map(|(x, y)| benchmark.evaluate(*x, *y))
                .collect()
        })
        .collect();
    Landscape::new(xs, ys, zs).map_err(|err| anyhow!("{benchmark} landscape: {err}"))
}

/// Reads a Z matrix (one comma-separated row per line) sampled evenly over
/// `bounds` on both axes.
pub fn load_landscape_csv(path: &Path, bounds: (f64, f64)) -> Result<Landscape> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed reading landscape {}", path.display()))?;
    let zs = parse_grid(&data).with_context(|| format!("invalid landscape {}", path.display()))?;
    let rows = zs.len();
    let cols = zs.first().map_or(0, Vec::len);
    let (xs, ys) = meshgrid(
        &linspace(bounds.0, bounds.1, cols),
        &linspace(bounds.0, bounds.1, rows),
    );
    Landscape::new(xs, ys, zs).map_err(|err| anyhow!("landscape {}: {err}", path.display()))
}

fn parse_grid(data: &str) -> Result<Vec<Vec<f64>>> {
    let mut grid = Vec::new();
    for (index, line) in data.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let row = trimmed
            .split(',')
            .map(|cell| {
                cell.trim()
                    .parse::<f64>()
                    .with_context(|| format!("line {}: invalid value {cell:?}", index + 1))
            })
            .collect::<Result<Vec<f64>>>()?;
        grid.push(row);
    }
    if grid.is_empty() {
        return Err(anyhow!("no rows"));
    }
    Ok(grid)
}

pub fn write_landscape_csv(path: &Path, landscape: &Landscape) -> Result<()> {
    let mut out = String::new();
    for row in landscape.zs() {
        let cells: Vec<String> = row.iter().map(|value| format!("{value}")).collect();
        writeln!(out, "{}", cells.join(",")).context("failed formatting landscape")?;
    }
    write_output(path, out.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn benchmarks_have_known_minima() {
        assert!(Benchmark::Rastrigin.evaluate(0.0, 0.0).abs() < 1e-12);
        assert!(Benchmark::Sphere.evaluate(0.0, 0.0).abs() < 1e-12);
        assert!(Benchmark::Ackley.evaluate(0.0, 0.0).abs() < 1e-12);
        assert!(Benchmark::Rosenbrock.evaluate(1.0, 1.0).abs() < 1e-12);
        assert!((Benchmark::Rastrigin.evaluate(1.0, 1.0) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn parses_benchmark_names() {
        assert_eq!("ackley".parse::<Benchmark>().unwrap(), Benchmark::Ackley);
        assert!("griewank".parse::<Benchmark>().is_err());
    }

    #[test]
    fn linspace_hits_both_ends() {
        let axis = linspace(-5.12, 5.12, 5);
        assert_eq!(axis.len(), 5);
        assert_eq!(axis[0], -5.12);
        assert_eq!(axis[4], 5.12);
        assert!(axis[2].abs() < 1e-12);
    }

    #[test]
    fn meshgrid_layout_matches_row_major_convention() {
        let (xs, ys) = meshgrid(&[1.0, 2.0, 3.0], &[10.0, 20.0]);
        assert_eq!(xs, vec![vec![1.0, 2.0, 3.0], vec![1.0, 2.0, 3.0]]);
        assert_eq!(ys, vec![vec![10.0; 3], vec![20.0; 3]]);
    }

    #[test]
    fn benchmark_landscape_is_square() {
        let landscape = benchmark_landscape(Benchmark::Sphere, (-1.0, 1.0), 11).unwrap();
        assert_eq!(landscape.shape(), (11, 11));
        let (lo, hi) = landscape.z_range();
        assert!(lo.abs() < 1e-12);
        assert!((hi - 2.0).abs() < 1e-12);
    }

    #[test]
    fn landscape_csv_roundtrips_through_disk() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let path = tmp.path().join("sphere.csv");
        let original = benchmark_landscape(Benchmark::Sphere, (-1.0, 1.0), 6)?;
        write_landscape_csv(&path, &original)?;
        let loaded = load_landscape_csv(&path, (-1.0, 1.0))?;
        assert_eq!(loaded, original);
        Ok(())
    }

    #[test]
    fn ragged_csv_is_rejected() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let path = tmp.path().join("ragged.csv");
        fs::write(&path, "1,2,3\n4,5\n")?;
        assert!(load_landscape_csv(&path, (0.0, 1.0)).is_err());
        Ok(())
    }
}
