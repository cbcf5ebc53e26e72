use anyhow::{anyhow, Context, Result};
use evoview_core::trajectory::{parse_evolution, ParseMode, ParsedEvolution};
use evoview_core::{Evolution, StatisticsTable};
use std::fs;
use std::path::{Path, PathBuf};

/// Where the statistics overlay comes from, if there is one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatisticsSource {
    None,
    File(PathBuf),
    Derived,
}

pub fn load_trajectory(path: &Path, mode: ParseMode) -> Result<ParsedEvolution> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed reading trajectory {}", path.display()))?;
    let parsed = parse_evolution(&text, mode)
        .map_err(|err| anyhow!("invalid trajectory {}: {err}", path.display()))?;

    let report = &parsed.report;
    for dropped in &report.dropped {
        tracing::warn!(
            line = dropped.line,
            record = dropped.record,
            "dropped malformed record: {}",
            dropped.reason
        );
    }
    if !report.empty_generations.is_empty() {
        tracing::warn!(
            generations = ?report.empty_generations,
            "trajectory contains generations without valid individuals"
        );
    }
    tracing::info!(
        path = %path.display(),
        generations = parsed.evolution.len(),
        dropped = report.dropped.len(),
        blank_lines = report.skipped_blank_lines,
        "loaded trajectory"
    );
    Ok(parsed)
}

pub fn load_statistics(path: &Path) -> Result<StatisticsTable> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed reading statistics {}", path.display()))?;
    let table = StatisticsTable::from_csv_str(&text)
        .map_err(|err| anyhow!("invalid statistics {}: {err}", path.display()))?;
    tracing::info!(path = %path.display(), rows = table.len(), "loaded statistics");
    Ok(table)
}

pub fn resolve_statistics(
    source: &StatisticsSource,
    evolution: &Evolution,
) -> Result<Option<StatisticsTable>> {
    match source {
        StatisticsSource::None => Ok(None),
        StatisticsSource::File(path) => load_statistics(path).map(Some),
        StatisticsSource::Derived => {
            let table = StatisticsTable::from_evolution(evolution)
                .map_err(|err| anyhow!("cannot derive statistics: {err}"))?;
            tracing::info!(rows = table.len(), "derived statistics from trajectory");
            Ok(Some(table))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_mode_error_names_the_file() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let path = tmp.path().join("run.txt");
        fs::write(&path, "1,2,3;\n1,2;\n")?;

        assert_eq!(load_trajectory(&path, ParseMode::Lenient)?.evolution.len(), 2);
        let err = load_trajectory(&path, ParseMode::Strict).unwrap_err();
        assert!(err.to_string().contains("run.txt"));
        Ok(())
    }

    #[test]
    fn missing_statistics_file_is_an_error() {
        assert!(load_statistics(Path::new("/nonexistent/evoview/stats.csv")).is_err());
    }

    #[test]
    fn derived_statistics_cover_every_generation() -> Result<()> {
        let parsed = parse_evolution("1,1,2;2,2,4;\n0,0,1;\n", ParseMode::Strict)?;
        let table = resolve_statistics(&StatisticsSource::Derived, &parsed.evolution)?
            .ok_or_else(|| anyhow!("expected a table"))?;
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0].average_fitness, 3.0);
        Ok(())
    }
}
