use anyhow::{anyhow, Context, Result};
use std::fs;
use std::ops::Range;
use std::path::Path;

/// Parses `a..b`, `a..=b`, `a..` or a single frame `a`. Open ends are
/// clamped to `frame_count`.
pub fn parse_frame_range(text: &str, frame_count: usize) -> Result<Range<usize>> {
    let s = text.trim();
    if s.is_empty() {
        return Err(anyhow!("empty frame range"));
    }

    let range = if let Some((start, end)) = s.split_once("..") {
        let start = parse_index(start, 0)?;
        let end = if let Some(inclusive) = end.strip_prefix('=') {
            past(parse_index(inclusive, 0)?, s)?
        } else {
            parse_index(end, frame_count)?
        };
        start..end
    } else {
        let frame = parse_index(s, 0)?;
        frame..past(frame, s)?
    };

    if range.start >= range.end {
        return Err(anyhow!("frame range {s} is empty"));
    }
    if range.end > frame_count {
        return Err(anyhow!(
            "frame range {s} exceeds the {frame_count} recorded generations"
        ));
    }
    Ok(range)
}

fn past(index: usize, range: &str) -> Result<usize> {
    index
        .checked_add(1)
        .ok_or_else(|| anyhow!("frame range {range} is out of bounds"))
}

fn parse_index(text: &str, default: usize) -> Result<usize> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(default);
    }
    text.parse::<usize>()
        .with_context(|| format!("invalid frame index: {text}"))
}

/// Parses `lo,hi` axis limits.
pub fn parse_bounds(text: &str) -> Result<(f64, f64)> {
    let (lo, hi) = text
        .split_once(',')
        .ok_or_else(|| anyhow!("bounds must look like lo,hi: {text}"))?;
    let lo = lo
        .trim()
        .parse::<f64>()
        .with_context(|| format!("invalid lower bound: {lo}"))?;
    let hi = hi
        .trim()
        .parse::<f64>()
        .with_context(|| format!("invalid upper bound: {hi}"))?;
    if !(lo < hi) {
        return Err(anyhow!("lower bound {lo} must be below upper bound {hi}"));
    }
    Ok((lo, hi))
}

pub fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed creating directory {}", parent.display()))?;
    }
    fs::write(path, bytes).with_context(|| format!("failed writing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_range_forms() {
        assert_eq!(parse_frame_range("2..5", 10).unwrap(), 2..5);
        assert_eq!(parse_frame_range("2..=5", 10).unwrap(), 2..6);
        assert_eq!(parse_frame_range("7..", 10).unwrap(), 7..10);
        assert_eq!(parse_frame_range("..3", 10).unwrap(), 0..3);
        assert_eq!(parse_frame_range("4", 10).unwrap(), 4..5);
    }

    #[test]
    fn frame_range_rejects_out_of_bounds_and_empty() {
        assert!(parse_frame_range("5..12", 10).is_err());
        assert!(parse_frame_range("5..5", 10).is_err());
        assert!(parse_frame_range("10", 10).is_err());
        assert!(parse_frame_range("a..3", 10).is_err());
    }

    #[test]
    fn frame_range_at_usize_max_is_an_error() {
        let max = usize::MAX.to_string();
        assert!(parse_frame_range(&format!("..={max}"), 10).is_err());
        assert!(parse_frame_range(&max, 10).is_err());
    }

    #[test]
    fn bounds_parse_and_validate() {
        assert_eq!(parse_bounds("-5.12, 5.12").unwrap(), (-5.12, 5.12));
        assert!(parse_bounds("3,1").is_err());
        assert!(parse_bounds("3").is_err());
    }
}
