use crate::ring::Source;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static RING_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.-]{1,64}$").expect("ring name pattern is valid"));

static SIZE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*([0-9]+)\s*(b|k|kb|kib|m|mb|mib|g|gb|gib)?\s*$")
        .expect("size pattern is valid")
});

pub fn is_valid_ring_name(name: &str) -> bool {
    RING_NAME.is_match(name)
}

/// Parses a byte size such as `512`, `4K`, `3MiB` or `1g`.
/// Suffixes are binary multiples.
pub fn parse_size(value: &str) -> Result<usize, String> {
    let caps = SIZE
        .captures(value)
        .ok_or_else(|| format!("`{value}` is not a size (expected e.g. 512, 4K, 3M)"))?;
    let amount = caps[1]
        .parse::<usize>()
        .map_err(|_| format!("`{value}` is too large"))?;
    let shift = match caps
        .get(2)
        .and_then(|unit| unit.as_str().chars().next())
        .map(|c| c.to_ascii_lowercase())
    {
        Some('k') => 10,
        Some('m') => 20,
        Some('g') => 30,
        _ => 0,
    };
    amount
        .checked_mul(1usize << shift)
        .ok_or_else(|| format!("`{value}` is too large"))
}

pub fn parse_chunk_size(value: &str) -> Result<usize, String> {
    match parse_size(value)? {
        0 => Err("chunk size must be greater than zero".to_string()),
        n => Ok(n),
    }
}

/// Parses `NAME=PATH` or a bare `PATH`. A path of `-` means stdin.
pub fn parse_source(value: &str) -> Result<Source, String> {
    let (name, path) = match value.split_once('=') {
        Some((name, path)) => (name.to_string(), path),
        None if value == "-" => ("stdin".to_string(), value),
        None => (
            Path::new(value)
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default(),
            value,
        ),
    };
    if !is_valid_ring_name(&name) {
        return Err(format!(
            "`{name}` is not a valid ring name, use NAME=PATH with NAME from [A-Za-z0-9_.-]"
        ));
    }
    if path.is_empty() {
        return Err(format!("source `{value}` has no path"));
    }
    let path = (path != "-").then(|| PathBuf::from(path));
    Ok(Source { name, path })
}

/// Rejects source lists where more than one ring would read stdin, since
/// concurrent readers would split the stream between rings.
pub fn check_sources(sources: &[Source]) -> Result<(), String> {
    let stdin: Vec<&str> = sources
        .iter()
        .filter(|source| source.path.is_none())
        .map(|source| source.name.as_str())
        .collect();
    if stdin.len() > 1 {
        return Err(format!(
            "only one source may read stdin, got {}",
            stdin.join(", ")
        ));
    }
    Ok(())
}
