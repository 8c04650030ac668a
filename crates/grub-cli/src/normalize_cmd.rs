//! `grub normalize`: run the response normalizer over a saved completion.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, anyhow};

use grub_core::normalize::normalize;

/// Read raw completion text from `file`, or stdin when `None` or `-`.
pub fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read completion from stdin")?;
            Ok(buf)
        }
    }
}

/// Normalize `raw` and render the plans as pretty JSON. Errors start with
/// the normalizer's error kind.
pub fn render(raw: &str) -> Result<String> {
    let plans = normalize(raw).map_err(|e| anyhow!("{}: {e}", e.kind()))?;
    serde_json::to_string_pretty(&plans).context("failed to render plans")
}

pub fn run_normalize(file: Option<&Path>) -> Result<()> {
    let raw = read_input(file)?;
    println!("{}", render(&raw)?);
    Ok(())
}
