use std::path::Path;

use anyhow::{anyhow, Context, Result};

use super::omm::OmmRecord;

/// Parse three-line element sets (name line + line 1 + line 2).
/// Blank lines are ignored.
pub fn parse_tle(text: &str) -> Result<Vec<sgp4::Elements>> {
    let cleaned: String = text
        .lines()
        .map(str::trim_end)
        .filter(|l| !l.trim().is_empty())
        .fold(String::new(), |mut acc, line| {
            acc.push_str(line);
            acc.push('\n');
            acc
        });

    let elements = sgp4::parse_3les(&cleaned).map_err(|e| anyhow!("Invalid TLE data: {}", e))?;
    if elements.is_empty() {
        anyhow::bail!("No TLE records found");
    }
    Ok(elements)
}

pub fn tle_to_omm(text: &str) -> Result<Vec<OmmRecord>> {
    Ok(parse_tle(text)?.iter().map(OmmRecord::from_elements).collect())
}

/// Convert a TLE file into a pretty-printed OMM JSON array. Returns the
/// number of records written.
pub fn convert_file(input: &Path, output: &Path) -> Result<usize> {
    let text = std::fs::read_to_string(input).with_context(|| format!("Failed to read {:?}", input))?;
    let records = tle_to_omm(&text).with_context(|| format!("Failed to parse {:?}", input))?;

    let json = serde_json::to_string_pretty(&records)?;
    std::fs::write(output, json).with_context(|| format!("Failed to write {:?}", output))?;

    tracing::info!("Converted {} record(s) from {:?} to {:?}", records.len(), input, output);
    Ok(records.len())
}
