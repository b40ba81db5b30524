use std::path::Path;

use anyhow::{Context, Result};

use super::omm::parse_omm_json;
use super::tle::parse_tle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogFormat {
    Omm,
    Tle,
}

impl CatalogFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(Self::Omm),
            "tle" | "txt" | "3le" => Some(Self::Tle),
            _ => None,
        }
    }
}

/// Load every element set in `path`, in file order
pub fn load_elements(path: &Path) -> Result<Vec<sgp4::Elements>> {
    let format = CatalogFormat::from_path(path)
        .with_context(|| format!("Unknown catalog format for {:?} (expected .json or .tle)", path))?;
    let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read catalog {:?}", path))?;

    let elements = parse_elements(&text, format).with_context(|| format!("Failed to parse catalog {:?}", path))?;
    tracing::debug!("Loaded {} element set(s) from {:?}", elements.len(), path);
    Ok(elements)
}

pub fn parse_elements(text: &str, format: CatalogFormat) -> Result<Vec<sgp4::Elements>> {
    match format {
        CatalogFormat::Tle => parse_tle(text),
        CatalogFormat::Omm => {
            let mut elements = Vec::new();
            for record in parse_omm_json(text)? {
                match record.to_elements() {
                    Ok(e) => elements.push(e),
                    Err(e) => tracing::warn!("Skipping OMM record {}: {:#}", record.object_name, e),
                }
            }
            if elements.is_empty() {
                anyhow::bail!("No usable OMM records");
            }
            Ok(elements)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::omm::tests::ISS_OMM;
    use crate::catalog::tle::tests::ISS_TLE;
    use tempfile::TempDir;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(CatalogFormat::from_path(Path::new("gps.JSON")), Some(CatalogFormat::Omm));
        assert_eq!(CatalogFormat::from_path(Path::new("gal.tle")), Some(CatalogFormat::Tle));
        assert_eq!(CatalogFormat::from_path(Path::new("glo.txt")), Some(CatalogFormat::Tle));
        assert_eq!(CatalogFormat::from_path(Path::new("noext")), None);
    }

    #[test]
    fn test_load_both_formats() {
        let dir = TempDir::new().unwrap();
        let json = dir.path().join("iss.json");
        let tle = dir.path().join("iss.tle");
        std::fs::write(&json, ISS_OMM).unwrap();
        std::fs::write(&tle, ISS_TLE).unwrap();

        assert_eq!(load_elements(&json).unwrap()[0].norad_id, 25544);
        assert_eq!(load_elements(&tle).unwrap()[0].norad_id, 25544);
    }

    #[test]
    fn test_bad_record_skipped() {
        let bad = ISS_OMM.replace("2024-05-23T08:20:49.756704", "whenever");
        let json = format!("[{}, {}]", bad, ISS_OMM.replace("ISS (ZARYA)", "GOOD"));
        let elements = parse_elements(&json, CatalogFormat::Omm).unwrap();
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].object_name.as_deref(), Some("GOOD"));

        assert!(parse_elements(&format!("[{}]", bad), CatalogFormat::Omm).is_err());
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(load_elements(&dir.path().join("absent.json")).is_err());
        assert!(load_elements(&dir.path().join("catalog.csv")).is_err());
    }
}
