//! Command implementations for the HiCVis CLI

pub mod inspect;
pub mod render;
pub mod url;

use anyhow::{Context, Result};
use hicvis_core::{ChromosomeCatalog, InteractionIndex};
use std::path::Path;

use crate::error::CliError;

fn require_file(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(CliError::file_not_found(path.to_path_buf()).into());
    }
    Ok(())
}

pub fn read_payload(path: &Path) -> Result<Vec<u8>> {
    require_file(path)?;
    std::fs::read(path).with_context(|| format!("Failed to read payload {}", path.display()))
}

/// Chromosome catalog from the server's details JSON.
pub fn load_catalog(path: &Path) -> Result<ChromosomeCatalog> {
    require_file(path)?;
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read chromosome catalog {}", path.display()))?;
    let catalog = ChromosomeCatalog::from_json(&json)
        .with_context(|| format!("Failed to parse chromosome catalog {}", path.display()))?;
    log::info!("Loaded {} chromosomes", catalog.len());
    Ok(catalog)
}

/// Interactions from an optional JSON feed and an optional interact track.
pub fn load_interactions(json: Option<&Path>, interact: Option<&Path>) -> Result<InteractionIndex> {
    let mut index = InteractionIndex::new();
    if let Some(path) = json {
        require_file(path)?;
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read interactions {}", path.display()))?;
        index.merge(
            InteractionIndex::from_json(&text)
                .with_context(|| format!("Failed to parse interactions {}", path.display()))?,
        );
    }
    if let Some(path) = interact {
        require_file(path)?;
        index.merge(
            InteractionIndex::from_interact_file(path)
                .with_context(|| format!("Failed to parse interact track {}", path.display()))?,
        );
    }
    if !index.is_empty() {
        log::info!("Loaded {} interactions", index.len());
    }
    Ok(index)
}
