//! Chromosome catalog served by the dataset details endpoint

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{HicvisError, HicvisResult};
use crate::types::Chromosome;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Details {
    #[serde(rename = "Genome", default)]
    genome: Option<String>,
    #[serde(rename = "Chromosomes")]
    chromosomes: Vec<Chromosome>,
}

/// Chromosomes of the loaded dataset, in server order.
#[derive(Debug, Clone, Default)]
pub struct ChromosomeCatalog {
    genome: Option<String>,
    chromosomes: Vec<Chromosome>,
    by_name: HashMap<String, usize>,
}

impl ChromosomeCatalog {
    pub fn new(chromosomes: Vec<Chromosome>) -> Self {
        let by_name = chromosomes
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name.clone(), i))
            .collect();
        Self {
            genome: None,
            chromosomes,
            by_name,
        }
    }

    /// Parse `{"Genome": "...", "Chromosomes": [{"Name", "Length"}]}`.
    pub fn from_json(json: &str) -> HicvisResult<Self> {
        let details: Details = serde_json::from_str(json)?;
        if details.chromosomes.is_empty() {
            return Err(HicvisError::config("dataset details list no chromosomes"));
        }
        let mut catalog = Self::new(details.chromosomes);
        catalog.genome = details.genome;
        Ok(catalog)
    }

    pub fn genome(&self) -> Option<&str> {
        self.genome.as_deref()
    }

    pub fn len(&self) -> usize {
        self.chromosomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chromosomes.is_empty()
    }

    pub fn first(&self) -> Option<&Chromosome> {
        self.chromosomes.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Chromosome> {
        self.chromosomes.iter()
    }

    /// Exact-name lookup.
    pub fn get(&self, name: &str) -> HicvisResult<&Chromosome> {
        self.by_name
            .get(name)
            .map(|&i| &self.chromosomes[i])
            .ok_or_else(|| HicvisError::UnknownChromosome(name.to_string()))
    }
}
