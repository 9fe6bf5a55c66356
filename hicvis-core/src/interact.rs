//! Interaction annotations: the JSON feed and UCSC `interact` files,
//! indexed by chromosome pair

use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::str::FromStr;

use crate::error::{HicvisError, HicvisResult};
use crate::types::{with_chr_prefix, Chromosome, GenomicPos, Interaction};

const INTERACT_COLUMNS: usize = 18;

/// Pair key in `chrA-chrB` form.
pub fn pair_key(source: &str, target: &str) -> String {
    format!("{}-{}", with_chr_prefix(source), with_chr_prefix(target))
}

/// One row of a UCSC `interact` file.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractRecord {
    pub chrom: String,
    pub chrom_start: GenomicPos,
    pub chrom_end: GenomicPos,
    pub name: String,
    pub score: u64,
    pub value: f64,
    pub exp: String,
    pub colour: String,
    pub source_chrom: String,
    pub source_start: GenomicPos,
    pub source_end: GenomicPos,
    pub source_name: String,
    pub source_strand: String,
    pub target_chrom: String,
    pub target_start: GenomicPos,
    pub target_end: GenomicPos,
    pub target_name: String,
    pub target_strand: String,
}

impl InteractRecord {
    pub fn interaction(&self) -> Interaction {
        Interaction {
            source_chrom: self.source_chrom.clone(),
            source_start: self.source_start,
            source_end: self.source_end,
            target_chrom: self.target_chrom.clone(),
            target_start: self.target_start,
            target_end: self.target_end,
        }
    }
}

impl FromStr for InteractRecord {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = line.trim_end_matches(['\r', '\n']).split('\t').collect();
        if fields.len() < INTERACT_COLUMNS {
            return Err(format!(
                "interact line has {} fields, expected {}",
                fields.len(),
                INTERACT_COLUMNS
            ));
        }

        let pos = |i: usize, what: &str| -> Result<GenomicPos, String> {
            fields[i]
                .trim()
                .parse()
                .map_err(|_| format!("Invalid {}: {}", what, fields[i]))
        };

        Ok(InteractRecord {
            chrom: fields[0].to_string(),
            chrom_start: pos(1, "chromStart")?,
            chrom_end: pos(2, "chromEnd")?,
            name: fields[3].to_string(),
            score: pos(4, "score")?,
            value: fields[5]
                .trim()
                .parse()
                .map_err(|_| format!("Invalid value: {}", fields[5]))?,
            exp: fields[6].to_string(),
            colour: fields[7].to_string(),
            source_chrom: fields[8].to_string(),
            source_start: pos(9, "sourceStart")?,
            source_end: pos(10, "sourceEnd")?,
            source_name: fields[11].to_string(),
            source_strand: fields[12].to_string(),
            target_chrom: fields[13].to_string(),
            target_start: pos(14, "targetStart")?,
            target_end: pos(15, "targetEnd")?,
            target_name: fields[16].to_string(),
            target_strand: fields[17].to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct InteractionFeed {
    #[serde(rename = "Interactions", default)]
    interactions: HashMap<String, Vec<Interaction>>,
}

/// Interactions grouped by chromosome pair.
#[derive(Debug, Clone, Default)]
pub struct InteractionIndex {
    by_pair: HashMap<String, Vec<Interaction>>,
}

impl InteractionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the server feed: `{"Interactions": {"chrA-chrB": [...]}}`.
    pub fn from_json(json: &str) -> HicvisResult<Self> {
        let feed: InteractionFeed = serde_json::from_str(json)?;
        let mut index = Self::new();
        for (_, interactions) in feed.interactions {
            for interaction in interactions {
                index.insert(interaction);
            }
        }
        Ok(index)
    }

    /// Parse an `interact` file. The first line is a header.
    pub fn from_interact_reader<R: Read>(reader: R, source_name: &str) -> HicvisResult<Self> {
        let mut index = Self::new();
        for (i, line) in BufReader::new(reader).lines().enumerate().skip(1) {
            let line = line?;
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            let record: InteractRecord = line
                .parse()
                .map_err(|message: String| HicvisError::parse(source_name, i + 1, message))?;
            index.insert(record.interaction());
        }
        log::info!("Loaded {} interactions from {}", index.len(), source_name);
        Ok(index)
    }

    pub fn from_interact_file<P: AsRef<Path>>(path: P) -> HicvisResult<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        Self::from_interact_reader(file, &path.display().to_string())
    }

    pub fn insert(&mut self, interaction: Interaction) {
        let key = pair_key(&interaction.source_chrom, &interaction.target_chrom);
        self.by_pair.entry(key).or_default().push(interaction);
    }

    pub fn merge(&mut self, other: InteractionIndex) {
        for (key, mut interactions) in other.by_pair {
            self.by_pair.entry(key).or_default().append(&mut interactions);
        }
    }

    pub fn len(&self) -> usize {
        self.by_pair.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_pair.is_empty()
    }

    /// Interactions between two chromosomes, recorded in either order.
    pub fn for_pair(&self, source: &Chromosome, target: &Chromosome) -> Vec<Interaction> {
        let forward = pair_key(&source.name, &target.name);
        let reverse = pair_key(&target.name, &source.name);

        let mut found: Vec<Interaction> = self.by_pair.get(&forward).cloned().unwrap_or_default();
        if reverse != forward {
            if let Some(more) = self.by_pair.get(&reverse) {
                found.extend(more.iter().cloned());
            }
        }
        found
    }
}
