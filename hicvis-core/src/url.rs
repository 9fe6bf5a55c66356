//! View state carried in the page URL so a reload restores the view

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::request::encode_query;
use crate::types::Locus;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrlState {
    pub src_chrom: String,
    pub src_start: i64,
    pub src_end: i64,
    pub tar_chrom: String,
    pub tar_start: i64,
    pub tar_end: i64,
    pub triangle_view: bool,
}

impl UrlState {
    pub fn source_locus(&self) -> Locus {
        Locus::new(self.src_chrom.clone(), self.src_start, self.src_end)
    }

    pub fn target_locus(&self) -> Locus {
        Locus::new(self.tar_chrom.clone(), self.tar_start, self.tar_end)
    }

    pub fn to_query(&self) -> String {
        encode_query(&[
            ("srcChrom", self.src_chrom.clone()),
            ("srcStart", self.src_start.to_string()),
            ("srcEnd", self.src_end.to_string()),
            ("tarChrom", self.tar_chrom.clone()),
            ("tarStart", self.tar_start.to_string()),
            ("tarEnd", self.tar_end.to_string()),
            ("triangleView", self.triangle_view.to_string()),
        ])
    }

    /// Parse a query string (leading `?` optional). All six locus fields
    /// must be present; `triangleView` defaults to false.
    pub fn from_query(query: &str) -> Option<Self> {
        let params: HashMap<String, String> = query
            .trim_start_matches('?')
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .filter_map(|(k, v)| {
                let v = urlencoding::decode(v).ok()?;
                Some((k.to_string(), v.into_owned()))
            })
            .collect();

        let text = |key: &str| params.get(key).filter(|v| !v.is_empty()).cloned();
        let number = |key: &str| params.get(key).and_then(|v| v.trim().parse::<i64>().ok());

        Some(Self {
            src_chrom: text("srcChrom")?,
            src_start: number("srcStart")?,
            src_end: number("srcEnd")?,
            tar_chrom: text("tarChrom")?,
            tar_start: number("tarStart")?,
            tar_end: number("tarEnd")?,
            triangle_view: params.get("triangleView").map(|v| v == "true").unwrap_or(false),
        })
    }
}
