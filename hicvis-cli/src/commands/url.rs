//! URL command: read or build the query string that restores a view.

use anyhow::Result;
use clap::Args;
use hicvis_core::{Locus, UrlState};

use crate::error::CliError;

#[derive(Args, Debug)]
pub struct UrlArgs {
    /// Query string to decode
    #[arg(conflicts_with_all = ["x", "y"])]
    pub query: Option<String>,

    /// X-axis locus to encode
    #[arg(long)]
    pub x: Option<Locus>,

    /// Y-axis locus to encode; defaults to the X locus
    #[arg(long)]
    pub y: Option<Locus>,

    #[arg(long)]
    pub triangle: bool,
}

pub fn execute(args: UrlArgs) -> Result<()> {
    match &args.query {
        Some(query) => {
            let url = UrlState::from_query(query)
                .ok_or_else(|| CliError::invalid_view(format!("cannot parse view query '{}'", query)))?;
            println!("{}", describe(&url));
        }
        None => println!("?{}", build(&args)?.to_query()),
    }
    Ok(())
}

fn describe(url: &UrlState) -> String {
    format!(
        "X: {}\nY: {}\nTriangle view: {}\nCanonical: ?{}",
        url.source_locus(),
        url.target_locus(),
        url.triangle_view,
        url.to_query()
    )
}

fn build(args: &UrlArgs) -> Result<UrlState> {
    let x = args
        .x
        .clone()
        .ok_or_else(|| CliError::invalid_view("either a query or --x is required"))?;
    let y = match (&args.y, args.triangle) {
        (Some(y), false) => y.clone(),
        _ => x.clone(),
    };
    Ok(UrlState {
        src_chrom: x.chr,
        src_start: x.start,
        src_end: x.end,
        tar_chrom: y.chr,
        tar_start: y.start,
        tar_end: y.end,
        triangle_view: args.triangle,
    })
}
