use std::io::{self, Write};

use anyhow::Result;
use serde::Serialize;
use tracing::info;

use crate::cli::SearchArgs;
use crate::index::RefreshMode;
use crate::model::SearchResult;

use super::shared::{open_engine, read_input, write_json, write_text};

#[derive(Debug, Serialize)]
struct SearchResponse<'a> {
    query: &'a str,
    top_k: usize,
    returned: usize,
    results: &'a [SearchResult],
}

pub fn run(args: SearchArgs) -> Result<()> {
    let query = read_input(args.query)?;
    let engine = open_engine(&args.engine, RefreshMode::MissingOrStale)?;
    let top_k = args.top_k.unwrap_or(engine.config().search_top_k);

    let results = engine.search(&query, top_k)?;
    info!(top_k, returned = results.len(), "search completed");

    if args.json {
        return write_json(&SearchResponse {
            query: &query,
            top_k,
            returned: results.len(),
            results: &results,
        });
    }

    write_text(|output| render_search(output, &query, &results))
}

pub(super) fn render_search(
    output: &mut dyn Write,
    query: &str,
    results: &[SearchResult],
) -> io::Result<()> {
    writeln!(output, "Query: {query}")?;
    writeln!(output, "Results: {}", results.len())?;

    for result in results {
        let label = if result.scam_type.is_empty() {
            "(unlabeled)"
        } else {
            &result.scam_type
        };
        writeln!(output, "{}.\t{}\tscore={:.4}", result.rank, label, result.score)?;
        if let Some(platform) = result.platform.as_deref().filter(|value| !value.is_empty()) {
            writeln!(output, "\tplatform: {platform}")?;
        }
        writeln!(output, "\tcontent: {}", result.content)?;
    }

    Ok(())
}
