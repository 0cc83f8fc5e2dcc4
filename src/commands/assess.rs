use std::io::{self, Write};

use anyhow::Result;
use serde::Serialize;
use tracing::info;

use crate::cli::TextArgs;
use crate::index::RefreshMode;
use crate::model::{RiskLevel, SentenceAssessment};

use super::shared::{open_engine, read_input, write_json, write_text};

#[derive(Debug, Serialize)]
struct AssessResponse<'a> {
    risk_threshold: f64,
    sentences: &'a [SentenceAssessment],
}

pub fn run(args: TextArgs) -> Result<()> {
    let text = read_input(args.text)?;
    let engine = open_engine(&args.engine, RefreshMode::MissingOrStale)?;

    let sentences = engine.assess(&text)?;
    info!(
        sentences = sentences.len(),
        high = sentences.iter().filter(|item| item.level == RiskLevel::High).count(),
        "sentence assessment completed"
    );

    if args.json {
        return write_json(&AssessResponse {
            risk_threshold: engine.config().risk_threshold,
            sentences: &sentences,
        });
    }

    write_text(|output| render_assessments(output, &sentences))
}

pub(super) fn render_assessments(
    output: &mut dyn Write,
    sentences: &[SentenceAssessment],
) -> io::Result<()> {
    if sentences.is_empty() {
        writeln!(output, "No sentences to assess.")?;
        return Ok(());
    }

    for item in sentences {
        writeln!(
            output,
            "[{}/{}] {} (score={:.4})",
            item.level.as_str(),
            item.level.color(),
            item.sentence,
            item.score
        )?;
    }

    Ok(())
}
