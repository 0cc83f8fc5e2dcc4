use std::io::{self, Write};

use anyhow::{Context, Result};
use tracing::info;

use crate::cli::AnalyzeArgs;
use crate::corpus::load_stories;
use crate::index::RefreshMode;
use crate::model::AnalysisReport;

use super::assess::render_assessments;
use super::highlight::render_highlight;
use super::shared::{open_engine, read_input, write_json, write_text};

pub fn run(args: AnalyzeArgs) -> Result<()> {
    let text = read_input(args.input.text)?;
    let mut engine = open_engine(&args.input.engine, RefreshMode::MissingOrStale)?;

    if let Some(stories_path) = &args.stories {
        let stories = load_stories(stories_path)
            .with_context(|| format!("failed to load stories from {}", stories_path.display()))?;
        info!(path = %stories_path.display(), stories = stories.len(), "loaded story library");
        engine = engine.with_stories(stories);
    }

    let report = engine.analyze(&text)?;
    info!(
        likely_scam = report.likely_scam,
        categories = report.top_categories.len(),
        keyword_hits = report.keywords.hits.len(),
        sentences = report.sentences.len(),
        "analysis completed"
    );

    if args.input.json {
        return write_json(&report);
    }

    write_text(|output| render_report(output, &report))
}

fn render_report(output: &mut dyn Write, report: &AnalysisReport) -> io::Result<()> {
    if report.truncated {
        writeln!(output, "(input truncated to {} characters)", report.query.chars().count())?;
    }

    writeln!(output, "Likely scam types:")?;
    if report.likely_scam {
        let signals = report
            .top_categories
            .iter()
            .filter(|category| category.best_score > report.scam_signal_threshold);
        for category in signals {
            writeln!(
                output,
                " - {} (best similarity: {:.4}, matches: {})",
                category.scam_type, category.best_score, category.hits
            )?;
        }
    } else {
        writeln!(output, " - none; this does not read like a known scam message")?;
    }

    render_highlight(output, &report.keywords)?;

    writeln!(output, "Sentence risk:")?;
    render_assessments(output, &report.sentences)?;

    if let Some(leading) = report
        .top_categories
        .first()
        .filter(|_| !report.story_examples.is_empty())
    {
        writeln!(output, "Example cases for {}:", leading.scam_type)?;
        for story in &report.story_examples {
            writeln!(output, " - {story}")?;
        }
    }

    writeln!(output, "More resources: {}", report.resource_url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CategoryScore, HighlightResult, RiskLevel, SentenceAssessment};

    fn report(likely_scam: bool) -> AnalysisReport {
        AnalysisReport {
            query: "請立即匯款。".to_string(),
            truncated: false,
            likely_scam,
            scam_signal_threshold: 0.55,
            top_categories: vec![
                CategoryScore {
                    scam_type: "匯款詐騙".to_string(),
                    best_score: 0.8,
                    hits: 2,
                },
                CategoryScore {
                    scam_type: "假冒客服".to_string(),
                    best_score: 0.55,
                    hits: 1,
                },
            ],
            matches: Vec::new(),
            keywords: HighlightResult {
                hits: vec!["匯款".to_string()],
                annotated: "請立即[⚠️匯款⚠️]。".to_string(),
            },
            sentences: vec![SentenceAssessment {
                sentence: "請立即匯款。".to_string(),
                score: 0.7,
                level: RiskLevel::Medium,
            }],
            story_examples: if likely_scam {
                vec!["阿姨接到電話後匯款".to_string()]
            } else {
                Vec::new()
            },
            resource_url: "https://165.npa.gov.tw".to_string(),
        }
    }

    fn render(report: &AnalysisReport) -> String {
        let mut buffer = Vec::<u8>::new();
        render_report(&mut buffer, report).expect("render");
        String::from_utf8(buffer).expect("utf8")
    }

    #[test]
    fn likely_scam_report_lists_categories_and_stories() {
        let text = render(&report(true));
        assert!(text.contains(" - 匯款詐騙 (best similarity: 0.8000, matches: 2)\n"));
        assert!(!text.contains("假冒客服"));
        assert!(text.contains("[medium/yellow] 請立即匯款。 (score=0.7000)\n"));
        assert!(text.contains("Example cases for 匯款詐騙:\n - 阿姨接到電話後匯款\n"));
        assert!(text.ends_with("More resources: https://165.npa.gov.tw\n"));
    }

    #[test]
    fn unlikely_report_omits_categories_and_stories() {
        let text = render(&report(false));
        assert!(text.contains("none; this does not read like a known scam message"));
        assert!(!text.contains("Example cases"));
        assert!(text.contains("Keywords: 匯款\n"));
    }
}
