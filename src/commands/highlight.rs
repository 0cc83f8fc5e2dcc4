use std::io::{self, Write};

use anyhow::{Context, Result};
use tracing::info;

use crate::cli::HighlightArgs;
use crate::config::{ConfigOverrides, EngineConfig};
use crate::keywords::KeywordHighlighter;
use crate::model::HighlightResult;

use super::shared::{read_input, write_json, write_text};

pub fn run(args: HighlightArgs) -> Result<()> {
    let text = read_input(args.text)?;
    let config = EngineConfig::load(
        args.config.as_deref(),
        ConfigOverrides {
            keywords: args.keywords,
            ..ConfigOverrides::default()
        },
    )
    .context("failed to resolve keyword configuration")?;

    let result = KeywordHighlighter::new(&config.keywords).highlight(&text);
    info!(hits = result.hits.len(), "keyword highlight completed");

    if args.json {
        return write_json(&result);
    }

    write_text(|output| render_highlight(output, &result))
}

pub(super) fn render_highlight(output: &mut dyn Write, result: &HighlightResult) -> io::Result<()> {
    if result.hits.is_empty() {
        writeln!(output, "Keywords: none")?;
        return Ok(());
    }

    writeln!(output, "Keywords: {}", result.hits.join(", "))?;
    writeln!(output, "Highlighted: {}", result.annotated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_highlight_shows_hits_and_annotation() {
        let result = KeywordHighlighter::default().highlight("官方限時通知");
        let mut buffer = Vec::<u8>::new();
        render_highlight(&mut buffer, &result).expect("render");

        assert_eq!(
            String::from_utf8(buffer).expect("utf8"),
            "Keywords: 限時, 官方\nHighlighted: [⚠️官方⚠️][⚠️限時⚠️]通知\n"
        );
    }
}
