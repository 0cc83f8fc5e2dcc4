use std::io::{self, Read, Write};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::cli::EngineArgs;
use crate::config::EngineConfig;
use crate::engine::ScamEngine;
use crate::index::RefreshMode;

pub(super) fn load_config(args: &EngineArgs) -> Result<EngineConfig> {
    EngineConfig::load(args.config.as_deref(), args.overrides())
        .context("failed to resolve engine configuration")
}

pub(super) fn open_engine(args: &EngineArgs, refresh_mode: RefreshMode) -> Result<ScamEngine> {
    let config = load_config(args)?;
    ScamEngine::open(config, &args.corpus, refresh_mode)
        .with_context(|| format!("failed to open engine for {}", args.corpus.display()))
}

/// Uses `text` when given, otherwise all of stdin. Empty input is passed
/// through; the engine handles it.
pub(super) fn read_input(text: Option<String>) -> Result<String> {
    read_input_from(text, io::stdin())
}

fn read_input_from<R: Read>(text: Option<String>, mut reader: R) -> Result<String> {
    if let Some(text) = text {
        return Ok(text);
    }

    let mut buffer = String::new();
    reader
        .read_to_string(&mut buffer)
        .context("failed to read input text from stdin")?;
    Ok(buffer.trim_end_matches(['\r', '\n']).to_string())
}

pub(super) fn write_json<T: Serialize>(value: &T) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());
    serde_json::to_writer_pretty(&mut output, value).context("failed to serialize json output")?;
    writeln!(output)?;
    output.flush()?;
    Ok(())
}

pub(super) fn write_text<F>(render: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> io::Result<()>,
{
    let mut output = io::BufWriter::new(io::stdout().lock());
    render(&mut output)?;
    output.flush()?;
    Ok(())
}
