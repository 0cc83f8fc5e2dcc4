use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::ConfigOverrides;
use crate::index::RefreshMode;

#[derive(Parser, Debug)]
#[command(
    name = "asksense",
    version,
    about = "Scam message detection by semantic similarity against a labeled corpus"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build or refresh the corpus embedding cache.
    Embed(EmbedArgs),
    /// Nearest corpus entries for a query.
    Search(SearchArgs),
    /// Per-sentence risk bands.
    Assess(TextArgs),
    /// Keyword hits and annotated text.
    Highlight(HighlightArgs),
    /// Full report: categories, keywords, sentence bands and example stories.
    Analyze(AnalyzeArgs),
    /// Corpus and cache state, without loading the model.
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct EngineArgs {
    #[arg(long, default_value = "data/scam_data_tw.csv")]
    pub corpus: PathBuf,

    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    #[arg(long)]
    pub model_id: Option<String>,

    #[arg(long)]
    pub threshold: Option<f64>,

    #[arg(long)]
    pub batch_size: Option<usize>,

    #[arg(long = "keyword")]
    pub keywords: Vec<String>,
}

impl EngineArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            model_id: self.model_id.clone(),
            risk_threshold: self.threshold,
            keywords: self.keywords.clone(),
            cache_dir: self.cache_dir.clone(),
            batch_size: self.batch_size,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum EmbedRefreshMode {
    Full,
    MissingOrStale,
}

impl From<EmbedRefreshMode> for RefreshMode {
    fn from(value: EmbedRefreshMode) -> Self {
        match value {
            EmbedRefreshMode::Full => RefreshMode::Full,
            EmbedRefreshMode::MissingOrStale => RefreshMode::MissingOrStale,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct EmbedArgs {
    #[command(flatten)]
    pub engine: EngineArgs,

    #[arg(long, value_enum, default_value_t = EmbedRefreshMode::MissingOrStale)]
    pub refresh_mode: EmbedRefreshMode,
}

#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    #[command(flatten)]
    pub engine: EngineArgs,

    /// Query text; read from stdin when omitted.
    #[arg(long)]
    pub query: Option<String>,

    #[arg(long)]
    pub top_k: Option<usize>,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct TextArgs {
    #[command(flatten)]
    pub engine: EngineArgs,

    /// Input text; read from stdin when omitted.
    #[arg(long)]
    pub text: Option<String>,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct HighlightArgs {
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long = "keyword")]
    pub keywords: Vec<String>,

    /// Input text; read from stdin when omitted.
    #[arg(long)]
    pub text: Option<String>,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub input: TextArgs,

    /// CSV of example stories (`content`, `type`) shown for the leading category.
    #[arg(long)]
    pub stories: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[command(flatten)]
    pub engine: EngineArgs,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn search_args_parse_repeated_keywords_and_overrides() {
        let cli = Cli::parse_from([
            "asksense",
            "search",
            "--query",
            "請立即匯款",
            "--keyword",
            "匯款",
            "--keyword",
            "官方",
            "--threshold",
            "0.7",
            "--top-k",
            "5",
        ]);

        let Commands::Search(args) = cli.command else {
            panic!("expected search command");
        };
        assert_eq!(args.query.as_deref(), Some("請立即匯款"));
        assert_eq!(args.top_k, Some(5));
        let overrides = args.engine.overrides();
        assert_eq!(overrides.keywords, vec!["匯款", "官方"]);
        assert_eq!(overrides.risk_threshold, Some(0.7));
        assert_eq!(args.engine.corpus, PathBuf::from("data/scam_data_tw.csv"));
    }

    #[test]
    fn embed_refresh_mode_defaults_to_missing_or_stale() {
        let cli = Cli::parse_from(["asksense", "embed"]);
        let Commands::Embed(args) = cli.command else {
            panic!("expected embed command");
        };
        assert_eq!(RefreshMode::from(args.refresh_mode), RefreshMode::MissingOrStale);
    }
}
