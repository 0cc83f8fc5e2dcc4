use crate::model::HighlightResult;

pub const DEFAULT_KEYWORDS: [&str; 4] = ["匯款", "限時", "官方", "165"];

/// Literal keyword matcher. Matching and annotation both follow keyword
/// list order.
///
/// Annotation rewrites the text one keyword at a time, so a later keyword
/// that occurs inside an earlier keyword's bracketed form is annotated again
/// (`["匯款", "款"]` yields `[⚠️匯[⚠️款⚠️]⚠️]`).
#[derive(Debug, Clone)]
pub struct KeywordHighlighter {
    keywords: Vec<String>,
}

impl KeywordHighlighter {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: normalize_keywords(keywords),
        }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn hits(&self, text: &str) -> Vec<String> {
        self.keywords
            .iter()
            .filter(|keyword| text.contains(keyword.as_str()))
            .cloned()
            .collect()
    }

    pub fn highlight(&self, text: &str) -> HighlightResult {
        let hits = self.hits(text);
        let mut annotated = text.to_string();
        for keyword in &hits {
            annotated = annotated.replace(keyword.as_str(), &mark(keyword));
        }

        HighlightResult { hits, annotated }
    }
}

impl Default for KeywordHighlighter {
    fn default() -> Self {
        Self::new(DEFAULT_KEYWORDS)
    }
}

pub fn mark(keyword: &str) -> String {
    format!("[⚠️{keyword}⚠️]")
}

/// Drops empty entries and repeats, keeping the first position of each.
/// Keywords are literal, so surrounding whitespace is kept.
pub fn normalize_keywords<I, S>(keywords: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = Vec::<String>::new();
    for keyword in keywords {
        let keyword = keyword.as_ref();
        if keyword.is_empty() || out.iter().any(|existing| existing == keyword) {
            continue;
        }
        out.push(keyword.to_string());
    }
    out
}
