use crate::model::{CategoryScore, SearchResult, StoryEntry};

pub const DEFAULT_TOP_CATEGORIES: usize = 3;

/// Groups results by label, keeps the best score per label and returns the
/// `limit` highest. Labels tied on score keep first-seen order.
pub fn top_categories(results: &[SearchResult], limit: usize) -> Vec<CategoryScore> {
    let mut categories = Vec::<CategoryScore>::new();

    for result in results {
        match categories
            .iter_mut()
            .find(|category| category.scam_type == result.scam_type)
        {
            Some(category) => {
                category.hits += 1;
                if result.score > category.best_score {
                    category.best_score = result.score;
                }
            }
            None => categories.push(CategoryScore {
                scam_type: result.scam_type.clone(),
                best_score: result.score,
                hits: 1,
            }),
        }
    }

    categories.sort_by(|left, right| right.best_score.total_cmp(&left.best_score));
    categories.truncate(limit);
    categories
}

/// True when the leading category clears the likely-scam bar.
pub fn is_likely_scam(categories: &[CategoryScore], signal_threshold: f64) -> bool {
    categories
        .first()
        .map(|category| category.best_score > signal_threshold)
        .unwrap_or(false)
}

pub fn story_examples(stories: &[StoryEntry], scam_type: &str, limit: usize) -> Vec<String> {
    stories
        .iter()
        .filter(|story| story.scam_type == scam_type)
        .take(limit)
        .map(|story| story.content.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(rank: usize, scam_type: &str, score: f64) -> SearchResult {
        SearchResult {
            rank,
            content: format!("content-{rank}"),
            scam_type: scam_type.to_string(),
            platform: None,
            score,
        }
    }

    #[test]
    fn top_categories_keep_best_score_per_label() {
        let results = vec![
            result(1, "假冒官方", 0.91),
            result(2, "投資詐騙", 0.80),
            result(3, "假冒官方", 0.78),
            result(4, "購物詐騙", 0.60),
            result(5, "無", 0.40),
        ];

        let categories = top_categories(&results, 3);
        assert_eq!(categories.len(), 3);
        assert_eq!(categories[0].scam_type, "假冒官方");
        assert_eq!(categories[0].best_score, 0.91);
        assert_eq!(categories[0].hits, 2);
        assert_eq!(categories[1].scam_type, "投資詐騙");
        assert_eq!(categories[2].scam_type, "購物詐騙");
    }

    #[test]
    fn top_categories_break_ties_by_first_seen() {
        let results = vec![result(1, "b", 0.5), result(2, "a", 0.5)];
        let categories = top_categories(&results, 3);
        assert_eq!(categories[0].scam_type, "b");
        assert_eq!(categories[1].scam_type, "a");
    }

    #[test]
    fn likely_scam_needs_score_strictly_above_signal() {
        let categories = top_categories(&[result(1, "匯款詐騙", 0.55)], 3);
        assert!(!is_likely_scam(&categories, 0.55));
        assert!(is_likely_scam(&categories, 0.5));
        assert!(!is_likely_scam(&[], 0.0));
    }

    #[test]
    fn story_examples_filter_by_type_in_file_order() {
        let stories = vec![
            StoryEntry {
                content: "one".to_string(),
                scam_type: "投資詐騙".to_string(),
            },
            StoryEntry {
                content: "other".to_string(),
                scam_type: "無".to_string(),
            },
            StoryEntry {
                content: "two".to_string(),
                scam_type: "投資詐騙".to_string(),
            },
        ];

        assert_eq!(story_examples(&stories, "投資詐騙", 1), vec!["one"]);
        assert_eq!(story_examples(&stories, "投資詐騙", 3), vec!["one", "two"]);
        assert!(story_examples(&stories, "假冒官方", 3).is_empty());
    }
}
