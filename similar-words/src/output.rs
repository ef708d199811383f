//! Plain-text rendering of corpus previews and matches.

use std::fmt::Write as _;

use wordsim_embeddings::{Record, SimilarityResult};

/// English ordinal for a 1-based rank: 1st, 2nd, 3rd, 4th, 11th, 21st, ...
pub fn ordinal(n: usize) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}

/// Render a ranked match list, one line per match under a header.
pub fn render_matches(results: &[SimilarityResult], show_scores: bool) -> String {
    let mut out = format!("Top {} Matches:\n", results.len());
    for (rank, result) in results.iter().enumerate() {
        let _ = write!(out, "{} Match: {}", ordinal(rank + 1), result.record.text);
        if show_scores {
            let _ = write!(out, " ({:.4})", result.score);
        }
        out.push('\n');
    }
    out
}

/// Render the first rows of the corpus.
pub fn render_preview(preview: &[Record], total: usize) -> String {
    let mut out = format!("Loaded {total} words");
    if !preview.is_empty() {
        let words: Vec<&str> = preview.iter().map(|r| r.text.as_str()).collect();
        let _ = write!(out, ": {}", words.join(", "));
        if preview.len() < total {
            out.push_str(", ...");
        }
    }
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_ordinals() {
        let got: Vec<String> = [1, 2, 3, 4, 11, 12, 13, 21, 22, 23, 101, 111, 112]
            .into_iter()
            .map(ordinal)
            .collect();
        assert_eq!(
            got,
            vec![
                "1st", "2nd", "3rd", "4th", "11th", "12th", "13th", "21st", "22nd", "23rd",
                "101st", "111th", "112th"
            ]
        );
    }

    #[test]
    fn test_render_matches() {
        let results = vec![
            SimilarityResult::new(Record::new(0, "apple"), 0.99),
            SimilarityResult::new(Record::new(2, "orange"), 0.5),
        ];

        assert_eq!(
            render_matches(&results, false),
            "Top 2 Matches:\n1st Match: apple\n2nd Match: orange\n"
        );
        assert_eq!(
            render_matches(&results[..1], true),
            "Top 1 Matches:\n1st Match: apple (0.9900)\n"
        );
    }

    #[test]
    fn test_render_preview() {
        let records = [Record::new(0, "apple"), Record::new(1, "banana")];
        assert_eq!(
            render_preview(&records[..1], 2),
            "Loaded 2 words: apple, ...\n"
        );
        assert_eq!(
            render_preview(&records, 2),
            "Loaded 2 words: apple, banana\n"
        );
        assert_eq!(render_preview(&[], 2), "Loaded 2 words\n");
    }
}
