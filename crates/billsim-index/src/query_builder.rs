use billsim_core::app_config::ScoreMode;
use serde_json::{json, Value};

const MIN_TERM_FREQ: u32 = 2;
const MAX_QUERY_TERMS: u32 = 30;
const MIN_DOC_FREQ: u32 = 2;

/// The length-adaptive `min_score` floor for a query section of `length`
/// characters.
#[must_use]
pub fn min_score_for_length(length: usize) -> u32 {
    if length < 500 {
        20
    } else if length < 1000 {
        40
    } else if length < 1500 {
        50
    } else {
        60
    }
}

fn score_mode_str(mode: ScoreMode) -> &'static str {
    match mode {
        ScoreMode::Avg => "avg",
        ScoreMode::Max => "max",
        ScoreMode::Sum => "sum",
    }
}

/// Builds a fresh nested more-like-this query for `query_text`. Every call
/// returns an independent `Value` with no shared substructure.
#[must_use]
pub fn build_mlt_query(
    query_text: &str,
    score_mode: ScoreMode,
    min_score: u32,
    size: usize,
) -> Value {
    json!({
        "size": size,
        "min_score": min_score,
        "query": {
            "nested": {
                "path": "sections",
                "score_mode": score_mode_str(score_mode),
                "query": {
                    "more_like_this": {
                        "fields": ["sections.section_text"],
                        "like": query_text,
                        "min_term_freq": MIN_TERM_FREQ,
                        "max_query_terms": MAX_QUERY_TERMS,
                        "min_doc_freq": MIN_DOC_FREQ
                    }
                },
                "inner_hits": {
                    "_source": ["section_id", "section_number", "section_header", "section_length"],
                    "highlight": {
                        "fields": {
                            "sections.section_text": {}
                        }
                    }
                }
            }
        }
    })
}

/// Builds the canonical MLT query using the length-adaptive `min_score`
/// floor for `query_text`.
#[must_use]
pub fn build_mlt_query_for_text(query_text: &str, score_mode: ScoreMode, size: usize) -> Value {
    let min_score = min_score_for_length(query_text.chars().count());
    build_mlt_query(query_text, score_mode, min_score, size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_score_step_function_matches_boundaries() {
        assert_eq!(min_score_for_length(499), 20);
        assert_eq!(min_score_for_length(999), 40);
        assert_eq!(min_score_for_length(1499), 50);
        assert_eq!(min_score_for_length(1500), 60);
    }

    #[test]
    fn builder_is_pure_and_produces_independent_values() {
        let a = build_mlt_query("some text", ScoreMode::Max, 20, 100);
        let b = build_mlt_query("some text", ScoreMode::Max, 20, 100);
        assert_eq!(a, b);

        let mut a_mut = a.clone();
        a_mut["size"] = json!(1);
        assert_eq!(b["size"], json!(100));
    }

    #[test]
    fn fixed_mlt_parameters_are_present() {
        let query = build_mlt_query("text", ScoreMode::Avg, 20, 10);
        let mlt = &query["query"]["nested"]["query"]["more_like_this"];
        assert_eq!(mlt["min_term_freq"], json!(2));
        assert_eq!(mlt["max_query_terms"], json!(30));
        assert_eq!(mlt["min_doc_freq"], json!(2));
        assert_eq!(query["query"]["nested"]["score_mode"], json!("avg"));
    }
}
