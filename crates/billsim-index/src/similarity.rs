use std::collections::HashMap;

use billsim_core::app_config::ScoreMode;
use billsim_parser::Bill;
use serde_json::Value;

use crate::deep_get::{deep_get, Key};
use crate::error::QueryError;
use crate::query_builder::build_mlt_query_for_text;
use crate::search_client::SearchClient;

/// One inner hit: a section in another bill that matched a query section.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarSection {
    pub billnumber_version: String,
    pub score_es: f64,
    pub section_id: String,
    pub label: String,
    pub header: String,
    pub length: usize,
}

/// A query section together with every similar section the search engine
/// returned for it.
#[derive(Debug, Clone)]
pub struct SectionSimilarity {
    pub section_id: String,
    pub label: String,
    pub header: String,
    pub length: usize,
    pub similar_sections: Vec<SimilarSection>,
}

/// The full per-section similarity result for one bill.
#[derive(Debug, Clone)]
pub struct BillSections {
    pub billnumber_version: String,
    pub length: usize,
    pub sections: Vec<SectionSimilarity>,
}

/// One synthetic section row contributing to a bill-to-bill match: the
/// query section's identity plus the single similar section that
/// established this particular contribution.
#[derive(Debug, Clone)]
pub struct LinkedSection {
    pub section_id: String,
    pub label: String,
    pub header: String,
    pub length: usize,
    pub similar_section: SimilarSection,
}

/// The folded bill-to-bill record for one target bill.
#[derive(Debug, Clone)]
pub struct BillToBillFold {
    pub billnumber_version: String,
    pub billnumber_version_to: String,
    pub sections_num: usize,
    pub sections_match: usize,
    pub score_es: f64,
    pub sections: Vec<LinkedSection>,
}

/// Runs a more-like-this query for a single section's text and projects the
/// raw hit tree into [`SimilarSection`] rows. Fields the engine omits from a
/// hit default rather than abort the whole query: a partial hit is still a
/// hit.
///
/// # Errors
///
/// Returns [`QueryError`] if the request fails or the response body is not
/// valid JSON.
pub async fn get_similar_sections(
    client: &SearchClient,
    index: &str,
    query_text: &str,
    score_mode: ScoreMode,
    size: usize,
) -> Result<Vec<SimilarSection>, QueryError> {
    let query = build_mlt_query_for_text(query_text, score_mode, size);
    let response = client.search(index, &query).await?;
    Ok(project_hits(&response))
}

fn project_hits(response: &Value) -> Vec<SimilarSection> {
    let mut out = Vec::new();
    let Some(Value::Array(hits)) = deep_get(response, &[Key::Field("hits"), Key::Field("hits")])
    else {
        return out;
    };

    for hit in &hits {
        let billnumber_version = deep_get(hit, &[Key::Field("_id")])
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        let score_es = deep_get(hit, &[Key::Field("_score")])
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0);

        let inner = deep_get(
            hit,
            &[
                Key::Field("inner_hits"),
                Key::Field("sections"),
                Key::Field("hits"),
                Key::Field("hits"),
            ],
        );
        let Some(Value::Array(inner_hits)) = inner else {
            continue;
        };
        let Some(inner_hit) = inner_hits.first() else {
            continue;
        };

        let source = deep_get(inner_hit, &[Key::Field("_source")]).unwrap_or(Value::Null);
        let section_id = string_field(&source, "section_id");
        let label = string_field(&source, "section_number");
        let header = string_field(&source, "section_header");
        let length = deep_get(&source, &[Key::Field("section_length")])
            .and_then(|v| v.as_u64())
            .unwrap_or(0) as usize;

        out.push(SimilarSection {
            billnumber_version,
            score_es,
            section_id,
            label,
            header,
            length,
        });
    }

    out
}

fn string_field(value: &Value, field: &str) -> String {
    deep_get(value, &[Key::Field(field)])
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}

/// Runs [`get_similar_sections`] for every section of `bill`, in document
/// order. Sections are queried sequentially; a worker fans out across
/// bills, not across a single bill's sections.
///
/// # Errors
///
/// Returns [`QueryError`] if any section query fails.
pub async fn get_similar_bill_sections(
    client: &SearchClient,
    index: &str,
    bill: &Bill,
    score_mode: ScoreMode,
    size: usize,
) -> Result<BillSections, QueryError> {
    let mut sections = Vec::with_capacity(bill.sections.len());
    for section in &bill.sections {
        let similar_sections =
            get_similar_sections(client, index, &section.text, score_mode, size).await?;
        sections.push(SectionSimilarity {
            section_id: section.section_id.clone(),
            label: section.label.clone(),
            header: section.header.clone(),
            length: section.length,
            similar_sections,
        });
    }

    Ok(BillSections {
        billnumber_version: bill.billnumber_version.clone(),
        length: bill.length,
        sections,
    })
}

/// Folds a bill's per-section similarity results into per-target
/// bill-to-bill records. Self-matches and hits with no resolvable target
/// identifier are dropped. `score_es` for a target is the sum of every
/// contributing hit's score, so a section that matches the same target
/// bill through more than one hit counts each hit toward the total; counts
/// in `sections_match` are of distinct *query* sections, not hits.
#[must_use]
pub fn fold_to_bill_to_bill(bill_sections: &BillSections) -> Vec<BillToBillFold> {
    let mut by_target: HashMap<String, Vec<LinkedSection>> = HashMap::new();

    for section in &bill_sections.sections {
        for similar in &section.similar_sections {
            if similar.billnumber_version.is_empty()
                || similar.billnumber_version == bill_sections.billnumber_version
            {
                continue;
            }

            by_target
                .entry(similar.billnumber_version.clone())
                .or_default()
                .push(LinkedSection {
                    section_id: section.section_id.clone(),
                    label: section.label.clone(),
                    header: section.header.clone(),
                    length: section.length,
                    similar_section: similar.clone(),
                });
        }
    }

    let mut folds: Vec<BillToBillFold> = by_target
        .into_iter()
        .map(|(target, sections)| {
            let score_es = sections.iter().map(|s| s.similar_section.score_es).sum();
            let mut distinct_sections: Vec<&str> =
                sections.iter().map(|s| s.section_id.as_str()).collect();
            distinct_sections.sort_unstable();
            distinct_sections.dedup();

            BillToBillFold {
                billnumber_version: bill_sections.billnumber_version.clone(),
                billnumber_version_to: target,
                sections_num: bill_sections.sections.len(),
                sections_match: distinct_sections.len(),
                score_es,
                sections,
            }
        })
        .collect();

    folds.sort_by(|a, b| a.billnumber_version_to.cmp(&b.billnumber_version_to));
    folds
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bill_sections_with(sections: Vec<SectionSimilarity>) -> BillSections {
        BillSections {
            billnumber_version: "117hr200ih".to_string(),
            length: 100,
            sections,
        }
    }

    fn similar(target: &str, score: f64) -> SimilarSection {
        SimilarSection {
            billnumber_version: target.to_string(),
            score_es: score,
            section_id: "other-sec".to_string(),
            label: "1.".to_string(),
            header: "Header".to_string(),
            length: 10,
        }
    }

    #[test]
    fn project_hits_handles_missing_inner_hits_gracefully() {
        let response = json!({"hits": {"hits": [{"_id": "117hr201ih"}]}});
        let result = project_hits(&response);
        assert!(result.is_empty());
    }

    #[test]
    fn project_hits_extracts_nested_section_rows() {
        let response = json!({
            "hits": {
                "hits": [{
                    "_id": "117hr201ih",
                    "_score": 12.5,
                    "inner_hits": {
                        "sections": {
                            "hits": {
                                "hits": [{
                                    "_score": 99.0,
                                    "_source": {
                                        "section_id": "s9",
                                        "section_number": "9.",
                                        "section_header": "Definitions",
                                        "section_length": 500
                                    }
                                }]
                            }
                        }
                    }
                }]
            }
        });

        let result = project_hits(&response);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].billnumber_version, "117hr201ih");
        assert_eq!(
            result[0].score_es, 12.5,
            "score_es must come from the outer hit, not the inner section hit"
        );
        assert_eq!(result[0].section_id, "s9");
        assert_eq!(result[0].length, 500);
    }

    #[test]
    fn project_hits_takes_only_the_first_inner_hit() {
        let response = json!({
            "hits": {
                "hits": [{
                    "_id": "117hr201ih",
                    "_score": 7.0,
                    "inner_hits": {
                        "sections": {
                            "hits": {
                                "hits": [
                                    {
                                        "_score": 1.0,
                                        "_source": {"section_id": "first"}
                                    },
                                    {
                                        "_score": 2.0,
                                        "_source": {"section_id": "second"}
                                    }
                                ]
                            }
                        }
                    }
                }]
            }
        });

        let result = project_hits(&response);
        assert_eq!(result.len(), 1, "one outer hit must yield exactly one SimilarSection");
        assert_eq!(result[0].section_id, "first");
    }

    #[test]
    fn fold_excludes_self_matches_and_empty_targets() {
        let bs = bill_sections_with(vec![SectionSimilarity {
            section_id: "s1".to_string(),
            label: "1.".to_string(),
            header: "H".to_string(),
            length: 10,
            similar_sections: vec![
                similar("117hr200ih", 9.0),
                similar("", 9.0),
                similar("117hr202ih", 5.0),
            ],
        }]);

        let folds = fold_to_bill_to_bill(&bs);
        assert_eq!(folds.len(), 1);
        assert_eq!(folds[0].billnumber_version_to, "117hr202ih");
    }

    #[test]
    fn fold_sums_duplicate_hits_but_counts_distinct_sections_once() {
        let bs = bill_sections_with(vec![
            SectionSimilarity {
                section_id: "s1".to_string(),
                label: "1.".to_string(),
                header: "H".to_string(),
                length: 10,
                similar_sections: vec![similar("117hr202ih", 1.0), similar("117hr202ih", 1.0)],
            },
            SectionSimilarity {
                section_id: "s2".to_string(),
                label: "2.".to_string(),
                header: "H2".to_string(),
                length: 20,
                similar_sections: vec![similar("117hr202ih", 1.0)],
            },
        ]);

        let folds = fold_to_bill_to_bill(&bs);
        assert_eq!(folds.len(), 1);
        let fold = &folds[0];
        assert_eq!(fold.sections_num, 2);
        assert_eq!(fold.sections_match, 2);
        assert_eq!(fold.score_es, 3.0);
        assert_eq!(fold.sections.len(), 3);
    }
}
