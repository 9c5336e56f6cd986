pub mod deep_get;
pub mod document;
pub mod error;
pub mod query_builder;
pub mod search_client;
pub mod similarity;

pub use document::{BillDoc, SectionDoc};
pub use error::QueryError;
pub use query_builder::{build_mlt_query, build_mlt_query_for_text, min_score_for_length};
pub use search_client::SearchClient;
pub use similarity::{
    fold_to_bill_to_bill, get_similar_bill_sections, get_similar_sections, BillSections,
    BillToBillFold, LinkedSection, SectionSimilarity, SimilarSection,
};
