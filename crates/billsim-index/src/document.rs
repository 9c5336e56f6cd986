use serde::{Deserialize, Serialize};

use billsim_parser::Bill;

/// A single nested per-section subdocument, as indexed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SectionDoc {
    pub section_id: String,
    pub section_number: String,
    pub section_header: String,
    pub section_text: String,
    pub section_length: usize,
}

/// The per-bill document pushed to the external search engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BillDoc {
    pub id: String,
    pub billnumber: String,
    pub billversion: String,
    pub congress: String,
    pub session: String,
    pub date: Option<String>,
    pub dctitle: String,
    pub legisnum: String,
    pub length: usize,
    pub sections_num: usize,
    pub headers: Vec<String>,
    pub sections: Vec<SectionDoc>,
}

impl BillDoc {
    /// Builds a `BillDoc` from a parsed [`Bill`], deduplicating headers while
    /// preserving the order in which they first appear.
    #[must_use]
    pub fn from_bill(bill: &Bill, billnumber: &str, billversion: &str) -> Self {
        let mut seen_headers = std::collections::HashSet::new();
        let mut headers = Vec::new();
        for section in &bill.sections {
            if !section.header.is_empty() && seen_headers.insert(section.header.clone()) {
                headers.push(section.header.clone());
            }
        }

        let sections = bill
            .sections
            .iter()
            .map(|section| SectionDoc {
                section_id: section.section_id.clone(),
                section_number: section.label.clone(),
                section_header: section.header.clone(),
                section_text: section.text.clone(),
                section_length: section.length,
            })
            .collect();

        Self {
            id: bill.billnumber_version.clone(),
            billnumber: billnumber.to_string(),
            billversion: billversion.to_string(),
            congress: bill.congress.clone(),
            session: bill.session.clone(),
            date: bill.date.clone(),
            dctitle: bill.title.clone(),
            legisnum: bill.legisnum.clone(),
            length: bill.length,
            sections_num: bill.sections.len(),
            headers,
            sections,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use billsim_parser::{SchemaFamily, Section};

    fn sample_bill() -> Bill {
        Bill {
            billnumber_version: "117hr200ih".to_string(),
            schema: SchemaFamily::Legacy,
            congress: "117".to_string(),
            session: "1st".to_string(),
            legisnum: "H.R. 200".to_string(),
            title: "An Act".to_string(),
            date: None,
            length: 42,
            sections: vec![
                Section {
                    section_id: "s1".to_string(),
                    label: "1.".to_string(),
                    header: "Short title".to_string(),
                    text: "This Act may be cited...".to_string(),
                    length: 25,
                },
                Section {
                    section_id: "s2".to_string(),
                    label: "2.".to_string(),
                    header: "Short title".to_string(),
                    text: "Duplicate header section.".to_string(),
                    length: 26,
                },
            ],
        }
    }

    #[test]
    fn headers_are_deduplicated_in_order() {
        let bill = sample_bill();
        let doc = BillDoc::from_bill(&bill, "117hr200", "ih");
        assert_eq!(doc.headers, vec!["Short title".to_string()]);
        assert_eq!(doc.sections.len(), 2);
        assert_eq!(doc.sections_num, 2);
    }
}
