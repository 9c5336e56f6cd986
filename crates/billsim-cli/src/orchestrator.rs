use std::sync::Arc;

use billsim_comparator::ComparatorBridge;
use billsim_core::AppConfig;
use billsim_db::{BillToBillUpsert, SectionToSectionUpsert};
use billsim_index::{fold_to_bill_to_bill, get_similar_bill_sections, BillDoc, SearchClient};
use billsim_parser::{parse_bill_file, BillPath, PathResolver};
use futures::stream::{self, StreamExt};
use rand::seq::SliceRandom;
use sqlx::PgPool;
use tracing::{info, warn};

use crate::error::CliError;

/// Drives an end-to-end comparison run: allocates an epoch, enumerates
/// bills, fans each one out across a bounded worker pool, and sweeps stale
/// rows at the end.
pub struct Orchestrator {
    pool: PgPool,
    search: Arc<SearchClient>,
    comparator: Arc<ComparatorBridge>,
    resolver: PathResolver,
    worker_count: usize,
    score_mode: billsim_core::app_config::ScoreMode,
    max_bills_section: usize,
    search_index_name: String,
}

/// Aggregate outcome of one `compare` run, reported to the operator.
#[derive(Debug, Default, Clone, Copy)]
pub struct CompareSummary {
    pub bills_considered: usize,
    pub bills_processed: usize,
    pub bills_skipped: usize,
    pub rows_swept: u64,
}

impl Orchestrator {
    /// # Errors
    ///
    /// Returns [`CliError::Query`] if the search client cannot be built.
    pub fn new(config: &AppConfig, pool: PgPool) -> Result<Self, CliError> {
        let search = SearchClient::new(&config.search_index_url)?;
        let comparator = ComparatorBridge::new(
            config.comparator_path.clone(),
            config.comparator_timeout_secs,
        );
        let resolver = PathResolver::new(config.data_root.clone(), config.path_layout);

        Ok(Self {
            pool,
            search: Arc::new(search),
            comparator: Arc::new(comparator),
            resolver,
            worker_count: config.worker_count.max(1),
            score_mode: config.score_mode,
            max_bills_section: config.max_bills_section,
            search_index_name: config.search_index_name.clone(),
        })
    }

    /// Runs a full comparison batch. `max` caps the number of bills
    /// processed by sampling uniformly at random; `max <= 0` processes
    /// every discoverable bill.
    ///
    /// # Errors
    ///
    /// Returns [`CliError`] only for infrastructure failures (DB
    /// connection, epoch allocation); per-bill failures are logged and
    /// counted in the returned [`CompareSummary`] instead.
    pub async fn compare(&self, max: i64) -> Result<CompareSummary, CliError> {
        let epoch = billsim_db::create_epoch(&self.pool, &run_label()).await?;

        let mut paths = self.resolver.enumerate();
        let bills_considered = paths.len();
        if max > 0 && (max as usize) < paths.len() {
            let mut rng = rand::rng();
            paths.partial_shuffle(&mut rng, max as usize);
            paths.truncate(max as usize);
        }

        info!(count = paths.len(), considered = bills_considered, epoch, "starting compare run");

        let results = stream::iter(paths.into_iter().map(|bill_path| {
            let orchestrator = self;
            async move { orchestrator.process_bill(bill_path, epoch).await }
        }))
        .buffer_unordered(self.worker_count)
        .collect::<Vec<_>>()
        .await;

        let bills_processed = results.iter().filter(|r| **r).count();
        let bills_skipped = results.len() - bills_processed;

        let rows_swept = billsim_db::sweep(&self.pool, epoch).await?;
        info!(bills_processed, bills_skipped, rows_swept, "compare run complete");

        Ok(CompareSummary {
            bills_considered,
            bills_processed,
            bills_skipped,
            rows_swept,
        })
    }

    /// Indexes every discoverable bill. `reindex` forces re-upsert of
    /// documents that already exist in the search index.
    ///
    /// # Errors
    ///
    /// Returns [`CliError`] for infrastructure failures; per-bill failures
    /// are logged and skipped.
    pub async fn index_all(&self, reindex: bool) -> Result<CompareSummary, CliError> {
        let paths = self.resolver.enumerate();
        let bills_considered = paths.len();

        let results = stream::iter(paths.into_iter().map(|bill_path| {
            let orchestrator = self;
            async move { orchestrator.index_bill(bill_path, reindex).await }
        }))
        .buffer_unordered(self.worker_count)
        .collect::<Vec<_>>()
        .await;

        let bills_processed = results.iter().filter(|r| **r).count();
        let bills_skipped = results.len() - bills_processed;

        Ok(CompareSummary {
            bills_considered,
            bills_processed,
            bills_skipped,
            rows_swept: 0,
        })
    }

    async fn index_bill(&self, bill_path: BillPath, reindex: bool) -> bool {
        if bill_path.billnumber_version.is_empty() {
            warn!(file = %bill_path.file_path.display(), "skipping file with unparseable identifier");
            return false;
        }

        if !reindex {
            match self
                .search
                .document_exists(&self.search_index_name, &bill_path.billnumber_version)
                .await
            {
                Ok(true) => return true,
                Ok(false) => {}
                Err(error) => {
                    warn!(bill = %bill_path.billnumber_version, %error, "index existence check failed");
                    return false;
                }
            }
        }

        let bill = match parse_bill_file(&bill_path.file_path, &bill_path.billnumber_version) {
            Ok(bill) => bill,
            Err(error) => {
                warn!(bill = %bill_path.billnumber_version, %error, "parse failed, skipping");
                return false;
            }
        };

        let Some(parts) = billsim_core::parse_billnumber_version(&bill_path.billnumber_version)
        else {
            warn!(bill = %bill_path.billnumber_version, "identifier failed canonical regex, skipping");
            return false;
        };

        let doc = BillDoc::from_bill(&bill, &parts.billnumber, &parts.version);
        let doc_json = match serde_json::to_value(&doc) {
            Ok(value) => value,
            Err(error) => {
                warn!(bill = %bill_path.billnumber_version, %error, "document serialization failed");
                return false;
            }
        };

        if let Err(error) = self
            .search
            .upsert_document(&self.search_index_name, &bill.billnumber_version, &doc_json)
            .await
        {
            warn!(bill = %bill_path.billnumber_version, %error, "index upsert failed");
            return false;
        }

        if let Err(error) =
            billsim_db::upsert_bill(&self.pool, &parts.billnumber, &parts.version, Some(bill.length as i32), Some(bill.sections.len() as i32)).await
        {
            warn!(bill = %bill_path.billnumber_version, %error, "bill row upsert failed");
            return false;
        }

        let bill_id = match billsim_db::get_bill_id(&self.pool, &parts.billnumber, &parts.version).await {
            Ok(Some(id)) => id,
            Ok(None) | Err(_) => return false,
        };

        for section in &bill.sections {
            if let Err(error) = billsim_db::upsert_section(
                &self.pool,
                bill_id,
                &bill.billnumber_version,
                &section.section_id,
                &section.label,
                &section.header,
                section.length,
            )
            .await
            {
                warn!(bill = %bill_path.billnumber_version, %error, "section upsert failed");
            }
        }

        true
    }

    async fn process_bill(&self, bill_path: BillPath, epoch: i64) -> bool {
        if bill_path.billnumber_version.is_empty() {
            warn!(file = %bill_path.file_path.display(), "skipping file with unparseable identifier");
            return false;
        }

        let bill = match parse_bill_file(&bill_path.file_path, &bill_path.billnumber_version) {
            Ok(bill) => bill,
            Err(error) => {
                warn!(bill = %bill_path.billnumber_version, %error, "parse failed, skipping");
                return false;
            }
        };

        let bill_sections = match get_similar_bill_sections(
            &self.search,
            &self.search_index_name,
            &bill,
            self.score_mode,
            self.max_bills_section,
        )
        .await
        {
            Ok(sections) => sections,
            Err(error) => {
                warn!(bill = %bill_path.billnumber_version, %error, "similarity query failed, skipping");
                return false;
            }
        };

        let folds = fold_to_bill_to_bill(&bill_sections);
        if folds.is_empty() {
            return true;
        }

        for fold in &folds {
            if let Err(error) = self.persist_fold(fold, epoch).await {
                warn!(bill = %bill_path.billnumber_version, target = %fold.billnumber_version_to, %error, "persisting bill-to-bill fold failed");
            }
        }

        let similar_bills: Vec<String> = folds.iter().map(|f| f.billnumber_version_to.clone()).collect();
        self.run_comparator(&bill_path.billnumber_version, &similar_bills, epoch).await;

        true
    }

    async fn persist_fold(
        &self,
        fold: &billsim_index::BillToBillFold,
        epoch: i64,
    ) -> Result<(), CliError> {
        billsim_db::upsert_bill_to_bill(
            &self.pool,
            BillToBillUpsert {
                billnumber_version: fold.billnumber_version.clone(),
                billnumber_version_to: fold.billnumber_version_to.clone(),
                score_es: Some(fold.score_es),
                score: None,
                score_to: None,
                sections_num: Some(fold.sections_num as i32),
                sections_match: Some(fold.sections_match as i32),
                reasons: Vec::new(),
                identified_by: Some("similarity-engine".to_string()),
                currency_id: epoch,
            },
        )
        .await?;

        for linked in &fold.sections {
            billsim_db::upsert_section_to_section(
                &self.pool,
                SectionToSectionUpsert {
                    billnumber_version: fold.billnumber_version.clone(),
                    section_id_attr: linked.section_id.clone(),
                    billnumber_version_to: fold.billnumber_version_to.clone(),
                    section_to_id_attr: linked.similar_section.section_id.clone(),
                    score: Some(linked.similar_section.score_es),
                    currency_id: epoch,
                },
            )
            .await?;
        }

        Ok(())
    }

    async fn run_comparator(&self, query_bill: &str, similar_bills: &[String], epoch: i64) {
        if similar_bills.is_empty() {
            return;
        }

        let mut all_bills = vec![query_bill.to_string()];
        all_bills.extend_from_slice(similar_bills);
        let paths: Vec<String> = all_bills
            .iter()
            .map(|bnv| self.resolver.path_for(bnv).to_string_lossy().into_owned())
            .collect();

        match self.comparator.compare_matrix(query_bill, &paths).await {
            Ok(cells) => {
                for cell in cells {
                    if let Err(error) = billsim_db::upsert_bill_to_bill(
                        &self.pool,
                        BillToBillUpsert {
                            billnumber_version: cell.billnumber_version,
                            billnumber_version_to: cell.billnumber_version_to,
                            score_es: None,
                            score: Some(cell.score),
                            score_to: Some(cell.score_to),
                            sections_num: None,
                            sections_match: None,
                            reasons: cell.reasons,
                            identified_by: Some("comparator".to_string()),
                            currency_id: epoch,
                        },
                    )
                    .await
                    {
                        warn!(%error, "comparator score upsert failed");
                    }
                }
            }
            Err(billsim_comparator::ComparatorError::NotConfigured) => {}
            Err(billsim_comparator::ComparatorError::Timeout { timeout_secs, .. }) => {
                warn!(bill = %query_bill, timeout_secs, "comparator timed out, skipping symmetric scores");
            }
            Err(error) => {
                warn!(bill = %query_bill, %error, "comparator invocation failed");
            }
        }
    }
}

fn run_label() -> String {
    "billsim-cli".to_string()
}
