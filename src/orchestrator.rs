use std::fmt;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::{debug, info};

use crate::classifier::Classifier;
use crate::feed::NoticeSource;
use crate::ledger::Ledger;
use crate::models::{LedgerRecord, RunSummary};
use crate::notifications::Notifier;

/// Stages of a run, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Init,
    Fetch,
    Classify,
    PersistAndNotify,
    Done,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunPhase::Init => "init",
            RunPhase::Fetch => "fetch",
            RunPhase::Classify => "classify",
            RunPhase::PersistAndNotify => "persist_and_notify",
            RunPhase::Done => "done",
        };
        f.write_str(name)
    }
}

/// Sequences one ingestion run: load ledger, fetch, classify unseen notices,
/// then persist and notify.
pub struct Orchestrator<F, C, L, N>
where
    F: NoticeSource,
    C: Classifier,
    L: Ledger,
    N: Notifier,
{
    feed: F,
    classifier: C,
    ledger: L,
    notifier: N,
}

impl<F, C, L, N> Orchestrator<F, C, L, N>
where
    F: NoticeSource,
    C: Classifier,
    L: Ledger,
    N: Notifier,
{
    pub fn new(feed: F, classifier: C, ledger: L, notifier: N) -> Self {
        Self {
            feed,
            classifier,
            ledger,
            notifier,
        }
    }

    /// Run the pipeline for notices published on `today`
    pub async fn run(&self, today: NaiveDate) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        info!(phase = %RunPhase::Init, "Loading ledger");
        let mut known = self
            .ledger
            .load_known_ids()
            .context("Failed to load ledger")?;

        info!(phase = %RunPhase::Fetch, %today, "Fetching notices");
        let notices = self.feed.fetch_notices(today).await;
        summary.fetched = notices.len();

        info!(phase = %RunPhase::Classify, count = notices.len(), known = known.len(), "Classifying unseen notices");
        let mut findings: Vec<LedgerRecord> = Vec::new();
        for notice in &notices {
            // Also guards against an id repeated within one feed response
            if !known.insert(notice.document_number.clone()) {
                debug!(document = %notice.document_number, "Skipping known notice");
                summary.skipped += 1;
                continue;
            }

            let verdict = self.classifier.classify(notice).await;
            summary.classified += 1;

            if verdict.is_relevant {
                info!(
                    document = %notice.document_number,
                    drug = %verdict.drug,
                    filing_type = %verdict.filing_type,
                    "New filing found"
                );
                findings.push(LedgerRecord::from_finding(notice, verdict, today));
            }
        }

        if !findings.is_empty() {
            info!(phase = %RunPhase::PersistAndNotify, count = findings.len(), "Persisting findings");
            self.ledger
                .append(&findings)
                .context("Failed to append findings to ledger")?;

            // Findings are durable before delivery is attempted
            self.notifier
                .notify(&findings, today)
                .await
                .context("Failed to send digest")?;
        }

        summary.findings = findings;

        info!(
            phase = %RunPhase::Done,
            fetched = summary.fetched,
            skipped = summary.skipped,
            classified = summary.classified,
            accepted = summary.accepted(),
            "Run complete"
        );

        Ok(summary)
    }

    /// Get the ledger for direct access
    pub fn ledger(&self) -> &L {
        &self.ledger
    }
}
