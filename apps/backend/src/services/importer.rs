//! Chunked batch analysis of imported words.
//!
//! Words go to the gateway a few at a time with a pause between requests so
//! free-tier provider quotas are not exhausted. Drafts change state chunk by
//! chunk; a failed chunk never touches drafts outside it.

use cuotiben_core::batch::{
    apply_results, fail_chunk, mark_analyzing, pending_indices, reset_failed, BatchPolicy, Draft,
};
use tracing::{info, warn};

use crate::services::gateway::AnalysisGateway;

/// Totals of one importer run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub chunks: usize,
    pub done: usize,
    pub failed: usize,
}

pub struct BatchImporter<'a> {
    gateway: &'a dyn AnalysisGateway,
    policy: BatchPolicy,
}

impl<'a> BatchImporter<'a> {
    pub fn new(gateway: &'a dyn AnalysisGateway, policy: BatchPolicy) -> Self {
        Self { gateway, policy }
    }

    /// Analyse every pending draft.
    ///
    /// `on_progress` sees the drafts after each state change: once when a
    /// chunk starts analysing and once when its outcome is applied.
    pub async fn run<F>(&self, drafts: &mut [Draft], mut on_progress: F) -> ImportReport
    where
        F: FnMut(&[Draft]),
    {
        let chunks = self.policy.plan(&pending_indices(drafts));
        let mut report = ImportReport {
            chunks: chunks.len(),
            ..ImportReport::default()
        };

        for (n, chunk) in chunks.iter().enumerate() {
            if n > 0 && !self.policy.chunk_delay.is_zero() {
                tokio::time::sleep(self.policy.chunk_delay).await;
            }

            mark_analyzing(drafts, chunk);
            on_progress(drafts);

            let words: Vec<String> = chunk.iter().map(|&i| drafts[i].word.clone()).collect();
            match self.gateway.analyze_words(&words).await {
                Ok(results) => {
                    let outcome = apply_results(drafts, chunk, results);
                    if !outcome.unmatched.is_empty() {
                        warn!(
                            "Ignoring {} unmatched result(s): {:?}",
                            outcome.unmatched.len(),
                            outcome.unmatched
                        );
                    }
                    for (word, reason) in &outcome.dropped {
                        warn!("Dropped invalid payload for '{}': {}", word, reason);
                    }
                    report.done += outcome.done;
                    report.failed += outcome.failed;
                }
                Err(e) => {
                    warn!("Chunk {} of {} failed: {}", n + 1, chunks.len(), e);
                    fail_chunk(drafts, chunk, &e.to_string(), e.is_transient());
                    report.failed += chunk.len();
                }
            }
            on_progress(drafts);
        }

        info!(
            chunks = report.chunks,
            done = report.done,
            failed = report.failed,
            "Batch analysis finished"
        );
        report
    }

    /// Re-queue failed drafts and analyse them again. Finished drafts are kept.
    pub async fn retry_failed<F>(&self, drafts: &mut [Draft], on_progress: F) -> ImportReport
    where
        F: FnMut(&[Draft]),
    {
        let requeued = reset_failed(drafts);
        info!("Retrying {} failed draft(s)", requeued);
        self.run(drafts, on_progress).await
    }
}
