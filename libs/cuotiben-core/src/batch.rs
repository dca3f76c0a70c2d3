//! Draft bookkeeping for chunked batch analysis.
//!
//! Each draft moves `Pending -> Analyzing -> Done | Error` on its own. The
//! async driver lives in the backend; this module only plans chunks and
//! applies chunk outcomes to the drafts.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::analysis::WordAnalysis;
use crate::error::Result;
use crate::matching::normalize_word;
use crate::types::Entry;

/// Words analysed per upstream request.
pub const DEFAULT_CHUNK_SIZE: usize = 3;
/// Pause between two chunks.
pub const DEFAULT_CHUNK_DELAY: Duration = Duration::from_secs(3);

/// Chunking and pacing of batch analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPolicy {
    pub chunk_size: usize,
    pub chunk_delay: Duration,
}

impl Default for BatchPolicy {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_delay: DEFAULT_CHUNK_DELAY,
        }
    }
}

impl BatchPolicy {
    /// Split draft indices into chunks. A zero chunk size is treated as one.
    pub fn plan(&self, indices: &[usize]) -> Vec<Vec<usize>> {
        indices
            .chunks(self.chunk_size.max(1))
            .map(<[usize]>::to_vec)
            .collect()
    }
}

/// Analysis state of a draft.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftStatus {
    #[default]
    Pending,
    Analyzing,
    Done,
    Error,
}

/// Why a draft failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftError {
    pub message: String,
    /// False when the upstream answered with something unusable.
    pub retryable: bool,
}

/// Unsaved entry produced during import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    pub word: String,
    #[serde(default)]
    pub status: DraftStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<WordAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<DraftError>,
}

impl Draft {
    pub fn new(word: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            status: DraftStatus::Pending,
            analysis: None,
            error: None,
        }
    }

    /// Convert a finished draft into a validated entry.
    ///
    /// Drafts come back from the client, so the analysis is checked again.
    pub fn to_entry(&self, created_at: i64) -> Option<Result<Entry>> {
        match (&self.status, &self.analysis) {
            (DraftStatus::Done, Some(analysis)) => Some(
                analysis
                    .clone()
                    .into_entry(created_at)
                    .and_then(|entry| entry.validate().map(|()| entry)),
            ),
            _ => None,
        }
    }
}

/// Build pending drafts from raw input, dropping blanks and duplicates.
pub fn prepare_drafts<S: AsRef<str>>(words: &[S]) -> Vec<Draft> {
    let mut seen = std::collections::HashSet::new();
    words
        .iter()
        .map(|w| w.as_ref().trim())
        .filter(|w| !w.is_empty() && seen.insert(normalize_word(w)))
        .map(Draft::new)
        .collect()
}

/// Indices of drafts still waiting for analysis.
pub fn pending_indices(drafts: &[Draft]) -> Vec<usize> {
    indices_with(drafts, DraftStatus::Pending)
}

/// Indices of failed drafts.
pub fn failed_indices(drafts: &[Draft]) -> Vec<usize> {
    indices_with(drafts, DraftStatus::Error)
}

fn indices_with(drafts: &[Draft], status: DraftStatus) -> Vec<usize> {
    drafts
        .iter()
        .enumerate()
        .filter(|(_, d)| d.status == status)
        .map(|(i, _)| i)
        .collect()
}

/// Put failed drafts back into the queue. Finished drafts are left alone.
pub fn reset_failed(drafts: &mut [Draft]) -> usize {
    let mut count = 0;
    for draft in drafts.iter_mut().filter(|d| d.status == DraftStatus::Error) {
        draft.status = DraftStatus::Pending;
        draft.error = None;
        count += 1;
    }
    count
}

pub fn mark_analyzing(drafts: &mut [Draft], chunk: &[usize]) {
    for &i in chunk {
        drafts[i].status = DraftStatus::Analyzing;
        drafts[i].error = None;
    }
}

/// Outcome of applying one chunk of results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkOutcome {
    pub done: usize,
    pub failed: usize,
    /// Results that matched no word of the chunk.
    pub unmatched: Vec<String>,
    /// Sub-payloads dropped by validation, per word.
    pub dropped: Vec<(String, String)>,
}

/// Match results to the drafts of a chunk.
///
/// Results are matched on the normalized word. Unmatched results are dropped
/// and chunk words left without a result fail as retryable.
pub fn apply_results(
    drafts: &mut [Draft],
    chunk: &[usize],
    results: Vec<WordAnalysis>,
) -> ChunkOutcome {
    let mut outcome = ChunkOutcome::default();
    let mut by_word: HashMap<String, usize> = chunk
        .iter()
        .map(|&i| (normalize_word(&drafts[i].word), i))
        .collect();

    for mut result in results {
        let Some(i) = by_word.remove(&normalize_word(&result.word)) else {
            outcome.unmatched.push(result.word);
            continue;
        };
        for e in result.sanitize() {
            outcome.dropped.push((drafts[i].word.clone(), e.to_string()));
        }
        result.word = drafts[i].word.clone();
        drafts[i].analysis = Some(result);
        drafts[i].status = DraftStatus::Done;
        drafts[i].error = None;
        outcome.done += 1;
    }

    for &i in chunk {
        if drafts[i].status == DraftStatus::Analyzing {
            drafts[i].status = DraftStatus::Error;
            drafts[i].error = Some(DraftError {
                message: "no analysis returned for this word".to_string(),
                retryable: true,
            });
            outcome.failed += 1;
        }
    }

    outcome
}

/// Fail every draft of a chunk after the upstream call itself failed.
pub fn fail_chunk(drafts: &mut [Draft], chunk: &[usize], message: &str, retryable: bool) {
    for &i in chunk {
        drafts[i].status = DraftStatus::Error;
        drafts[i].error = Some(DraftError {
            message: message.to_string(),
            retryable,
        });
    }
}

/// Count of drafts per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftSummary {
    pub pending: usize,
    pub analyzing: usize,
    pub done: usize,
    pub error: usize,
}

impl DraftSummary {
    pub fn of(drafts: &[Draft]) -> Self {
        let mut summary = Self::default();
        for d in drafts {
            match d.status {
                DraftStatus::Pending => summary.pending += 1,
                DraftStatus::Analyzing => summary.analyzing += 1,
                DraftStatus::Done => summary.done += 1,
                DraftStatus::Error => summary.error += 1,
            }
        }
        summary
    }
}
