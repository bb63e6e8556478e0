/*!
 * Batch splitting.
 *
 * A caller's text list is cut into sub-batches that respect the provider's
 * payload limit. Each sub-batch keeps the offset range it covers so results
 * splice back into caller order whatever order they complete in.
 */

use std::ops::Range;

use crate::app_config::TranslationProvider;
use crate::language_utils::Language;
use crate::providers::TranslateRequest;

/// Per-request payload limit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchLimit {
    /// At most this many texts
    MaxItems(usize),
    /// At most this many cumulative UTF-8 bytes
    MaxBytes(usize),
}

/// Split `texts` into contiguous ranges honoring `limit`
///
/// Never yields an empty range; a single text over the byte limit forms its
/// own batch.
pub fn split_into_batches<S: AsRef<str>>(texts: &[S], limit: BatchLimit) -> Vec<Range<usize>> {
    let mut batches = Vec::new();
    if texts.is_empty() {
        return batches;
    }

    match limit {
        BatchLimit::MaxItems(max) => {
            let max = max.max(1);
            let mut start = 0;
            while start < texts.len() {
                let end = (start + max).min(texts.len());
                batches.push(start..end);
                start = end;
            }
        }
        BatchLimit::MaxBytes(max) => {
            let mut start = 0;
            let mut bytes = 0;
            for (i, text) in texts.iter().enumerate() {
                let len = text.as_ref().len();
                if bytes + len > max && i > start {
                    batches.push(start..i);
                    start = i;
                    bytes = 0;
                }
                bytes += len;
            }
            batches.push(start..texts.len());
        }
    }

    batches
}

/// One bounded slice of a caller's request, dispatched as one outbound call
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationBatchJob {
    /// Back-end the job is bound for
    pub provider: TranslationProvider,
    /// Source language
    pub source: Language,
    /// Target language
    pub target: Language,
    /// Texts in this slice
    pub texts: Vec<String>,
    /// Position of the slice in the caller's list
    pub offset: Range<usize>,
}

impl TranslationBatchJob {
    /// Build the jobs for a full request
    pub fn split(
        provider: TranslationProvider,
        texts: &[String],
        source: Language,
        target: Language,
        limit: BatchLimit,
    ) -> Vec<Self> {
        split_into_batches(texts, limit)
            .into_iter()
            .map(|range| Self {
                provider,
                source,
                target,
                texts: texts[range.clone()].to_vec(),
                offset: range,
            })
            .collect()
    }

    /// Provider request for this job
    pub fn to_request(&self) -> TranslateRequest {
        TranslateRequest::new(self.texts.clone(), self.source, self.target)
    }
}
