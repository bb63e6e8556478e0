/*!
 * Timeline alignment.
 *
 * Carries an existing translated timeline forward onto a revised source
 * timeline. This is a single linear pass with two cursors, not a sequence
 * alignment: when segments are not 1:1 an overlap can pair a reference
 * segment with content that belonged to a neighbouring candidate.
 */

use log::debug;
use uuid::Uuid;

use crate::errors::TranslationError;
use crate::subtitle_codec::{Segment, Timeline};

fn overlaps(reference: &Segment, candidate: &Segment) -> bool {
    (reference.start_ms <= candidate.start_ms && reference.end_ms > candidate.start_ms)
        || (candidate.start_ms <= reference.start_ms && candidate.end_ms > reference.start_ms)
}

// @returns: Segment with the candidate's id and content on the reference's timestamps
fn carried(reference: &Segment, candidate: &Segment) -> Segment {
    Segment {
        start_ms: reference.start_ms,
        end_ms: reference.end_ms,
        ..candidate.clone()
    }
}

fn placeholder(reference: &Segment) -> Segment {
    Segment::new(
        Uuid::new_v4().simple().to_string(),
        reference.start_ms,
        reference.end_ms,
        String::new(),
    )
}

/// Re-align `candidate` (an old translation) onto `reference` (the new source)
///
/// Never fails. Stops as soon as either side runs out, so the result can be
/// shorter than `reference`; see [`ensure_aligned`].
pub fn transform(candidate: &[Segment], reference: &[Segment]) -> Timeline {
    let mut result = Vec::with_capacity(reference.len());
    let (mut i, mut j) = (0, 0);

    while let (Some(ref_segment), Some(cand_segment)) = (reference.get(i), candidate.get(j)) {
        if ref_segment.same_interval(cand_segment) || overlaps(ref_segment, cand_segment) {
            result.push(carried(ref_segment, cand_segment));
            i += 1;
            j += 1;
        } else if ref_segment.start_ms >= cand_segment.end_ms {
            // Candidate segment no longer has a source counterpart
            j += 1;
        } else {
            result.push(placeholder(ref_segment));
            i += 1;
        }
    }

    debug!(
        "Aligned {} candidate segments onto {} reference segments, produced {}",
        candidate.len(),
        reference.len(),
        result.len()
    );
    result
}

/// Fail when an aligned timeline came out shorter than its reference
pub fn ensure_aligned(result: &[Segment], reference: &[Segment]) -> Result<(), TranslationError> {
    if result.len() < reference.len() {
        return Err(TranslationError::AlignmentLengthMismatch {
            expected: reference.len(),
            actual: result.len(),
        });
    }
    Ok(())
}
