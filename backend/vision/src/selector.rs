//! Best-label selection over raw OCR detections.
//!
//! Turns whatever the OCR engine saw into a single lowercase letter plus a
//! confidence percentage, or decides that no reliable label exists.
//!
//! Selection order:
//! 1. drop detections that are unscored or below the threshold;
//! 2. in single-letter mode, prefer the strongest lone ASCII letter;
//! 3. otherwise take the strongest survivor, and if its text is longer than
//!    one character, pull the first ASCII letter out of it (the letter keeps
//!    the parent's confidence);
//! 4. failing that, emit the trimmed text itself, lowercased.
//!
//! Among equal confidences the earliest detection in input order wins.

use robowarehouse_core::{Detection, LabelResult};

/// Default minimum fractional confidence for a detection to count.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.30;

/// Label selection policy. Pure and cheap to copy; safe to share across requests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelSelector {
    /// Detections scoring below this fraction are ignored entirely.
    pub threshold: f64,
    /// Prefer candidates whose whole text is one ASCII letter.
    pub only_single_letter: bool,
}

impl Default for LabelSelector {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            only_single_letter: true,
        }
    }
}

/// A detection that passed the threshold, with its text trimmed.
#[derive(Debug)]
struct Candidate<'a> {
    text: &'a str,
    confidence: f64,
}

impl LabelSelector {
    pub fn new(threshold: f64, only_single_letter: bool) -> Self {
        Self {
            threshold,
            only_single_letter,
        }
    }

    /// Pick the label a human would most likely read from these detections.
    ///
    /// Never fails: "nothing usable" is reported as [`LabelResult::absent`].
    pub fn select(&self, detections: &[Detection]) -> LabelResult {
        let candidates: Vec<Candidate<'_>> = detections
            .iter()
            .filter_map(|d| self.admit(d))
            .collect();

        if candidates.is_empty() {
            return LabelResult::absent();
        }

        if self.only_single_letter {
            let letters = candidates.iter().filter(|c| is_single_letter(c.text));
            if let Some(best) = first_max(letters) {
                return LabelResult::from_fraction(best.text.to_ascii_lowercase(), best.confidence);
            }
        }

        let Some(best) = first_max(candidates.iter()) else {
            return LabelResult::absent();
        };

        if best.text.chars().count() > 1 {
            if let Some(letter) = best.text.chars().find(char::is_ascii_alphabetic) {
                return LabelResult::from_fraction(
                    letter.to_ascii_lowercase().to_string(),
                    best.confidence,
                );
            }
        }

        // No letter to extract: keep whatever the engine read, even if it is
        // empty or numeric. Callers see this as a (possibly odd) label.
        LabelResult::from_fraction(best.text.to_lowercase(), best.confidence)
    }

    fn admit<'a>(&self, detection: &'a Detection) -> Option<Candidate<'a>> {
        let confidence = detection.confidence?;
        // NaN fails this comparison as well
        if !(confidence >= self.threshold) {
            return None;
        }
        Some(Candidate {
            text: detection.text.trim(),
            confidence,
        })
    }
}

fn is_single_letter(text: &str) -> bool {
    let mut chars = text.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if c.is_ascii_alphabetic())
}

/// Highest-confidence candidate; ties keep the first one seen.
fn first_max<'c, 'a: 'c>(
    candidates: impl Iterator<Item = &'c Candidate<'a>>,
) -> Option<&'c Candidate<'a>> {
    candidates.fold(None, |best, c| match best {
        Some(b) if b.confidence >= c.confidence => Some(b),
        _ => Some(c),
    })
}
