use serde::{Deserialize, Serialize};

/// Pixel region reported by an OCR engine. Carried through for display only.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BoundingBox {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

/// One raw OCR hit, normalized from whatever shape the engine returns.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Detection {
    pub text: String,
    /// Fraction in 0..=1; `None` when the engine did not score the hit
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<BoundingBox>,
}

impl Detection {
    pub fn new(text: impl Into<String>, confidence: f64) -> Self {
        Self {
            text: text.into(),
            confidence: Some(confidence),
            region: None,
        }
    }

    pub fn unscored(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            confidence: None,
            region: None,
        }
    }

    pub fn with_region(mut self, region: BoundingBox) -> Self {
        self.region = Some(region);
        self
    }
}

/// The label selector's decision for one image.
///
/// When `label` is `None` the confidence is exactly zero.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LabelResult {
    pub label: Option<String>,
    /// Percentage, 0..=100
    pub confidence_percent: f64,
}

impl LabelResult {
    pub fn absent() -> Self {
        Self {
            label: None,
            confidence_percent: 0.0,
        }
    }

    /// Build a result from a label and the fractional confidence it came from.
    pub fn from_fraction(label: impl Into<String>, confidence: f64) -> Self {
        Self {
            label: Some(label.into()),
            confidence_percent: confidence * 100.0,
        }
    }

    pub fn is_absent(&self) -> bool {
        self.label.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_has_zero_confidence() {
        let r = LabelResult::absent();
        assert!(r.is_absent());
        assert_eq!(r.confidence_percent, 0.0);
    }

    #[test]
    fn fraction_is_scaled_once() {
        let r = LabelResult::from_fraction("b", 0.5);
        assert_eq!(r.label.as_deref(), Some("b"));
        assert_eq!(r.confidence_percent, 50.0);
    }

    #[test]
    fn region_is_omitted_from_json_when_missing() {
        let json = serde_json::to_value(Detection::new("c", 0.9)).unwrap();
        assert!(json.get("region").is_none());
        assert_eq!(json["text"], "c");
    }
}
