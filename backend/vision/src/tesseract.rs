//! Tesseract CLI adapter.
//!
//! Pipes the PNG into `tesseract stdin stdout ... tsv` and normalizes the
//! word-level TSV rows into [`Detection`]s. TSV confidences are percentages
//! with `-1` meaning "not scored".

use std::process::Stdio;

use anyhow::{Context, Result};
use async_trait::async_trait;
use robowarehouse_core::{BoundingBox, Detection, OcrEngine, WarehouseError};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

const ENGINE_NAME: &str = "tesseract";

/// TSV `level` value for individual words.
const WORD_LEVEL: &str = "5";

#[derive(Debug, Clone)]
pub struct TesseractEngine {
    binary: String,
    languages: Vec<String>,
    page_seg_mode: u8,
}

impl TesseractEngine {
    pub fn new(binary: impl Into<String>, languages: Vec<String>, page_seg_mode: u8) -> Self {
        Self {
            binary: binary.into(),
            languages,
            page_seg_mode,
        }
    }

    fn args(&self) -> Vec<String> {
        let mut args = vec![
            "stdin".to_string(),
            "stdout".to_string(),
            "--psm".to_string(),
            self.page_seg_mode.to_string(),
        ];
        if !self.languages.is_empty() {
            args.push("-l".to_string());
            args.push(self.languages.join("+"));
        }
        args.push("tsv".to_string());
        args
    }
}

impl Default for TesseractEngine {
    fn default() -> Self {
        // psm 11: sparse text, find as much as possible in no particular order
        Self::new("tesseract", vec!["eng".to_string()], 11)
    }
}

#[async_trait]
impl OcrEngine for TesseractEngine {
    fn name(&self) -> &str {
        ENGINE_NAME
    }

    async fn detect(&self, png: &[u8]) -> Result<Vec<Detection>> {
        let args = self.args();
        debug!(binary = %self.binary, args = ?args, "Running tesseract");

        let mut child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                WarehouseError::ocr(ENGINE_NAME, format!("failed to start {}: {e}", self.binary))
            })?;

        let mut stdin = child.stdin.take().context("tesseract stdin was not piped")?;
        let input = png.to_vec();
        let writer = tokio::spawn(async move {
            let result = stdin.write_all(&input).await;
            drop(stdin);
            result
        });

        let output = child
            .wait_with_output()
            .await
            .context("Failed to wait for tesseract")?;

        if let Ok(Err(e)) = writer.await {
            warn!(error = %e, "Failed to stream image into tesseract");
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(WarehouseError::ocr(ENGINE_NAME, stderr.trim().to_string()).into());
        }

        let tsv = String::from_utf8_lossy(&output.stdout);
        let detections = parse_tsv(&tsv);
        debug!(count = detections.len(), "Tesseract detections parsed");
        Ok(detections)
    }
}

/// Parse tesseract TSV output into word detections.
///
/// Rows that are not word-level, have no text, or are malformed are skipped.
pub fn parse_tsv(tsv: &str) -> Vec<Detection> {
    tsv.lines()
        .skip_while(|line| line.starts_with("level"))
        .filter_map(parse_row)
        .collect()
}

fn parse_row(line: &str) -> Option<Detection> {
    let cols: Vec<&str> = line.split('\t').collect();
    if cols.len() < 12 || cols[0] != WORD_LEVEL {
        return None;
    }

    let text = cols[11..].join("\t");
    if text.trim().is_empty() {
        return None;
    }

    let confidence = cols[10]
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|c| *c >= 0.0)
        .map(|c| (c / 100.0).min(1.0));

    let region = match (
        cols[6].parse::<u32>(),
        cols[7].parse::<u32>(),
        cols[8].parse::<u32>(),
        cols[9].parse::<u32>(),
    ) {
        (Ok(left), Ok(top), Ok(width), Ok(height)) => Some(BoundingBox {
            left,
            top,
            width,
            height,
        }),
        _ => None,
    };

    Some(Detection {
        text,
        confidence,
        region,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext
1\t1\t0\t0\t0\t0\t0\t0\t640\t480\t-1\t
2\t1\t1\t0\t0\t0\t120\t80\t90\t110\t-1\t
5\t1\t1\t1\t1\t1\t120\t80\t90\t110\t91.537\tC
5\t1\t1\t1\t1\t2\t300\t90\t60\t40\t42\tx7
5\t1\t1\t1\t1\t3\t400\t90\t10\t10\t-1\tq
5\t1\t1\t1\t1\t4\t410\t90\t10\t10\t88\t ";

    #[test]
    fn parses_word_rows_only() {
        let detections = parse_tsv(SAMPLE);
        let texts: Vec<&str> = detections.iter().map(|d| d.text.as_str()).collect();
        assert_eq!(texts, vec!["C", "x7", "q"]);
    }

    #[test]
    fn normalizes_confidence_to_fraction() {
        let detections = parse_tsv(SAMPLE);
        assert!((detections[0].confidence.unwrap() - 0.91537).abs() < 1e-9);
        assert!((detections[1].confidence.unwrap() - 0.42).abs() < 1e-9);
    }

    #[test]
    fn negative_confidence_means_unscored() {
        let detections = parse_tsv(SAMPLE);
        assert_eq!(detections[2].confidence, None);
    }

    #[test]
    fn keeps_bounding_box() {
        let detections = parse_tsv(SAMPLE);
        assert_eq!(
            detections[0].region,
            Some(BoundingBox {
                left: 120,
                top: 80,
                width: 90,
                height: 110
            })
        );
    }

    #[test]
    fn empty_output_has_no_detections() {
        assert!(parse_tsv("").is_empty());
        assert!(parse_tsv("level\tpage_num\n").is_empty());
    }

    #[test]
    fn builds_cli_arguments() {
        let engine = TesseractEngine::new("tesseract", vec!["eng".into(), "deu".into()], 10);
        assert_eq!(
            engine.args(),
            vec!["stdin", "stdout", "--psm", "10", "-l", "eng+deu", "tsv"]
        );
    }

    #[tokio::test]
    async fn missing_binary_is_an_ocr_error() {
        let engine = TesseractEngine::new("/nonexistent/tesseract-binary", vec![], 11);
        let err = engine.detect(&[0u8; 4]).await.unwrap_err();
        let typed = WarehouseError::from_anyhow(err);
        assert!(matches!(typed, WarehouseError::Ocr { .. }));
    }
}
