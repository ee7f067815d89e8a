//! Composition root: turn a loaded config into live components.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::info;

use robowarehouse_config::{
    config_dir, config_file_path, load_and_prepare, LoadedConfig, OcrEngineKind, WarehouseConfig,
};
use robowarehouse_core::{OcrEngine, WarehouseError};
use robowarehouse_gateway::AppState;
use robowarehouse_logging::LogSettings;
use robowarehouse_store::SqliteStore;
use robowarehouse_vision::{DisabledEngine, LabelSelector, Recognizer, TesseractEngine};

/// `--config` if given, otherwise `config.yaml` in the config directory.
pub fn resolve_config_path(explicit: Option<PathBuf>) -> PathBuf {
    explicit.unwrap_or_else(|| config_file_path(&config_dir()))
}

/// Load and validate the config; any failure is a [`WarehouseError::Config`].
pub async fn load_config(explicit: Option<PathBuf>) -> Result<LoadedConfig, WarehouseError> {
    let path = resolve_config_path(explicit);
    load_and_prepare(&path).await.map_err(|e| {
        WarehouseError::Config(format!("failed to load {}: {e:#}", path.display()))
    })
}

pub fn log_settings(config: &WarehouseConfig) -> LogSettings {
    LogSettings {
        level: config.logging.level.clone(),
        dir: config.logging.dir.as_ref().map(PathBuf::from),
        json: config.logging.json,
    }
}

pub fn build_engine(config: &WarehouseConfig) -> Arc<dyn OcrEngine> {
    match config.ocr.engine {
        OcrEngineKind::Tesseract => Arc::new(TesseractEngine::new(
            config.ocr.tesseract_bin.clone(),
            config.ocr.languages.clone(),
            config.ocr.page_seg_mode,
        )),
        OcrEngineKind::Disabled => Arc::new(DisabledEngine),
    }
}

pub fn build_recognizer(config: &WarehouseConfig) -> Recognizer {
    let selector = LabelSelector::new(
        config.selector.confidence_threshold,
        config.selector.only_single_letter,
    );
    Recognizer::new(
        build_engine(config),
        selector,
        Duration::from_secs(config.ocr.timeout_secs),
    )
}

/// Open the database and assemble the shared HTTP state.
pub fn build_state(config: &WarehouseConfig) -> Result<Arc<AppState>> {
    let store = SqliteStore::open(Path::new(&config.storage.db_path))?;
    let recognizer = build_recognizer(config);
    info!(
        db = %config.storage.db_path,
        uploads = %config.storage.upload_dir,
        engine = recognizer.engine_name(),
        threshold = config.selector.confidence_threshold,
        "Components initialized"
    );

    Ok(Arc::new(AppState {
        store: Arc::new(store),
        recognizer: Arc::new(recognizer),
        upload_dir: PathBuf::from(&config.storage.upload_dir),
        max_upload_bytes: config.server.max_upload_bytes,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_follows_config() {
        let mut config = WarehouseConfig::default();
        assert_eq!(build_engine(&config).name(), "tesseract");

        config.ocr.engine = OcrEngineKind::Disabled;
        assert_eq!(build_engine(&config).name(), "disabled");
    }

    #[test]
    fn recognizer_uses_selector_settings() {
        let mut config = WarehouseConfig::default();
        config.selector.confidence_threshold = 0.5;
        config.selector.only_single_letter = false;
        let selector = build_recognizer(&config).selector();
        assert_eq!(selector, LabelSelector::new(0.5, false));
    }

    #[test]
    fn explicit_config_path_wins() {
        let path = resolve_config_path(Some(PathBuf::from("/tmp/w.yaml")));
        assert_eq!(path, PathBuf::from("/tmp/w.yaml"));
    }

    #[tokio::test]
    async fn invalid_config_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "selector:\n  confidenceThreshold: 30\n").unwrap();

        match load_config(Some(path)).await {
            Err(WarehouseError::Config(message)) => {
                assert!(message.contains("selector.confidenceThreshold"))
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn state_creates_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = WarehouseConfig::default();
        config.storage.db_path = dir.path().join("data/w.db").display().to_string();
        config.storage.upload_dir = dir.path().join("uploads").display().to_string();
        config.ocr.engine = OcrEngineKind::Disabled;

        let state = build_state(&config).unwrap();
        assert!(dir.path().join("data/w.db").exists());
        assert_eq!(state.max_upload_bytes, config.server.max_upload_bytes);
        assert_eq!(state.recognizer.engine_name(), "disabled");
    }
}
