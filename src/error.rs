use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnnotatorError {
    #[error("Failed to load image {0}: {1}")]
    ImageLoad(PathBuf, image::ImageError),
    #[error("Failed to read {0}: {1}")]
    Read(PathBuf, std::io::Error),
    #[error("Failed to write {0}: {1}")]
    Write(PathBuf, std::io::Error),
    #[error("Prediction response is not valid JSON: {0}")]
    MalformedPrediction(serde_json::Error),
    #[error("Failed to serialize export: {0}")]
    Serialize(serde_json::Error),
    #[error("Failed to parse config {0}: {1}")]
    Config(PathBuf, toml::de::Error),
}
