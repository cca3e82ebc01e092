//! Folding a batch of predicted boxes into the store.
//!
//! A new batch always supersedes the previous predicted set; manual boxes are
//! left alone. No overlap-based deduplication happens here, see
//! [`iou`](crate::geometry::iou) for callers that want to compare sets.

use serde::Deserialize;
use serde_json::Value;

use crate::annotation::{Source, Tag};
use crate::error::AnnotatorError;
use crate::geometry::BoundingBox;
use crate::store::AnnotationStore;

/// One box as proposed by the prediction service.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct PredictedBox {
    #[serde(flatten)]
    pub rect: BoundingBox,
    pub tag: Tag,
}

impl PredictedBox {
    pub fn new(rect: BoundingBox, tag: Tag) -> Self {
        Self { rect, tag }
    }

    fn is_finite(&self) -> bool {
        [self.rect.x, self.rect.y, self.rect.width, self.rect.height]
            .iter()
            .all(|v| v.is_finite())
    }
}

/// Parses a prediction response.
///
/// Accepts `{"annotations": [...]}` or a bare array. A missing `annotations`
/// field is an empty batch. Entries that do not validate are dropped one by
/// one; only a body that is not JSON at all is an error.
pub fn parse_batch(body: &str) -> Result<Vec<PredictedBox>, AnnotatorError> {
    let value: Value = serde_json::from_str(body).map_err(AnnotatorError::MalformedPrediction)?;
    let entries = match value {
        Value::Array(entries) => entries,
        Value::Object(mut map) => match map.remove("annotations") {
            Some(Value::Array(entries)) => entries,
            Some(other) => {
                log::warn!("Ignoring non-array annotations field: {other}");
                Vec::new()
            }
            None => Vec::new(),
        },
        other => {
            log::warn!("Unexpected prediction response: {other}");
            Vec::new()
        }
    };

    let total = entries.len();
    let batch: Vec<PredictedBox> = entries
        .into_iter()
        .enumerate()
        .filter_map(|(idx, entry)| match serde_json::from_value::<PredictedBox>(entry) {
            Ok(pred) if pred.is_finite() => Some(pred),
            Ok(_) => {
                log::warn!("Dropping prediction {idx}: non-finite geometry");
                None
            }
            Err(e) => {
                log::warn!("Dropping prediction {idx}: {e}");
                None
            }
        })
        .collect();
    if batch.len() < total {
        log::warn!("Kept {} of {total} predictions", batch.len());
    }
    Ok(batch)
}

/// Replaces every predicted record with `batch`. An empty batch just clears
/// the predicted set. Returns how many boxes were admitted.
pub fn apply_predictions(store: &mut AnnotationStore, batch: Vec<PredictedBox>) -> usize {
    let records = batch.into_iter().map(|p| (p.rect, p.tag)).collect();
    store.replace_by_source(Source::Predicted, records)
}

/// Like [`apply_predictions`], but only if the store still shows the image
/// the request was made for. Returns `None` for a stale batch.
pub fn apply_predictions_for(
    store: &mut AnnotationStore,
    generation: u64,
    batch: Vec<PredictedBox>,
) -> Option<usize> {
    if store.generation() != generation {
        log::info!(
            "Discarding predictions for generation {generation}, store is at {}",
            store.generation()
        );
        return None;
    }
    Some(apply_predictions(store, batch))
}
