//! The interchange record written when the user downloads their work.
//!
//! `id` and `source` never leave the process; the record only carries
//! geometry and tag.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::annotation::{Annotation, Source, Tag};
use crate::error::AnnotatorError;
use crate::store::AnnotationStore;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFilter {
    #[default]
    All,
    Only(Source),
}

impl ExportFilter {
    fn admits(&self, ann: &Annotation) -> bool {
        match self {
            ExportFilter::All => true,
            ExportFilter::Only(source) => ann.source() == *source,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExportedBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub tag: Tag,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExportRecord {
    pub image_filename: String,
    pub annotations: Vec<ExportedBox>,
}

impl ExportRecord {
    /// Read-only projection of the store, in store order.
    pub fn project(store: &AnnotationStore, image_filename: &str, filter: ExportFilter) -> Self {
        let annotations = store
            .annotations()
            .iter()
            .filter(|a| filter.admits(a))
            .map(|a| ExportedBox {
                x: a.rect.x,
                y: a.rect.y,
                width: a.rect.width,
                height: a.rect.height,
                tag: a.tag,
            })
            .collect();
        Self {
            image_filename: image_filename.to_string(),
            annotations,
        }
    }

    pub fn to_json(&self, pretty: bool) -> Result<String, AnnotatorError> {
        let json = if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        };
        json.map_err(AnnotatorError::Serialize)
    }

    pub fn write(&self, path: &Path, pretty: bool) -> Result<(), AnnotatorError> {
        let json = self.to_json(pretty)?;
        std::fs::write(path, json).map_err(|e| AnnotatorError::Write(path.to_path_buf(), e))?;
        log::info!(
            "Exported {} annotations to {}",
            self.annotations.len(),
            path.display()
        );
        Ok(())
    }
}

/// `shot.png` becomes `shot<suffix>`, next to the image.
pub fn export_path(image_path: &Path, suffix: &str) -> PathBuf {
    let stem = image_path
        .file_stem()
        .unwrap_or_default()
        .to_str()
        .unwrap_or("image");
    image_path.with_file_name(format!("{stem}{suffix}"))
}
