//! The canonical annotation collection for the current image.
//!
//! Every mutation goes through [`AnnotationStore`]; it normalizes and clamps
//! geometry, rejects boxes below [`MIN_SIZE`](crate::geometry::MIN_SIZE), keeps
//! ids unique and keeps the selection pointing at a live record.

use crate::annotation::{Annotation, AnnotationId, Source, Tag};
use crate::geometry::{
    clamp_to_bounds, meets_minimum_size, normalize, BoundingBox, ImageSize, Point, MIN_SIZE,
};

/// Boxes drawn on one image, plus which of them is selected.
pub struct AnnotationStore {
    image_size: ImageSize,
    records: Vec<Annotation>,
    selected: Option<AnnotationId>,
    generation: u64,
}

impl AnnotationStore {
    pub fn new(image_size: ImageSize) -> Self {
        Self {
            image_size,
            records: Vec::new(),
            selected: None,
            generation: 0,
        }
    }

    pub fn image_size(&self) -> ImageSize {
        self.image_size
    }

    /// Bumped whenever the store is reset for a new image. Lets callers tell
    /// whether an asynchronous result still belongs to the current image.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Starts over for a different image.
    pub fn load_image(&mut self, image_size: ImageSize) {
        self.clear();
        self.image_size = image_size;
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.selected = None;
        self.generation += 1;
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &AnnotationId) -> Option<&Annotation> {
        self.records.iter().find(|a| a.id() == id)
    }

    pub fn contains(&self, id: &AnnotationId) -> bool {
        self.get(id).is_some()
    }

    /// Admits a new record. Returns `None` when the box is too small once
    /// fitted to the image; nothing is stored in that case.
    pub fn create(&mut self, rect: BoundingBox, tag: Tag, source: Source) -> Option<AnnotationId> {
        let rect = clamp_to_bounds(normalize(rect), self.image_size);
        if !meets_minimum_size(rect) {
            log::debug!("Rejected {source} box {rect:?}: below minimum size");
            return None;
        }
        let id = self.fresh_id(source);
        self.records.push(Annotation::new(id.clone(), rect, tag, source));
        Some(id)
    }

    /// Moves or resizes a record, re-fitting it to the image. Sides shorter
    /// than [`MIN_SIZE`] grow from the origin. Unknown ids are ignored since
    /// gesture events can arrive after a delete.
    pub fn update(&mut self, id: &AnnotationId, rect: BoundingBox) {
        let mut rect = normalize(rect);
        rect.width = rect.width.max(MIN_SIZE);
        rect.height = rect.height.max(MIN_SIZE);
        let rect = clamp_to_bounds(rect, self.image_size);
        if rect.width < MIN_SIZE || rect.height < MIN_SIZE {
            log::debug!("Ignoring update {rect:?}: image too small to hold it");
            return;
        }
        if let Some(ann) = self.records.iter_mut().find(|a| a.id() == id) {
            ann.rect = rect;
        }
    }

    pub fn retag(&mut self, id: &AnnotationId, tag: Tag) {
        if let Some(ann) = self.records.iter_mut().find(|a| a.id() == id) {
            ann.tag = tag;
        }
    }

    pub fn remove(&mut self, id: &AnnotationId) {
        let before = self.records.len();
        self.records.retain(|a| a.id() != id);
        if self.records.len() != before && self.selected.as_ref() == Some(id) {
            self.selected = None;
        }
    }

    /// Swaps out every record of `source` for `batch` in one step. Manual
    /// records are never replaced, so a `Source::Manual` call does nothing.
    ///
    /// Boxes in the batch go through the same admission as [`create`], so
    /// undersized ones are dropped. Returns the number of records admitted.
    ///
    /// [`create`]: AnnotationStore::create
    pub fn replace_by_source(&mut self, source: Source, batch: Vec<(BoundingBox, Tag)>) -> usize {
        if source == Source::Manual {
            log::warn!("Refusing to replace manual annotations");
            return 0;
        }
        let removed = {
            let before = self.records.len();
            self.records.retain(|a| a.source() != source);
            before - self.records.len()
        };
        if let Some(selected) = &self.selected {
            if !self.contains(selected) {
                self.selected = None;
            }
        }
        let admitted = batch
            .into_iter()
            .filter_map(|(rect, tag)| self.create(rect, tag, source))
            .count();
        log::info!("Replaced {removed} {source} annotations with {admitted}");
        admitted
    }

    pub fn selected(&self) -> Option<&AnnotationId> {
        self.selected.as_ref()
    }

    pub fn selected_annotation(&self) -> Option<&Annotation> {
        self.selected.as_ref().and_then(|id| self.get(id))
    }

    /// Selects `id` if it is present; a stale id leaves the selection as is.
    pub fn select(&mut self, id: &AnnotationId) {
        if self.contains(id) {
            self.selected = Some(id.clone());
        }
    }

    pub fn deselect(&mut self) {
        self.selected = None;
    }

    /// Topmost record under `p`; later records draw over earlier ones.
    pub fn hit_test(&self, p: Point) -> Option<&Annotation> {
        self.records.iter().rev().find(|a| a.rect.contains(p))
    }

    fn fresh_id(&self, source: Source) -> AnnotationId {
        loop {
            let id = AnnotationId::generate(source);
            if !self.contains(&id) {
                return id;
            }
        }
    }
}
