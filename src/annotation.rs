use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geometry::BoundingBox;

/// UI element class attached to a box.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tag {
    #[default]
    Button,
    Input,
    Radio,
    Dropdown,
}

impl Tag {
    pub const ALL: [Tag; 4] = [Tag::Button, Tag::Input, Tag::Radio, Tag::Dropdown];

    pub fn name(&self) -> &'static str {
        match self {
            Tag::Button => "Button",
            Tag::Input => "Input",
            Tag::Radio => "Radio",
            Tag::Dropdown => "Dropdown",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where a box came from. Fixed for the lifetime of the record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Manual,
    Predicted,
}

impl Source {
    fn prefix(&self) -> &'static str {
        match self {
            Source::Manual => "manual",
            Source::Predicted => "predicted",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AnnotationId(String);

impl AnnotationId {
    /// `{source}-{unix millis}-{random}`. The timestamp orders ids from
    /// successive sessions, the random part separates ids minted in the
    /// same millisecond.
    pub fn generate(source: Source) -> Self {
        let millis = chrono::Utc::now().timestamp_millis();
        Self(format!(
            "{}-{}-{}",
            source.prefix(),
            millis,
            Uuid::new_v4().simple()
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Annotation {
    id: AnnotationId,
    source: Source,
    pub rect: BoundingBox,
    pub tag: Tag,
}

impl Annotation {
    pub(crate) fn new(id: AnnotationId, rect: BoundingBox, tag: Tag, source: Source) -> Self {
        Self {
            id,
            source,
            rect,
            tag,
        }
    }

    pub fn id(&self) -> &AnnotationId {
        &self.id
    }

    pub fn source(&self) -> Source {
        self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tag_is_first_in_catalogue() {
        assert_eq!(Tag::default(), Tag::ALL[0]);
    }

    #[test]
    fn tags_serialize_by_name() {
        assert_eq!(serde_json::to_string(&Tag::Dropdown).unwrap(), "\"Dropdown\"");
        let tag: Tag = serde_json::from_str("\"Radio\"").unwrap();
        assert_eq!(tag, Tag::Radio);
        assert!(serde_json::from_str::<Tag>("\"Checkbox\"").is_err());
    }

    #[test]
    fn ids_carry_source_prefix() {
        let id = AnnotationId::generate(Source::Predicted);
        assert!(id.as_str().starts_with("predicted-"));
        assert_eq!(id.as_str().split('-').count(), 3);
    }

    #[test]
    fn rapid_ids_differ() {
        let a = AnnotationId::generate(Source::Manual);
        let b = AnnotationId::generate(Source::Manual);
        assert_ne!(a, b);
    }
}
