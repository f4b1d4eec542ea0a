//! Strongly-typed value objects used by domain entities.
//!
//! Domain structs should carry these wrappers instead of raw primitives so that
//! identifiers, URLs, counts and tag lists are normalized at the boundary.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use thiserror::Error;
use validator::ValidateUrl;

/// Errors produced when attempting to construct constrained domain types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeConstraintError {
    /// An identifier was zero or negative.
    #[error("{0} must be greater than zero")]
    NonPositiveId(&'static str),
    /// A numeric value required to be non-negative was negative.
    #[error("{0} must be zero or greater")]
    NegativeNumber(&'static str),
    /// A string was empty or whitespace-only after trimming.
    #[error("{0} cannot be empty")]
    EmptyString(&'static str),
    /// URL validation failed.
    #[error("{0} must be a valid URL")]
    InvalidUrl(&'static str),
    /// Catch-all for custom validation failures.
    #[error("invalid value: {0}")]
    InvalidValue(String),
}

fn trim_and_require_non_empty<S: Into<String>>(
    value: S,
    field: &'static str,
) -> Result<String, TypeConstraintError> {
    let trimmed = value.into().trim().to_string();
    if trimmed.is_empty() {
        Err(TypeConstraintError::EmptyString(field))
    } else {
        Ok(trimmed)
    }
}

/// Macro to generate lightweight newtypes for positive identifiers.
macro_rules! id_newtype {
    ($name:ident, $doc:expr, $field:expr) => {
        #[doc = $doc]
        #[derive(
            Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord,
        )]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            /// Creates a new identifier ensuring it is greater than zero.
            pub fn new(value: i32) -> Result<Self, TypeConstraintError> {
                if value > 0 {
                    Ok(Self(value))
                } else {
                    Err(TypeConstraintError::NonPositiveId($field))
                }
            }

            /// Returns the raw `i32` backing this identifier.
            pub const fn get(self) -> i32 {
                self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<i32> for $name {
            type Error = TypeConstraintError;

            fn try_from(value: i32) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for i32 {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl PartialEq<i32> for $name {
            fn eq(&self, other: &i32) -> bool {
                self.0 == *other
            }
        }
    };
}

macro_rules! non_empty_string_newtype {
    ($name:ident, $doc:expr, $field:expr) => {
        #[doc = $doc]
        #[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Constructs a trimmed, non-empty value.
            pub fn new<S: Into<String>>(value: S) -> Result<Self, TypeConstraintError> {
                trim_and_require_non_empty(value, $field).map(Self)
            }

            /// Borrow the value as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the wrapper and return the owned string.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;

            fn deref(&self) -> &Self::Target {
                self.as_str()
            }
        }

        impl TryFrom<&str> for $name {
            type Error = TypeConstraintError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

macro_rules! non_negative_i64_newtype {
    ($name:ident, $doc:expr, $field:expr) => {
        #[doc = $doc]
        #[derive(
            Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd,
            Ord,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Constructs a value that must be zero or greater.
            pub fn new(value: i64) -> Result<Self, TypeConstraintError> {
                if value >= 0 {
                    Ok(Self(value))
                } else {
                    Err(TypeConstraintError::NegativeNumber($field))
                }
            }

            /// Returns the raw `i64` value.
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<i64> for $name {
            type Error = TypeConstraintError;

            fn try_from(value: i64) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for i64 {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

id_newtype!(
    TrainingRecordId,
    "Unique identifier for a training record.",
    "training_record_id"
);

non_empty_string_newtype!(
    OperatorId,
    "Identity of the operator running an import or labeling posts.",
    "operator"
);

non_negative_i64_newtype!(
    InteractionCount,
    "Count of likes, comments, views or followers.",
    "count"
);

/// Canonical URL of a social post; the natural key of a training record.
///
/// Canonicalization trims whitespace and drops the query string and fragment
/// so share links of the same post deduplicate to one record.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct PostUrl(String);

impl PostUrl {
    /// Canonicalizes and validates a post URL.
    pub fn new<S: Into<String>>(value: S) -> Result<Self, TypeConstraintError> {
        let trimmed = trim_and_require_non_empty(value, "post url")?;
        let canonical = trimmed
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string();
        if !canonical.as_str().validate_url() {
            return Err(TypeConstraintError::InvalidUrl("post url"));
        }
        Ok(Self(canonical))
    }

    /// Borrow the URL as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path segments of the URL, excluding scheme and host.
    pub fn path_segments(&self) -> impl Iterator<Item = &str> {
        let without_scheme = self
            .0
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(&self.0);
        without_scheme
            .split('/')
            .skip(1)
            .filter(|segment| !segment.is_empty())
    }
}

impl Display for PostUrl {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<&str> for PostUrl {
    type Error = TypeConstraintError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Kind of social post.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PostType {
    Reel,
    Video,
    Image,
    Carousel,
}

impl PostType {
    /// Every post type, in feature-column order.
    pub const ALL: [PostType; 4] = [Self::Reel, Self::Video, Self::Image, Self::Carousel];

    /// String representation used in persistence.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Reel => "reel",
            Self::Video => "video",
            Self::Image => "image",
            Self::Carousel => "carousel",
        }
    }

    /// Whether raw engagement scores for this type need min-max normalization.
    ///
    /// Video-like scores arrive on a 0-100 scale already.
    pub const fn needs_score_normalization(self) -> bool {
        matches!(self, Self::Image | Self::Carousel)
    }
}

impl Display for PostType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for PostType {
    type Error = TypeConstraintError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "reel" => Ok(Self::Reel),
            "video" => Ok(Self::Video),
            "image" => Ok(Self::Image),
            "carousel" => Ok(Self::Carousel),
            other => Err(TypeConstraintError::InvalidValue(format!(
                "post type: {other}"
            ))),
        }
    }
}

impl From<PostType> for String {
    fn from(value: PostType) -> Self {
        value.as_str().to_string()
    }
}

/// Comma-separated multi-valued tag field (theme, tone, dominant color).
///
/// Labels are trimmed and empty items dropped. Comparison stays
/// case-sensitive, so `luxury` and `Luxury` remain distinct labels.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(into = "String", try_from = "String")]
pub struct TagList(Vec<String>);

impl TagList {
    /// Normalizes a raw comma-separated value.
    ///
    /// Returns `None` when nothing survives trimming, so a blank field is
    /// indistinguishable from an absent one.
    pub fn parse(raw: &str) -> Option<Self> {
        let labels = split_labels(raw);
        if labels.is_empty() {
            None
        } else {
            Some(Self(labels))
        }
    }

    /// Labels in their original order.
    pub fn labels(&self) -> &[String] {
        &self.0
    }

    /// Whether `label` is one of the labels, compared exactly.
    pub fn contains(&self, label: &str) -> bool {
        self.0.iter().any(|item| item == label)
    }
}

impl Display for TagList {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.join(", "))
    }
}

impl From<TagList> for String {
    fn from(value: TagList) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for TagList {
    type Error = TypeConstraintError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or(TypeConstraintError::EmptyString("tag list"))
    }
}

/// Split a comma-separated value into trimmed, non-empty labels.
pub fn split_labels(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_ids() {
        let err = TrainingRecordId::new(0).unwrap_err();
        assert_eq!(
            err,
            TypeConstraintError::NonPositiveId("training_record_id")
        );
    }

    #[test]
    fn canonicalizes_post_urls() {
        let url = PostUrl::new("  https://www.instagram.com/p/ABC123/?igsh=xyz#top ").unwrap();
        assert_eq!(url.as_str(), "https://www.instagram.com/p/ABC123/");
        assert_eq!(url.path_segments().collect::<Vec<_>>(), vec!["p", "ABC123"]);
    }

    #[test]
    fn rejects_invalid_post_urls() {
        assert_eq!(
            PostUrl::new("not-a-url").unwrap_err(),
            TypeConstraintError::InvalidUrl("post url")
        );
        assert_eq!(
            PostUrl::new("   ").unwrap_err(),
            TypeConstraintError::EmptyString("post url")
        );
    }

    #[test]
    fn parses_post_types_case_insensitively() {
        assert_eq!(PostType::try_from(" Carousel ").unwrap(), PostType::Carousel);
        assert!(PostType::try_from("story").is_err());
    }

    #[test]
    fn tag_list_trims_and_drops_empty_items() {
        let tags = TagList::parse(" Bridal ,, Luxury ,").unwrap();
        assert_eq!(tags.labels(), ["Bridal", "Luxury"]);
        assert_eq!(tags.to_string(), "Bridal, Luxury");

        let reparsed = TagList::parse(&tags.to_string()).unwrap();
        assert_eq!(reparsed, tags);
    }

    #[test]
    fn blank_tag_list_is_absent() {
        assert_eq!(TagList::parse(" , ,  "), None);
        assert_eq!(TagList::parse(""), None);
    }

    #[test]
    fn tag_list_is_case_sensitive() {
        let tags = TagList::parse("luxury").unwrap();
        assert!(tags.contains("luxury"));
        assert!(!tags.contains("Luxury"));
    }

    #[test]
    fn interaction_count_rejects_negative_numbers() {
        assert_eq!(
            InteractionCount::new(-1).unwrap_err(),
            TypeConstraintError::NegativeNumber("count")
        );
    }
}
