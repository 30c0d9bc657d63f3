//! Product customizations.
//!
//! A [`Customization`] is the value a shopper put into one customizable area:
//! some text, a color, or an image URL. Customizations travel as a
//! [`CustomizationSet`], which is always held in canonical form (sorted by
//! area, blank values removed) so that two sets describing the same
//! personalization compare equal no matter what order they were submitted in.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use url::Url;

use super::id::AreaId;

/// Maximum length of a text customization, in characters.
pub const MAX_TEXT_LENGTH: usize = 200;

/// The kind of input a customizable area accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "customization_kind", rename_all = "UPPERCASE")
)]
#[serde(rename_all = "UPPERCASE")]
pub enum CustomizationKind {
    Text,
    Image,
    Color,
}

impl std::fmt::Display for CustomizationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "TEXT"),
            Self::Image => write!(f, "IMAGE"),
            Self::Color => write!(f, "COLOR"),
        }
    }
}

/// Errors raised while validating customizations.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CustomizationError {
    /// The same area was customized more than once.
    #[error("area {area_id} is customized more than once")]
    DuplicateArea { area_id: AreaId },

    /// The area does not belong to the product.
    #[error("area {area_id} does not exist on this product")]
    UnknownArea { area_id: AreaId },

    /// The customization kind does not match the area kind.
    #[error("area {area_id} expects a {expected} customization, got {found}")]
    KindMismatch {
        area_id: AreaId,
        expected: CustomizationKind,
        found: CustomizationKind,
    },

    /// Color values must be `#RGB` or `#RRGGBB`.
    #[error("invalid color value: {0}")]
    InvalidColor(String),

    /// Image values must be an http(s) URL or a site-relative path.
    #[error("invalid image reference: {0}")]
    InvalidImage(String),

    /// Text is longer than [`MAX_TEXT_LENGTH`].
    #[error("text customization must be at most {max} characters")]
    TextTooLong { max: usize },
}

/// A single customization, tagged by kind.
///
/// Wire format: `{"type": "TEXT", "areaId": "...", "value": "Hi"}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "UPPERCASE", rename_all_fields = "camelCase")]
pub enum Customization {
    Text { area_id: AreaId, value: String },
    Color { area_id: AreaId, value: String },
    Image { area_id: AreaId, value: String },
}

impl Customization {
    /// The area this customization fills in.
    #[must_use]
    pub const fn area_id(&self) -> AreaId {
        match self {
            Self::Text { area_id, .. } | Self::Color { area_id, .. } | Self::Image { area_id, .. } => {
                *area_id
            }
        }
    }

    /// The kind of this customization.
    #[must_use]
    pub const fn kind(&self) -> CustomizationKind {
        match self {
            Self::Text { .. } => CustomizationKind::Text,
            Self::Color { .. } => CustomizationKind::Color,
            Self::Image { .. } => CustomizationKind::Image,
        }
    }

    /// The raw value.
    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            Self::Text { value, .. } | Self::Color { value, .. } | Self::Image { value, .. } => {
                value
            }
        }
    }

    /// Whether the shopper left this area empty.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.value().trim().is_empty()
    }

    /// Check the value against the rules for its kind.
    ///
    /// Blank values are always accepted; they contribute nothing.
    ///
    /// # Errors
    ///
    /// Returns the matching `CustomizationError` for a malformed color, image
    /// reference, or overlong text.
    pub fn validate_value(&self) -> Result<(), CustomizationError> {
        if self.is_blank() {
            return Ok(());
        }
        match self {
            Self::Text { value, .. } => {
                if value.chars().count() > MAX_TEXT_LENGTH {
                    return Err(CustomizationError::TextTooLong {
                        max: MAX_TEXT_LENGTH,
                    });
                }
            }
            Self::Color { value, .. } => {
                if !is_hex_color(value) {
                    return Err(CustomizationError::InvalidColor(value.clone()));
                }
            }
            Self::Image { value, .. } => {
                if !is_image_reference(value) {
                    return Err(CustomizationError::InvalidImage(value.clone()));
                }
            }
        }
        Ok(())
    }
}

fn is_hex_color(value: &str) -> bool {
    value.strip_prefix('#').is_some_and(|hex| {
        matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit())
    })
}

fn is_image_reference(value: &str) -> bool {
    if value.starts_with('/') && !value.starts_with("//") {
        return !value.chars().any(char::is_whitespace);
    }
    Url::parse(value).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
}

/// A canonical set of customizations.
///
/// Construction validates every value, rejects an area appearing twice,
/// drops blank entries and sorts by area ID. Equality is therefore
/// order-independent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Customization>", into = "Vec<Customization>")]
pub struct CustomizationSet(Vec<Customization>);

impl CustomizationSet {
    /// An empty set (plain, un-customized product).
    #[must_use]
    pub const fn empty() -> Self {
        Self(Vec::new())
    }

    /// Build a canonical set.
    ///
    /// Blank entries are dropped first, so a blank and a filled-in value for
    /// the same area keep the filled-in one.
    ///
    /// # Errors
    ///
    /// Returns `CustomizationError::DuplicateArea` if an area has more than
    /// one non-blank value, or a value error from
    /// [`Customization::validate_value`].
    pub fn new(customizations: Vec<Customization>) -> Result<Self, CustomizationError> {
        let mut kept: Vec<Customization> = customizations
            .into_iter()
            .filter(|c| !c.is_blank())
            .collect();

        let mut seen = HashSet::with_capacity(kept.len());
        for customization in &kept {
            if !seen.insert(customization.area_id()) {
                return Err(CustomizationError::DuplicateArea {
                    area_id: customization.area_id(),
                });
            }
            customization.validate_value()?;
        }

        kept.sort_by_key(Customization::area_id);
        Ok(Self(kept))
    }

    /// Stable string form used as a uniqueness key in storage.
    ///
    /// Two sets produce the same key if and only if they are equal.
    #[must_use]
    pub fn canonical_key(&self) -> String {
        // Serializing a Vec of plain enums with string fields cannot fail.
        serde_json::to_string(&self.0).unwrap_or_default()
    }

    /// Iterate over the customizations in canonical order.
    pub fn iter(&self) -> std::slice::Iter<'_, Customization> {
        self.0.iter()
    }

    /// Number of non-blank customizations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing was customized.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consume into the canonical list.
    #[must_use]
    pub fn into_inner(self) -> Vec<Customization> {
        self.0
    }
}

impl TryFrom<Vec<Customization>> for CustomizationSet {
    type Error = CustomizationError;

    fn try_from(customizations: Vec<Customization>) -> Result<Self, Self::Error> {
        Self::new(customizations)
    }
}

impl From<CustomizationSet> for Vec<Customization> {
    fn from(set: CustomizationSet) -> Self {
        set.0
    }
}

impl<'a> IntoIterator for &'a CustomizationSet {
    type Item = &'a Customization;
    type IntoIter = std::slice::Iter<'a, Customization>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
