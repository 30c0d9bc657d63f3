//! Customizable areas of a product.

use serde::{Deserialize, Serialize};

use super::customization::CustomizationKind;
use super::id::{AreaId, ProductId};
use super::price::Price;

/// A region of a product the shopper may personalize.
///
/// An area accepts exactly one kind of customization and may carry a
/// surcharge that is added to the unit price whenever it is filled in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomizableArea {
    pub id: AreaId,
    pub product_id: ProductId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: CustomizationKind,
    /// Absent means free.
    pub extra_charge: Option<Price>,
}

impl CustomizableArea {
    /// The surcharge applied when this area is filled in.
    #[must_use]
    pub fn surcharge(&self) -> Price {
        self.extra_charge.unwrap_or(Price::ZERO)
    }
}
