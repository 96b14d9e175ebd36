// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Listing and rental add-on types.
//!
//! This is the pricing-relevant projection of a storefront listing: the
//! per-night price, the seller's account class, and the configured add-on
//! options. Presentation fields (title, photos, location) live with the
//! catalog, not here.

use crate::base::{ListingId, OptionId, SellerId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How a rental option is charged over a stay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargeMode {
    /// Applied once per stay regardless of length.
    Fixed,
    /// Multiplied by the stay length in nights.
    PerDay,
}

/// An add-on attached to a listing's rental configuration.
///
/// Immutable and owned by the listing; the price is in base-currency units.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RentalOption {
    pub id: OptionId,
    pub label: String,
    pub price: Decimal,
    pub mode: ChargeMode,
}

/// Commission class of the account behind a listing.
///
/// Non-professional sellers carry a higher commission percentage than
/// professional sellers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SellerClass {
    Individual,
    Professional,
}

/// A rental listing as seen by the pricing engine.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Listing {
    pub id: ListingId,
    pub seller_id: SellerId,
    pub seller_class: SellerClass,
    /// Price per billing unit (night) in base-currency units.
    pub nightly_price: Decimal,
    pub options: Vec<RentalOption>,
}

impl Listing {
    /// Looks up a configured option by id.
    pub fn option(&self, id: OptionId) -> Option<&RentalOption> {
        self.options.iter().find(|option| option.id == id)
    }
}
