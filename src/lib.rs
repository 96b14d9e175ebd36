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

//! # Booking Engine
//!
//! This library is the financial core of a rental marketplace: it prices a
//! stay into a full breakdown, splits the total into a seller payout and a
//! platform commission, converts it into a buyer-facing currency at the
//! official rate, and records the resulting transaction exactly once even
//! under retried requests.
//!
//! ## Core Components
//!
//! - [`RateService`]: Fixed official conversion rates, conversion both ways,
//!   and display formatting
//! - [`PricingEngine`]: Pure stay pricing into a [`PriceBreakdown`]
//! - [`Ledger`]: Idempotent transaction creation and the
//!   `INITIATED → CAPTURED` state machine
//! - [`BillingError`]: Error types for pricing and ledger failures
//!
//! ## Example
//!
//! ```
//! use booking_engine_rs::{
//!     CommissionSchedule, Currency, Listing, ListingId, PricingEngine, RateService, SellerClass,
//!     SellerId,
//! };
//! use chrono::NaiveDate;
//! use rust_decimal_macros::dec;
//!
//! let pricing = PricingEngine::new(RateService::official(), CommissionSchedule::default());
//! let listing = Listing {
//!     id: ListingId(1),
//!     seller_id: SellerId(7),
//!     seller_class: SellerClass::Individual,
//!     nightly_price: dec!(3000),
//!     options: vec![],
//! };
//!
//! // Price a three-night stay in the base currency.
//! let start = NaiveDate::from_ymd_opt(2025, 11, 3).unwrap();
//! let end = NaiveDate::from_ymd_opt(2025, 11, 6).unwrap();
//! let breakdown = pricing
//!     .price(&listing, start, end, &[], &Currency::new("JPY"))
//!     .unwrap();
//!
//! assert_eq!(breakdown.total, dec!(9000));
//! assert_eq!(breakdown.commission + breakdown.seller_net, breakdown.total);
//! ```
//!
//! The priced breakdown is then handed to [`Ledger::initiate`], and a later
//! processor callback drives [`Ledger::confirm`]; both are async and safe to
//! retry.
//!
//! ## Thread Safety
//!
//! The ledger handles concurrent access to the transaction store; duplicate
//! creation attempts for the same idempotency key collapse onto a single
//! record even when they race.

mod base;
mod currency;
pub mod error;
mod ledger;
pub mod listing;
mod pricing;
mod store;
mod transaction;

pub use base::{BookingId, BuyerId, ListingId, OptionId, SellerId, TransactionId};
pub use currency::{Currency, Rate, RateService};
pub use error::BillingError;
pub use ledger::Ledger;
pub use listing::{ChargeMode, Listing, RentalOption, SellerClass};
pub use pricing::{CommissionSchedule, PriceBreakdown, PricingEngine, parse_stay, stay_nights};
pub use transaction::{EXTERNAL_REFERENCE_KEY, IdempotencyKey, Transaction, TransactionStatus};
