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

//! Transaction records and their state machine.
//!
//! Status only moves forward:
//! - [`Initiated`] → [`Captured`] (via confirm)
//! - [`Failed`] and [`Refunded`] are reserved terminal states with no
//!   transition into them on the success path.
//!
//! [`Initiated`]: TransactionStatus::Initiated
//! [`Captured`]: TransactionStatus::Captured
//! [`Failed`]: TransactionStatus::Failed
//! [`Refunded`]: TransactionStatus::Refunded

use crate::base::{BookingId, BuyerId, SellerId, TransactionId};
use crate::currency::Currency;
use crate::error::BillingError;
use crate::pricing::PriceBreakdown;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;

/// Lifecycle status of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Initiated,
    Captured,
    Failed,
    Refunded,
}

impl TransactionStatus {
    /// Whether no further transition can leave this status.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Initiated)
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Initiated => "INITIATED",
            Self::Captured => "CAPTURED",
            Self::Failed => "FAILED",
            Self::Refunded => "REFUNDED",
        };
        write!(f, "{label}")
    }
}

/// Deduplication key for transaction creation.
///
/// Derived deterministically from the booking and the buyer-facing amount, so
/// a retried checkout request maps onto the record it already created.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdempotencyKey {
    booking_id: BookingId,
    display_amount: Decimal,
    display_currency: Currency,
}

impl IdempotencyKey {
    pub fn derive(booking_id: BookingId, display_amount: Decimal, display_currency: &Currency) -> Self {
        Self {
            booking_id,
            display_amount,
            display_currency: display_currency.clone(),
        }
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.booking_id, self.display_amount, self.display_currency)
    }
}

/// Metadata key under which [`Transaction::capture`] records the processor
/// reference passed to confirm.
pub const EXTERNAL_REFERENCE_KEY: &str = "external_reference";

#[derive(Debug)]
struct TransactionData {
    id: TransactionId,
    idempotency_key: IdempotencyKey,
    booking_id: BookingId,
    seller_id: SellerId,
    buyer_id: BuyerId,
    total: Decimal,
    commission: Decimal,
    seller_net: Decimal,
    display_currency: Currency,
    display_amount: Decimal,
    /// Rate at creation time, kept for audit even after the table changes.
    applied_rate: Decimal,
    status: TransactionStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    metadata: BTreeMap<String, String>,
}

/// Persisted transaction record.
///
/// Created only by the ledger, mutated only through confirm, never deleted.
/// Interior locking follows the account pattern used elsewhere in this
/// codebase: a `parking_lot::Mutex` around the data with snapshot accessors.
#[derive(Debug)]
pub struct Transaction {
    inner: Mutex<TransactionData>,
}

impl Transaction {
    pub(crate) fn new(
        key: IdempotencyKey,
        booking_id: BookingId,
        breakdown: &PriceBreakdown,
        buyer_id: BuyerId,
        seller_id: SellerId,
    ) -> Self {
        let now = Utc::now();
        Self {
            inner: Mutex::new(TransactionData {
                id: TransactionId::generate(),
                idempotency_key: key,
                booking_id,
                seller_id,
                buyer_id,
                total: breakdown.total,
                commission: breakdown.commission,
                seller_net: breakdown.seller_net,
                display_currency: breakdown.display_currency.clone(),
                display_amount: breakdown.display_total,
                applied_rate: breakdown.applied_rate,
                status: TransactionStatus::Initiated,
                created_at: now,
                updated_at: now,
                metadata: BTreeMap::new(),
            }),
        }
    }

    pub fn id(&self) -> TransactionId {
        self.inner.lock().id
    }

    pub fn idempotency_key(&self) -> IdempotencyKey {
        self.inner.lock().idempotency_key.clone()
    }

    pub fn booking_id(&self) -> BookingId {
        self.inner.lock().booking_id
    }

    pub fn seller_id(&self) -> SellerId {
        self.inner.lock().seller_id
    }

    pub fn buyer_id(&self) -> BuyerId {
        self.inner.lock().buyer_id
    }

    pub fn total(&self) -> Decimal {
        self.inner.lock().total
    }

    pub fn commission(&self) -> Decimal {
        self.inner.lock().commission
    }

    pub fn seller_net(&self) -> Decimal {
        self.inner.lock().seller_net
    }

    pub fn display_currency(&self) -> Currency {
        self.inner.lock().display_currency.clone()
    }

    pub fn display_amount(&self) -> Decimal {
        self.inner.lock().display_amount
    }

    pub fn applied_rate(&self) -> Decimal {
        self.inner.lock().applied_rate
    }

    pub fn status(&self) -> TransactionStatus {
        self.inner.lock().status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.inner.lock().created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.inner.lock().updated_at
    }

    /// Looks up a metadata value by key.
    pub fn metadata_value(&self, key: &str) -> Option<String> {
        self.inner.lock().metadata.get(key).cloned()
    }

    /// The processor reference recorded at capture time, if any.
    pub fn external_reference(&self) -> Option<String> {
        self.metadata_value(EXTERNAL_REFERENCE_KEY)
    }

    /// Advances the record to [`TransactionStatus::Captured`].
    ///
    /// Capturing an already-captured record is a no-op that leaves every
    /// field untouched. Any other non-initiated status is rejected.
    pub(crate) fn capture(&self, external_reference: &str) -> Result<(), BillingError> {
        let mut data = self.inner.lock();
        match data.status {
            TransactionStatus::Captured => Ok(()),
            TransactionStatus::Initiated => {
                data.status = TransactionStatus::Captured;
                data.metadata
                    .insert(EXTERNAL_REFERENCE_KEY.to_owned(), external_reference.to_owned());
                data.updated_at = Utc::now();
                Ok(())
            }
            from => Err(BillingError::InvalidStateTransition {
                from,
                to: TransactionStatus::Captured,
            }),
        }
    }
}

impl Serialize for Transaction {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let data = self.inner.lock();
        let mut state = serializer.serialize_struct("Transaction", 14)?;
        state.serialize_field("id", &data.id)?;
        state.serialize_field("booking", &data.booking_id)?;
        state.serialize_field("seller", &data.seller_id)?;
        state.serialize_field("buyer", &data.buyer_id)?;
        state.serialize_field("total", &data.total)?;
        state.serialize_field("commission", &data.commission)?;
        state.serialize_field("seller_net", &data.seller_net)?;
        state.serialize_field("display_currency", &data.display_currency)?;
        state.serialize_field("display_amount", &data.display_amount)?;
        state.serialize_field("applied_rate", &data.applied_rate)?;
        state.serialize_field("status", &data.status)?;
        state.serialize_field("created_at", &data.created_at)?;
        state.serialize_field("updated_at", &data.updated_at)?;
        state.serialize_field("metadata", &data.metadata)?;
        state.end()
    }
}
