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

//! Transaction ledger.
//!
//! The [`Ledger`] turns a validated price breakdown into a persisted
//! transaction record and advances it through its lifecycle. It is the only
//! component that creates or mutates transactions.
//!
//! # Guarantees
//!
//! - At most one record per `(booking, display amount, display currency)`
//!   triple; a retried initiate returns the record the first attempt created.
//! - A record is only written after its commission/net split reconciles with
//!   its total within one base-currency unit.
//! - Status moves forward only: `INITIATED` → `CAPTURED`. Confirming an
//!   already-captured record is a no-op, not an error.
//!
//! Both operations are async: a deployment backing the store with a real
//! processor or database suspends here instead of blocking the caller.

use crate::base::{BookingId, BuyerId, SellerId, TransactionId};
use crate::error::BillingError;
use crate::pricing::PriceBreakdown;
use crate::store::{InsertOutcome, TransactionStore};
use crate::transaction::{IdempotencyKey, Transaction};
use rust_decimal::Decimal;
use std::sync::Arc;

/// Booking transaction ledger with an encapsulated in-memory store.
///
/// The store lives for the process lifetime; records are append-only and
/// reachable only through this type.
pub struct Ledger {
    store: TransactionStore,
}

impl Ledger {
    /// Largest rounding drift tolerated between `commission + net` and
    /// `total` at creation time, in base-currency units.
    const SPLIT_TOLERANCE: Decimal = Decimal::ONE;

    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self {
            store: TransactionStore::new(),
        }
    }

    /// Records a transaction for a priced booking.
    ///
    /// The idempotency key is derived from the booking id and the
    /// buyer-facing amount; if a record for that key already exists it is
    /// returned unchanged and nothing is written. Otherwise the breakdown's
    /// split is cross-checked against its total before the record is stored
    /// with status `INITIATED`.
    ///
    /// # Errors
    ///
    /// [`BillingError::IntegrityViolation`] if `commission + seller_net`
    /// drifts from `total` by more than one base unit. No record is created
    /// in that case; it indicates a pricing bug or a tampered breakdown.
    pub async fn initiate(
        &self,
        booking_id: BookingId,
        breakdown: &PriceBreakdown,
        buyer_id: BuyerId,
        seller_id: SellerId,
    ) -> Result<Arc<Transaction>, BillingError> {
        let key = IdempotencyKey::derive(booking_id, breakdown.display_total, &breakdown.display_currency);

        if let Some(existing) = self.store.get_by_key(&key) {
            tracing::debug!(%key, transaction = %existing.id(), "duplicate initiate collapsed onto existing record");
            return Ok(existing);
        }

        let drift = (breakdown.commission + breakdown.seller_net - breakdown.total).abs();
        if drift > Self::SPLIT_TOLERANCE {
            tracing::error!(
                %key,
                total = %breakdown.total,
                commission = %breakdown.commission,
                net = %breakdown.seller_net,
                "price split failed integrity check, rejecting"
            );
            return Err(BillingError::IntegrityViolation {
                total: breakdown.total,
                commission: breakdown.commission,
                net: breakdown.seller_net,
            });
        }

        let transaction = Transaction::new(key.clone(), booking_id, breakdown, buyer_id, seller_id);
        match self.store.insert(transaction) {
            InsertOutcome::Created(record) => {
                tracing::info!(
                    transaction = %record.id(),
                    %key,
                    total = %breakdown.total,
                    "transaction initiated"
                );
                Ok(record)
            }
            InsertOutcome::Existing(record) => {
                // Lost the insert race to a concurrent identical request.
                tracing::debug!(%key, transaction = %record.id(), "concurrent initiate collapsed onto existing record");
                Ok(record)
            }
        }
    }

    /// Confirms a transaction, advancing it to `CAPTURED` and recording the
    /// external processor reference.
    ///
    /// Confirming an already-captured record returns it unchanged.
    ///
    /// # Errors
    ///
    /// - [`BillingError::NotFound`] if no record exists for the id.
    /// - [`BillingError::InvalidStateTransition`] if the record is in a
    ///   terminal state other than `CAPTURED`.
    pub async fn confirm(
        &self,
        transaction_id: TransactionId,
        external_reference: &str,
    ) -> Result<Arc<Transaction>, BillingError> {
        let record = self.store.get(&transaction_id).ok_or(BillingError::NotFound)?;

        match record.capture(external_reference) {
            Ok(()) => {
                tracing::info!(transaction = %transaction_id, "transaction captured");
                Ok(record)
            }
            Err(err) => {
                tracing::warn!(transaction = %transaction_id, %err, "confirm rejected");
                Err(err)
            }
        }
    }

    /// Retrieves a transaction by id.
    pub fn get(&self, transaction_id: &TransactionId) -> Option<Arc<Transaction>> {
        self.store.get(transaction_id)
    }

    /// Number of stored transactions.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.len() == 0
    }

    /// Returns an iterator over all stored transactions.
    ///
    /// Useful for audit exports and reporting.
    pub fn transactions(&self) -> impl Iterator<Item = Arc<Transaction>> + '_ {
        self.store.iter().map(|record| Arc::clone(record.value()))
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}
