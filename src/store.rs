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

//! Thread-safe transaction store with idempotency-key deduplication.
//!
//! Combines a map keyed by transaction id with a unique index on the
//! idempotency key. The duplicate check and the insert go through the
//! [`DashMap`] entry API, so two concurrent creations for the same key can
//! never both succeed.

use crate::base::TransactionId;
use crate::transaction::{IdempotencyKey, Transaction};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;

/// Result of an insert attempt.
#[derive(Debug)]
pub(crate) enum InsertOutcome {
    /// The record was stored; no transaction existed for its key.
    Created(Arc<Transaction>),
    /// A transaction with the same idempotency key already existed.
    Existing(Arc<Transaction>),
}

#[derive(Debug, Default)]
pub(crate) struct TransactionStore {
    /// Records indexed by generated transaction id.
    by_id: DashMap<TransactionId, Arc<Transaction>>,

    /// Unique index by idempotency key for duplicate collapsing.
    by_key: DashMap<IdempotencyKey, Arc<Transaction>>,
}

impl TransactionStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn get(&self, id: &TransactionId) -> Option<Arc<Transaction>> {
        self.by_id.get(id).map(|record| Arc::clone(record.value()))
    }

    pub(crate) fn get_by_key(&self, key: &IdempotencyKey) -> Option<Arc<Transaction>> {
        self.by_key.get(key).map(|record| Arc::clone(record.value()))
    }

    /// Stores a transaction unless one already exists for its idempotency key.
    ///
    /// The entry API holds the key's shard for the whole check-and-insert, so
    /// a concurrent insert for the same key observes either nothing or the
    /// fully stored record, never a half-inserted one.
    pub(crate) fn insert(&self, transaction: Transaction) -> InsertOutcome {
        let key = transaction.idempotency_key();
        match self.by_key.entry(key) {
            Entry::Occupied(entry) => InsertOutcome::Existing(Arc::clone(entry.get())),
            Entry::Vacant(entry) => {
                let record = Arc::new(transaction);
                // The id map is written before the key index becomes visible.
                self.by_id.insert(record.id(), Arc::clone(&record));
                entry.insert(Arc::clone(&record));
                InsertOutcome::Created(record)
            }
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.by_id.len()
    }

    pub(crate) fn iter(
        &self,
    ) -> impl Iterator<Item = dashmap::mapref::multiple::RefMulti<'_, TransactionId, Arc<Transaction>>> {
        self.by_id.iter()
    }
}
