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

//! Error types for pricing and ledger operations.

use crate::transaction::TransactionStatus;
use rust_decimal::Decimal;
use thiserror::Error;

/// Billing engine errors.
///
/// Validation errors (`UnsupportedCurrency`, `InvalidDateRange`) are
/// recoverable at the call boundary. `IntegrityViolation` is fatal for the
/// request: it means the breakdown handed to the ledger does not add up and
/// no record was written.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BillingError {
    /// Currency code is not in the official rate table
    #[error("unsupported currency: {0}")]
    UnsupportedCurrency(String),

    /// Stay dates could not be parsed
    #[error("invalid date range")]
    InvalidDateRange,

    /// Commission and seller net do not add up to the total
    #[error("price split does not add up: commission {commission} + net {net} != total {total}")]
    IntegrityViolation {
        total: Decimal,
        commission: Decimal,
        net: Decimal,
    },

    /// Referenced transaction ID does not exist
    #[error("transaction not found")]
    NotFound,

    /// Requested status change is not allowed by the state machine
    #[error("invalid state transition: {from} -> {to}")]
    InvalidStateTransition {
        from: TransactionStatus,
        to: TransactionStatus,
    },
}

#[cfg(test)]
mod tests {
    use super::BillingError;
    use crate::transaction::TransactionStatus;
    use rust_decimal_macros::dec;

    #[test]
    fn error_display_messages() {
        assert_eq!(
            BillingError::UnsupportedCurrency("XXX".into()).to_string(),
            "unsupported currency: XXX"
        );
        assert_eq!(BillingError::InvalidDateRange.to_string(), "invalid date range");
        assert_eq!(
            BillingError::IntegrityViolation {
                total: dec!(11000),
                commission: dec!(2150),
                net: dec!(8000),
            }
            .to_string(),
            "price split does not add up: commission 2150 + net 8000 != total 11000"
        );
        assert_eq!(BillingError::NotFound.to_string(), "transaction not found");
        assert_eq!(
            BillingError::InvalidStateTransition {
                from: TransactionStatus::Refunded,
                to: TransactionStatus::Captured,
            }
            .to_string(),
            "invalid state transition: REFUNDED -> CAPTURED"
        );
    }

    #[test]
    fn errors_are_cloneable() {
        let error = BillingError::NotFound;
        let cloned = error.clone();
        assert_eq!(error, cloned);
    }
}
