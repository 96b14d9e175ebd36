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

//! Official currency rates, conversion, and display formatting.
//!
//! All stored amounts are in the base currency. Display currencies exist only
//! as computed values derived through the fixed official rate table; they are
//! never the system of record.

use crate::error::BillingError;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// ISO-style currency code, normalized to uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Currency(String);

impl Currency {
    pub fn new(code: impl AsRef<str>) -> Self {
        Self(code.as_ref().trim().to_uppercase())
    }

    pub fn code(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Official rate for one display currency.
///
/// `per_unit` is the number of base-currency units per one unit of the
/// display currency. The base currency's own rate is defined as 1.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Rate {
    pub per_unit: Decimal,
    pub as_of: NaiveDate,
}

/// Fixed per-deployment table of official conversion rates.
///
/// Rates are static; there is no network lookup. Conversion is plain
/// division/multiplication by the stored rate with no rounding; rounding is
/// deferred to [`RateService::format`].
#[derive(Debug, Clone)]
pub struct RateService {
    base: Currency,
    rates: HashMap<Currency, Rate>,
}

impl RateService {
    /// Fractional digits shown for display currencies other than the base.
    const DISPLAY_MINOR_UNITS: u32 = 2;

    /// Builds a rate table from configuration.
    ///
    /// The base currency is always supported with a rate of 1; entries for
    /// it in `entries` are ignored.
    pub fn with_rates(base: Currency, entries: impl IntoIterator<Item = (Currency, Rate)>) -> Self {
        let mut rates: HashMap<Currency, Rate> = entries
            .into_iter()
            .filter(|(currency, _)| *currency != base)
            .collect();
        let table_as_of = rates
            .values()
            .map(|rate| rate.as_of)
            .max()
            .unwrap_or(NaiveDate::MIN);
        rates.insert(
            base.clone(),
            Rate {
                per_unit: Decimal::ONE,
                as_of: table_as_of,
            },
        );
        Self { base, rates }
    }

    /// The official table shipped with the current deployment.
    pub fn official() -> Self {
        let as_of = NaiveDate::from_ymd_opt(2025, 10, 1).unwrap();
        let base = Currency::new("JPY");
        Self::with_rates(
            base,
            [
                (
                    Currency::new("USD"),
                    Rate {
                        per_unit: Decimal::new(1465, 1),
                        as_of,
                    },
                ),
                (
                    Currency::new("EUR"),
                    Rate {
                        per_unit: Decimal::new(15875, 2),
                        as_of,
                    },
                ),
                (
                    Currency::new("GBP"),
                    Rate {
                        per_unit: Decimal::new(1854, 1),
                        as_of,
                    },
                ),
            ],
        )
    }

    /// The currency of record for all stored amounts.
    pub fn base(&self) -> &Currency {
        &self.base
    }

    pub fn supports(&self, currency: &Currency) -> bool {
        self.rates.contains_key(currency)
    }

    /// Looks up the official rate for a supported currency.
    ///
    /// # Errors
    ///
    /// [`BillingError::UnsupportedCurrency`] if the code is not in the table.
    pub fn rate(&self, currency: &Currency) -> Result<Rate, BillingError> {
        self.rates
            .get(currency)
            .copied()
            .ok_or_else(|| BillingError::UnsupportedCurrency(currency.code().to_owned()))
    }

    /// Converts a base-currency amount into the display currency, unrounded.
    pub fn to_display(&self, base_amount: Decimal, currency: &Currency) -> Result<Decimal, BillingError> {
        let rate = self.rate(currency)?;
        Ok(base_amount / rate.per_unit)
    }

    /// Converts a display-currency amount back into base units, unrounded.
    pub fn to_base(&self, display_amount: Decimal, currency: &Currency) -> Result<Decimal, BillingError> {
        let rate = self.rate(currency)?;
        Ok(display_amount * rate.per_unit)
    }

    /// Formats an amount in the given currency for display.
    ///
    /// The base currency renders with no fractional digits, every other
    /// supported currency with two. A missing amount is coerced to zero
    /// rather than rejected.
    ///
    /// # Errors
    ///
    /// [`BillingError::UnsupportedCurrency`] if the code is not in the table.
    pub fn format(&self, amount: Option<Decimal>, currency: &Currency) -> Result<String, BillingError> {
        if !self.supports(currency) {
            return Err(BillingError::UnsupportedCurrency(currency.code().to_owned()));
        }
        let amount = amount.unwrap_or(Decimal::ZERO);
        let digits = self.minor_units(currency);
        Ok(format!("{} {}", render_amount(amount, digits), currency))
    }

    /// Fractional digits shown for the given currency.
    pub fn minor_units(&self, currency: &Currency) -> u32 {
        if *currency == self.base {
            0
        } else {
            Self::DISPLAY_MINOR_UNITS
        }
    }
}

impl Default for RateService {
    fn default() -> Self {
        Self::official()
    }
}

/// Renders a decimal with a fixed number of fractional digits and
/// thousands-grouped integer part.
fn render_amount(amount: Decimal, digits: u32) -> String {
    let rounded = amount.round_dp(digits);
    let plain = format!("{:.*}", digits as usize, rounded);
    let (int_part, frac_part) = match plain.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (plain.as_str(), None),
    };
    let (sign, int_digits) = match int_part.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", int_part),
    };

    let mut grouped = String::with_capacity(int_digits.len() + int_digits.len() / 3);
    for (i, ch) in int_digits.chars().enumerate() {
        if i > 0 && (int_digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match frac_part {
        Some(frac) => format!("{sign}{grouped}.{frac}"),
        None => format!("{sign}{grouped}"),
    }
}
