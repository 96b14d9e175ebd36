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

//! Stay pricing.
//!
//! [`PricingEngine::price`] is a pure function: for a fixed listing, stay,
//! option selection, and display currency it always produces the same
//! [`PriceBreakdown`]. All arithmetic is in base-currency units; the display
//! amount is derived last through the official rate table.

use crate::base::OptionId;
use crate::currency::{Currency, RateService};
use crate::error::BillingError;
use crate::listing::{ChargeMode, Listing, SellerClass};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Commission rates applied to a transaction total.
///
/// These are deployment configuration, injected into the engine rather than
/// inlined at the call sites.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CommissionSchedule {
    /// Percentage rate for non-professional sellers.
    pub individual_rate: Decimal,
    /// Percentage rate for professional sellers.
    pub professional_rate: Decimal,
    /// Flat per-transaction fee added on top of the percentage, in base units.
    pub flat_fee: Decimal,
}

impl CommissionSchedule {
    pub fn rate_for(&self, class: SellerClass) -> Decimal {
        match class {
            SellerClass::Individual => self.individual_rate,
            SellerClass::Professional => self.professional_rate,
        }
    }
}

impl Default for CommissionSchedule {
    fn default() -> Self {
        Self {
            individual_rate: dec!(0.15),
            professional_rate: dec!(0.10),
            flat_fee: dec!(500),
        }
    }
}

/// Full price breakdown for one stay.
///
/// Produced fresh on every pricing request and never persisted on its own;
/// the ledger stores the fields it validated. All amounts are base-currency
/// units except `display_total`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceBreakdown {
    /// Stay length in billing units, floored at 1.
    pub nights: i64,
    pub base_cost: Decimal,
    pub options_cost: Decimal,
    pub total: Decimal,
    pub commission: Decimal,
    pub seller_net: Decimal,
    pub display_currency: Currency,
    /// Base-currency units per one display unit, captured for audit.
    pub applied_rate: Decimal,
    pub rate_as_of: NaiveDate,
    /// Total re-expressed in the display currency, unrounded.
    pub display_total: Decimal,
}

/// Prices listings into full breakdowns.
pub struct PricingEngine {
    rates: RateService,
    commission: CommissionSchedule,
}

impl PricingEngine {
    pub fn new(rates: RateService, commission: CommissionSchedule) -> Self {
        Self { rates, commission }
    }

    /// The rate table this engine prices against.
    pub fn rates(&self) -> &RateService {
        &self.rates
    }

    /// Prices a stay on `listing` from `start` to `end` with the selected
    /// add-ons, converting the total into `display_currency`.
    ///
    /// A same-day or inverted range bills for one night; ordering validation
    /// belongs to the caller. Selected option ids not configured on the
    /// listing are ignored.
    ///
    /// # Errors
    ///
    /// [`BillingError::UnsupportedCurrency`] if `display_currency` is not in
    /// the rate table.
    pub fn price(
        &self,
        listing: &Listing,
        start: NaiveDate,
        end: NaiveDate,
        selected: &[OptionId],
        display_currency: &Currency,
    ) -> Result<PriceBreakdown, BillingError> {
        let nights = stay_nights(start, end);
        let night_count = Decimal::from(nights);

        let base_cost = listing.nightly_price * night_count;

        let mut options_cost = Decimal::ZERO;
        for id in selected {
            let Some(option) = listing.option(*id) else {
                continue;
            };
            options_cost += match option.mode {
                ChargeMode::Fixed => option.price,
                ChargeMode::PerDay => option.price * night_count,
            };
        }

        let total = base_cost + options_cost;
        let commission = total * self.commission.rate_for(listing.seller_class) + self.commission.flat_fee;
        let seller_net = total - commission;

        let rate = self.rates.rate(display_currency)?;

        Ok(PriceBreakdown {
            nights,
            base_cost,
            options_cost,
            total,
            commission,
            seller_net,
            display_currency: display_currency.clone(),
            applied_rate: rate.per_unit,
            rate_as_of: rate.as_of,
            display_total: total / rate.per_unit,
        })
    }
}

/// Stay length in nights, floored at one billing unit.
///
/// A same-day or inverted range still bills for one night; this is the
/// intended floor, not a validation failure.
pub fn stay_nights(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days().max(1)
}

/// Parses the ISO `YYYY-MM-DD` stay dates the checkout form submits.
///
/// # Errors
///
/// [`BillingError::InvalidDateRange`] if either date is malformed.
pub fn parse_stay(start: &str, end: &str) -> Result<(NaiveDate, NaiveDate), BillingError> {
    let start = NaiveDate::parse_from_str(start, "%Y-%m-%d").map_err(|_| BillingError::InvalidDateRange)?;
    let end = NaiveDate::parse_from_str(end, "%Y-%m-%d").map_err(|_| BillingError::InvalidDateRange)?;
    Ok((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::{ListingId, SellerId};
    use crate::listing::RentalOption;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn cabin(class: SellerClass) -> Listing {
        Listing {
            id: ListingId(1),
            seller_id: SellerId(10),
            seller_class: class,
            nightly_price: dec!(3000),
            options: vec![
                RentalOption {
                    id: OptionId(1),
                    label: "End-of-stay cleaning".into(),
                    price: dec!(2000),
                    mode: ChargeMode::Fixed,
                },
                RentalOption {
                    id: OptionId(2),
                    label: "Firewood".into(),
                    price: dec!(400),
                    mode: ChargeMode::PerDay,
                },
            ],
        }
    }

    fn engine() -> PricingEngine {
        PricingEngine::new(RateService::official(), CommissionSchedule::default())
    }

    #[test]
    fn stay_length_counts_whole_nights() {
        assert_eq!(stay_nights(date(2025, 11, 3), date(2025, 11, 6)), 3);
    }

    #[test]
    fn same_day_range_bills_one_night() {
        assert_eq!(stay_nights(date(2025, 11, 3), date(2025, 11, 3)), 1);
    }

    #[test]
    fn inverted_range_bills_one_night() {
        assert_eq!(stay_nights(date(2025, 11, 6), date(2025, 11, 3)), 1);
    }

    #[test]
    fn base_cost_scales_with_nights() {
        let breakdown = engine()
            .price(&cabin(SellerClass::Individual), date(2025, 11, 3), date(2025, 11, 6), &[], &Currency::new("JPY"))
            .unwrap();
        assert_eq!(breakdown.nights, 3);
        assert_eq!(breakdown.base_cost, dec!(9000));
        assert_eq!(breakdown.options_cost, Decimal::ZERO);
    }

    #[test]
    fn fixed_option_charges_once() {
        let breakdown = engine()
            .price(
                &cabin(SellerClass::Individual),
                date(2025, 11, 3),
                date(2025, 11, 6),
                &[OptionId(1)],
                &Currency::new("JPY"),
            )
            .unwrap();
        assert_eq!(breakdown.options_cost, dec!(2000));
    }

    #[test]
    fn per_day_option_scales_with_nights() {
        let breakdown = engine()
            .price(
                &cabin(SellerClass::Individual),
                date(2025, 11, 3),
                date(2025, 11, 6),
                &[OptionId(2)],
                &Currency::new("JPY"),
            )
            .unwrap();
        assert_eq!(breakdown.options_cost, dec!(1200));
    }

    #[test]
    fn unknown_option_ids_are_ignored() {
        let breakdown = engine()
            .price(
                &cabin(SellerClass::Individual),
                date(2025, 11, 3),
                date(2025, 11, 6),
                &[OptionId(99), OptionId(1)],
                &Currency::new("JPY"),
            )
            .unwrap();
        assert_eq!(breakdown.options_cost, dec!(2000));
    }

    #[test]
    fn split_always_adds_up() {
        let breakdown = engine()
            .price(
                &cabin(SellerClass::Professional),
                date(2025, 11, 3),
                date(2025, 11, 8),
                &[OptionId(1), OptionId(2)],
                &Currency::new("USD"),
            )
            .unwrap();
        assert_eq!(breakdown.commission + breakdown.seller_net, breakdown.total);
    }

    #[test]
    fn professional_commission_is_lower_for_equal_totals() {
        let individual = engine()
            .price(&cabin(SellerClass::Individual), date(2025, 11, 3), date(2025, 11, 6), &[], &Currency::new("JPY"))
            .unwrap();
        let professional = engine()
            .price(&cabin(SellerClass::Professional), date(2025, 11, 3), date(2025, 11, 6), &[], &Currency::new("JPY"))
            .unwrap();
        assert_eq!(individual.total, professional.total);
        assert!(professional.commission < individual.commission);
    }

    #[test]
    fn unsupported_display_currency_is_rejected() {
        let result = engine().price(
            &cabin(SellerClass::Individual),
            date(2025, 11, 3),
            date(2025, 11, 6),
            &[],
            &Currency::new("XXX"),
        );
        assert_eq!(result, Err(BillingError::UnsupportedCurrency("XXX".into())));
    }

    #[test]
    fn parse_stay_accepts_iso_dates() {
        let (start, end) = parse_stay("2025-11-03", "2025-11-06").unwrap();
        assert_eq!(start, date(2025, 11, 3));
        assert_eq!(end, date(2025, 11, 6));
    }

    #[test]
    fn parse_stay_rejects_malformed_input() {
        assert_eq!(parse_stay("03/11/2025", "2025-11-06"), Err(BillingError::InvalidDateRange));
        assert_eq!(parse_stay("2025-11-03", "next week"), Err(BillingError::InvalidDateRange));
    }

    #[test]
    fn default_schedule_carries_official_constants() {
        let schedule = CommissionSchedule::default();
        assert_eq!(schedule.rate_for(SellerClass::Individual), dec!(0.15));
        assert_eq!(schedule.rate_for(SellerClass::Professional), dec!(0.10));
        assert_eq!(schedule.flat_fee, dec!(500));
    }
}
