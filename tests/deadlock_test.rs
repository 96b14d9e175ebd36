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

//! Deadlock detection tests using parking_lot's built-in deadlock detector.
//!
//! The ledger layers a per-record mutex inside two concurrent maps (the id
//! map and the idempotency-key index). These tests hammer that layering from
//! many threads while a monitor thread watches the lock graph for cycles.

use booking_engine_rs::{
    BookingId, BuyerId, CommissionSchedule, Currency, Ledger, Listing, ListingId, PriceBreakdown,
    PricingEngine, RateService, SellerClass, SellerId,
};
use chrono::NaiveDate;
use parking_lot::deadlock;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

fn make_breakdown() -> PriceBreakdown {
    let engine = PricingEngine::new(RateService::official(), CommissionSchedule::default());
    let listing = Listing {
        id: ListingId(1),
        seller_id: SellerId(10),
        seller_class: SellerClass::Individual,
        nightly_price: dec!(3000),
        options: vec![],
    };
    engine
        .price(
            &listing,
            NaiveDate::from_ymd_opt(2025, 11, 3).unwrap(),
            NaiveDate::from_ymd_opt(2025, 11, 6).unwrap(),
            &[],
            &Currency::new("JPY"),
        )
        .unwrap()
}

/// Runs `workers` threads against the shared ledger while a monitor thread
/// polls the deadlock detector. Panics if a cycle is ever observed.
fn run_with_monitor(workers: Vec<thread::JoinHandle<()>>) {
    let stop = Arc::new(AtomicBool::new(false));
    let detected = Arc::new(AtomicBool::new(false));

    let monitor = {
        let stop = Arc::clone(&stop);
        let detected = Arc::clone(&detected);
        thread::spawn(move || {
            while !stop.load(Ordering::SeqCst) {
                if !deadlock::check_deadlock().is_empty() {
                    detected.store(true, Ordering::SeqCst);
                    return;
                }
                thread::sleep(Duration::from_millis(20));
            }
        })
    };

    for worker in workers {
        worker.join().expect("worker thread panicked");
    }
    stop.store(true, Ordering::SeqCst);
    monitor.join().expect("monitor thread panicked");

    assert!(!detected.load(Ordering::SeqCst), "deadlock detected in lock graph");
}

#[test]
fn concurrent_initiates_do_not_deadlock() {
    let ledger = Arc::new(Ledger::new());
    let breakdown = make_breakdown();

    let workers = (0..8u64)
        .map(|worker| {
            let ledger = Arc::clone(&ledger);
            let breakdown = breakdown.clone();
            thread::spawn(move || {
                for i in 0..200u64 {
                    // Half the bookings collide across workers, half are unique.
                    let booking = if i % 2 == 0 { i } else { worker * 1000 + i };
                    futures::executor::block_on(ledger.initiate(
                        BookingId(booking),
                        &breakdown,
                        BuyerId(2),
                        SellerId(10),
                    ))
                    .unwrap();
                }
            })
        })
        .collect();

    run_with_monitor(workers);
}

#[test]
fn interleaved_initiate_and_confirm_do_not_deadlock() {
    let ledger = Arc::new(Ledger::new());
    let breakdown = make_breakdown();

    let workers = (0..8u64)
        .map(|worker| {
            let ledger = Arc::clone(&ledger);
            let breakdown = breakdown.clone();
            thread::spawn(move || {
                for i in 0..100u64 {
                    let booking = i % 10;
                    let tx = futures::executor::block_on(ledger.initiate(
                        BookingId(booking),
                        &breakdown,
                        BuyerId(worker),
                        SellerId(10),
                    ))
                    .unwrap();
                    futures::executor::block_on(ledger.confirm(tx.id(), "psp_load"))
                        .unwrap();
                }
            })
        })
        .collect();

    run_with_monitor(workers);
}
