mod common;

use apex_engine::prelude::*;
use common::{depth_snapshot, new_book};

#[test]
fn market_order_consumes_best_price_first_and_discards_residual() {
    let mut book = new_book();
    let mut sink = NullTradeListener;
    book.add_order(1, Side::Sell, 10_000, 5, OrderType::Limit, TimeInForce::Gtc, 1, &mut sink);
    book.add_order(2, Side::Sell, 10_001, 5, OrderType::Limit, TimeInForce::Gtc, 2, &mut sink);

    let outcome = book.add_order(3, Side::Buy, 0, 12, OrderType::Market, TimeInForce::Ioc, 3, &mut sink);

    assert_eq!(outcome, AddOutcome::Done { filled: 10, resting: 0 }, "2 unfilled units are discarded, not rested");
    assert!(depth_snapshot(&book, Side::Sell, 5).is_empty());
}

#[test]
fn ioc_residual_is_discarded_not_rested() {
    let mut book = new_book();
    let mut sink = NullTradeListener;
    book.add_order(1, Side::Sell, 10_000, 5, OrderType::Limit, TimeInForce::Gtc, 1, &mut sink);
    let outcome = book.add_order(2, Side::Buy, 10_000, 8, OrderType::Limit, TimeInForce::Ioc, 2, &mut sink);

    assert_eq!(outcome, AddOutcome::Done { filled: 5, resting: 0 });
    assert!(depth_snapshot(&book, Side::Buy, 5).is_empty());
}

#[test]
fn fok_rejects_whole_order_when_liquidity_insufficient() {
    let mut book = new_book();
    let mut sink = NullTradeListener;
    book.add_order(1, Side::Sell, 10_000, 5, OrderType::Limit, TimeInForce::Gtc, 1, &mut sink);
    let outcome = book.add_order(2, Side::Buy, 10_000, 8, OrderType::Limit, TimeInForce::Fok, 2, &mut sink);

    assert_eq!(outcome, AddOutcome::Killed);
    assert_eq!(depth_snapshot(&book, Side::Sell, 5), vec![(10_000, 5)], "book must be untouched by a killed FOK");
}

#[test]
fn fok_fills_completely_when_liquidity_spans_two_levels() {
    let mut book = new_book();
    let mut sink = NullTradeListener;
    book.add_order(1, Side::Sell, 10_000, 5, OrderType::Limit, TimeInForce::Gtc, 1, &mut sink);
    book.add_order(2, Side::Sell, 10_001, 5, OrderType::Limit, TimeInForce::Gtc, 2, &mut sink);
    let outcome = book.add_order(3, Side::Buy, 10_001, 8, OrderType::Limit, TimeInForce::Fok, 3, &mut sink);

    assert_eq!(outcome, AddOutcome::Done { filled: 8, resting: 0 });
}

#[test]
fn out_of_range_price_is_rejected_without_mutating_the_book() {
    let mut book = new_book();
    let mut sink = NullTradeListener;
    let outcome = book.add_order(1, Side::Buy, 1, 10, OrderType::Limit, TimeInForce::Gtc, 1, &mut sink);

    assert_eq!(outcome, AddOutcome::OutOfRange);
    assert!(depth_snapshot(&book, Side::Buy, 5).is_empty());
}
