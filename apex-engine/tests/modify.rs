mod common;

use apex_engine::prelude::*;
use common::{depth_snapshot, new_book};

#[test]
fn size_down_keeps_time_priority() {
    let mut book = new_book();
    let mut sink = NullTradeListener;
    book.add_order(1, Side::Buy, 10_000, 10, OrderType::Limit, TimeInForce::Gtc, 1, &mut sink);
    book.add_order(2, Side::Buy, 10_000, 10, OrderType::Limit, TimeInForce::Gtc, 2, &mut sink);

    assert!(book.modify_order(1, 4));
    assert_eq!(depth_snapshot(&book, Side::Buy, 5), vec![(10_000, 14)]);

    let mut trades = Vec::new();
    book.add_order(3, Side::Sell, 10_000, 4, OrderType::Limit, TimeInForce::Gtc, 3, &mut |t: Trade| {
        trades.push(t)
    });

    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].buy_order_id, 1, "order 1 kept its place at the front of the queue");
}

#[test]
fn size_up_keeps_time_priority() {
    let mut book = new_book();
    let mut sink = NullTradeListener;
    book.add_order(1, Side::Buy, 10_000, 5, OrderType::Limit, TimeInForce::Gtc, 1, &mut sink);
    book.add_order(2, Side::Buy, 10_000, 5, OrderType::Limit, TimeInForce::Gtc, 2, &mut sink);

    assert!(book.modify_order(1, 20));
    assert_eq!(depth_snapshot(&book, Side::Buy, 5), vec![(10_000, 25)]);

    let mut trades = Vec::new();
    book.add_order(3, Side::Sell, 10_000, 5, OrderType::Limit, TimeInForce::Gtc, 3, &mut |t: Trade| {
        trades.push(t)
    });

    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].buy_order_id, 1, "order 1 kept its place despite growing in size");
}

#[test]
fn modify_to_zero_cancels() {
    let mut book = new_book();
    let mut sink = NullTradeListener;
    book.add_order(1, Side::Buy, 10_000, 10, OrderType::Limit, TimeInForce::Gtc, 1, &mut sink);

    assert!(book.modify_order(1, 0));
    assert!(depth_snapshot(&book, Side::Buy, 5).is_empty());
    assert!(!book.cancel_order(1), "order should already be gone");
}

#[test]
fn modify_unknown_id_returns_false() {
    let mut book = new_book();
    assert!(!book.modify_order(999, 5));
}
