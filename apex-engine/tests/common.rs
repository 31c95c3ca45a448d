use apex_engine::prelude::*;

/// A book sized generously enough that none of the fixture prices below
/// fall outside it.
pub fn small_domain() -> PriceDomain {
    PriceDomain::new(9_000, 4_000)
}

pub fn new_book() -> Book {
    Book::new(small_domain())
}

/// Collects `(price, total_quantity)` for the top `n` levels on `side`,
/// best price first.
pub fn depth_snapshot(book: &Book, side: Side, n: usize) -> Vec<(Price, Qty)> {
    book.depth(side, n).into_iter().map(|lvl| (lvl.price, lvl.total_quantity)).collect()
}

#[test]
fn small_domain_covers_all_fixture_prices() {
    let dom = small_domain();
    assert!(dom.idx(9_000).is_some());
    assert!(dom.idx(10_999).is_some());
}
