use apex_engine::prelude::*;

/// A book wide enough to hold every price this bench pack inserts.
pub fn bench_domain() -> PriceDomain {
    PriceDomain::new(1, 50_000)
}

pub fn new_bench_book() -> Book {
    Book::new(bench_domain())
}
