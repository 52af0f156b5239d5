use everopt::prelude::*;
use everopt_multi_test::market_wrapper::OptionsMarket;
use everopt_multi_test::response::CosmosResponseExt;
use everopt_multi_test::EveroptApp;
use market::state::guard::{
    check_convexity, check_monotonicity, check_put_call_parity, leaf_hash,
};
use sha2_hash::hash_pair;

#[test]
fn quoted_surface_is_monotonic() {
    let market = OptionsMarket::new(EveroptApp::new_cell().unwrap()).unwrap();

    let strikes = ["2600", "2800", "3000", "3200", "3400"];
    let mut calls = Vec::new();
    let mut puts = Vec::new();
    for strike in strikes {
        let call = market
            .query_quote_buy(OptionKind::Call, strike, "1")
            .unwrap();
        let put = market.query_quote_buy(OptionKind::Put, strike, "1").unwrap();
        calls.push((
            strike.parse::<Price>().unwrap(),
            Price::from_decimal256(call.into_decimal256()),
        ));
        puts.push((
            strike.parse::<Price>().unwrap(),
            Price::from_decimal256(put.into_decimal256()),
        ));
    }

    assert!(check_monotonicity(OptionKind::Call, &calls));
    assert!(check_monotonicity(OptionKind::Put, &puts));
}

#[test]
fn quoted_surface_is_convex() {
    let market = OptionsMarket::new(EveroptApp::new_cell().unwrap()).unwrap();

    for window in [["2700", "2900", "3100"], ["2900", "3100", "3300"]] {
        let quotes: Vec<Price> = window
            .iter()
            .map(|strike| {
                let quote = market
                    .query_quote_buy(OptionKind::Call, strike, "1")
                    .unwrap();
                Price::from_decimal256(quote.into_decimal256())
            })
            .collect();
        assert!(check_convexity(
            (
                window[0].parse().unwrap(),
                window[1].parse().unwrap(),
                window[2].parse().unwrap(),
            ),
            (quotes[0], quotes[1], quotes[2]),
        )
        .unwrap());
    }
}

#[test]
fn marks_honor_put_call_parity_shape() {
    let market = OptionsMarket::new(EveroptApp::new_cell().unwrap()).unwrap();

    // under the symmetric starting distribution the at-the-money call and
    // put marks sit close to parity against spot
    let call = market.query_mark_price(OptionKind::Call, "3000").unwrap();
    let put = market.query_mark_price(OptionKind::Put, "3000").unwrap();
    let spot = market.query_spot_price().unwrap();

    // generous tolerance: the distribution is discrete and premium-scaled
    let tolerance = "100".parse().unwrap();
    assert!(check_put_call_parity(call, put, spot, "3000".parse().unwrap(), tolerance).unwrap());
}

#[test]
fn price_bounds_default_open() {
    let market = OptionsMarket::new(EveroptApp::new_cell().unwrap()).unwrap();

    // with no root committed, any bound verifies
    let ok: bool = market
        .query(&MarketQueryMsg::VerifyPriceBound {
            kind: OptionKind::Call,
            strike: "3000".parse().unwrap(),
            bid: "1".parse().unwrap(),
            ask: "2".parse().unwrap(),
            proof: vec![],
        })
        .unwrap();
    assert!(ok);
}

#[test]
fn price_bounds_round_trip() {
    let market = OptionsMarket::new(EveroptApp::new_cell().unwrap()).unwrap();

    let strike: Price = "3000".parse().unwrap();
    let leaf_call = leaf_hash(
        OptionKind::Call,
        strike,
        "200".parse().unwrap(),
        "220".parse().unwrap(),
    );
    let leaf_put = leaf_hash(
        OptionKind::Put,
        strike,
        "190".parse().unwrap(),
        "205".parse().unwrap(),
    );
    let root = hex::encode(hash_pair(leaf_call, leaf_put));

    let resp = market.exec_set_price_bounds(Some(root)).unwrap();
    assert!(resp.has_wasm_event("price-bounds-updated"));

    let verify = |bid: &str, ask: &str, proof: Vec<String>| -> bool {
        market
            .query(&MarketQueryMsg::VerifyPriceBound {
                kind: OptionKind::Call,
                strike,
                bid: bid.parse().unwrap(),
                ask: ask.parse().unwrap(),
                proof,
            })
            .unwrap()
    };

    assert!(verify("200", "220", vec![hex::encode(leaf_put)]));
    // a forged bound fails against the committed root
    assert!(!verify("100", "220", vec![hex::encode(leaf_put)]));

    // clearing the root reopens everything
    market.exec_set_price_bounds(None).unwrap();
    assert!(verify("100", "220", vec![]));
}

mod sha2_hash {
    // mirror of the market's sorted-pair hashing, for building roots in
    // tests without reaching into contract internals
    use sha2::{Digest, Sha256};

    pub fn hash_pair(a: [u8; 32], b: [u8; 32]) -> [u8; 32] {
        let mut hasher = Sha256::new();
        if a <= b {
            hasher.update(a);
            hasher.update(b);
        } else {
            hasher.update(b);
            hasher.update(a);
        }
        hasher.finalize().into()
    }
}
