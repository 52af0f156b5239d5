use crate::assert_err_id;
use everopt::prelude::*;
use everopt_multi_test::market_wrapper::OptionsMarket;
use everopt_multi_test::response::CosmosResponseExt;
use everopt_multi_test::EveroptApp;

#[test]
fn grid_layout() {
    let market = OptionsMarket::new(EveroptApp::new_cell().unwrap()).unwrap();

    let buckets = market.query_buckets().unwrap();
    assert_eq!(buckets.num_regular, 64);
    assert_eq!(buckets.lower_edge, "1400".parse().unwrap());
    assert_eq!(buckets.upper_edge, "4600".parse().unwrap());
    assert_eq!(buckets.midpoints.len(), 66);
    assert_eq!(buckets.midpoints[0], "700".parse().unwrap());
    assert_eq!(buckets.midpoints[65], "4650".parse().unwrap());
}

#[test]
fn boundary_indexing() {
    let market = OptionsMarket::new(EveroptApp::new_cell().unwrap()).unwrap();

    assert_eq!(market.query_bucket_index("1399.999999").unwrap(), 0);
    assert_eq!(market.query_bucket_index("1400").unwrap(), 1);
    assert_eq!(market.query_bucket_index("4599.999999").unwrap(), 64);
    assert_eq!(market.query_bucket_index("4600").unwrap(), 65);
    assert_eq!(market.query_bucket_index("4600.000001").unwrap(), 65);
}

#[test]
fn bucket_query_rejects_out_of_range() {
    let market = OptionsMarket::new(EveroptApp::new_cell().unwrap()).unwrap();

    let err = market
        .query::<everopt::contracts::market::entry::BucketResp>(&MarketQueryMsg::Bucket {
            index: 66,
        })
        .unwrap_err();
    assert!(format!("{err:?}").contains("out of range"), "{err:?}");
}

#[test]
fn recenter_requires_drift() {
    let market = OptionsMarket::new(EveroptApp::new_cell().unwrap()).unwrap();
    let anyone = market.clone_trader(0).unwrap();

    assert!(!market
        .query::<bool>(&MarketQueryMsg::NeedsRebalance {})
        .unwrap());
    let err = market.exec_recenter(&anyone, "3400").unwrap_err();
    assert_err_id(err, "invalid_config");

    // push spot 13% away from the grid center
    market.exec_set_price("3400").unwrap();
    assert!(market
        .query::<bool>(&MarketQueryMsg::NeedsRebalance {})
        .unwrap());

    let resp = market.exec_recenter(&anyone, "3400").unwrap();
    assert!(resp.has_wasm_event("recentered"));

    let buckets = market.query_buckets().unwrap();
    assert_eq!(buckets.center_price, "3400".parse().unwrap());
    // width and bucket count are invariant
    assert_eq!(buckets.bucket_width, "50".parse().unwrap());
    assert_eq!(buckets.num_regular, 64);
    assert_eq!(buckets.lower_edge, "1800".parse().unwrap());
    assert_eq!(buckets.upper_edge, "5000".parse().unwrap());
}

#[test]
fn recenter_rejects_center_below_half_span() {
    let market = OptionsMarket::new(EveroptApp::new_cell().unwrap()).unwrap();
    let anyone = market.clone_trader(0).unwrap();

    // drift condition holds, but the new center would push the lower edge
    // to or below zero
    market.exec_set_price("2000").unwrap();
    let err = market.exec_recenter(&anyone, "1600").unwrap_err();
    assert_err_id(err, "invalid_config");

    let resp = market.exec_recenter(&anyone, "2000").unwrap();
    assert!(resp.has_wasm_event("recentered"));
}

#[test]
fn needs_rebalance_swallows_feed_failures() {
    let market = OptionsMarket::new(EveroptApp::new_cell().unwrap()).unwrap();

    // poison the feed with a carried-over answer
    let now = market.now();
    market
        .exec_set_round_data(everopt::contracts::feed::RoundDataResp {
            round_id: 100,
            answer: cosmwasm_std::Int128::new(340_000_000_000),
            started_at: now,
            updated_at: now,
            answered_in_round: 99,
        })
        .unwrap();

    // the spot query itself faults...
    let err = market.query_spot_price().unwrap_err();
    assert!(format!("{err:?}").contains("stale_round"), "{err:?}");

    // ...but the rebalance probe reports false instead of failing
    assert!(!market
        .query::<bool>(&MarketQueryMsg::NeedsRebalance {})
        .unwrap());
}
