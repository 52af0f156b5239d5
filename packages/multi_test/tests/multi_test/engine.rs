use crate::assert_err_id;
use everopt::prelude::*;
use everopt_multi_test::market_wrapper::OptionsMarket;
use everopt_multi_test::response::CosmosResponseExt;
use everopt_multi_test::EveroptApp;

#[test]
fn quotes_are_positive_and_decrease_with_strike() {
    let market = OptionsMarket::new(EveroptApp::new_cell().unwrap()).unwrap();

    let at_the_money = market
        .query_quote_buy(OptionKind::Call, "3000", "1")
        .unwrap();
    let out_of_the_money = market
        .query_quote_buy(OptionKind::Call, "4000", "1")
        .unwrap();

    assert!(!at_the_money.is_zero());
    assert!(out_of_the_money < at_the_money);

    // sanity on the magnitude: the expected payoff of an at-the-money call
    // under the uniform starting distribution is a few hundred quote units
    assert!(at_the_money > "300".parse().unwrap());
    assert!(at_the_money < "700".parse().unwrap());
}

#[test]
fn risk_neutral_distribution_sums_to_one() {
    let market = OptionsMarket::new(EveroptApp::new_cell().unwrap()).unwrap();

    let prices = market.query_risk_neutral_prices().unwrap();
    assert_eq!(prices.len(), 66);

    let total = prices
        .iter()
        .fold(Decimal256::zero(), |acc, p| acc + *p);
    let diff = if total > Decimal256::one() {
        total - Decimal256::one()
    } else {
        Decimal256::one() - total
    };
    assert!(diff < Decimal256::percent(1), "sum was {total}");
}

#[test]
fn multi_trade_cost_walk() {
    let market = OptionsMarket::new(EveroptApp::new_cell().unwrap()).unwrap();
    let trader = market.clone_trader(0).unwrap();

    let mut last_cost = market.query_engine_state().unwrap().cost;
    for strike in ["2800", "3000", "3200", "3500"] {
        market
            .exec_buy(&trader, OptionKind::Call, strike, "0.1", "10", "200")
            .unwrap();

        let state = market.query_engine_state().unwrap();
        assert!(state.cost > last_cost, "cost did not rise at {strike}");
        let max_share = state.shares.iter().copied().max().unwrap();
        assert!(state.cost > max_share, "bounded loss broken at {strike}");
        last_cost = state.cost;
    }
}

#[test]
fn buy_sell_round_trip_restores_cost() {
    let market = OptionsMarket::new(EveroptApp::new_cell().unwrap()).unwrap();
    let trader = market.clone_trader(0).unwrap();

    let initial = market.query_engine_state().unwrap().cost;

    let (id, _) = market
        .exec_buy(&trader, OptionKind::Call, "3000", "1", "100", "700")
        .unwrap();
    let after_buy = market.query_engine_state().unwrap().cost;
    assert!(after_buy > initial);

    market.exec_sell(&trader, id, "1").unwrap();
    let after_sell = market.query_engine_state().unwrap().cost;
    assert!(after_sell < after_buy);

    let tolerance: Number = "0.000001".parse().unwrap();
    assert!(
        after_sell.approx_eq_eps(initial, tolerance),
        "round trip ended at {after_sell}, expected about {initial}"
    );
}

#[test]
fn engine_initialization_is_one_shot() {
    let market = OptionsMarket::new(EveroptApp::new_cell().unwrap()).unwrap();

    let err = market
        .exec(
            &market.owner.clone(),
            &MarketExecuteMsg::InitializeEngine {
                subsidy: "5000".parse().unwrap(),
                sigma: None,
            },
            &[],
        )
        .unwrap_err();
    assert_err_id(err, "already_initialized");
}

#[test]
fn oversized_buy_is_rejected() {
    let market = OptionsMarket::new(EveroptApp::new_cell().unwrap()).unwrap();
    let trader = market.clone_trader(0).unwrap();

    // a deep in-the-money call at twenty times unit size would push the
    // share vector past the subsidy-backed cost
    let err = market
        .exec_buy(&trader, OptionKind::Call, "1500", "20", "10", "1000")
        .unwrap_err();
    assert_err_id(err, "insufficient_liquidity");
}

#[test]
fn verify_and_set_cost_accepts_honest_witness() {
    let market = OptionsMarket::new(EveroptApp::new_cell().unwrap()).unwrap();
    let trader = market.clone_trader(0).unwrap();

    market
        .exec_buy(&trader, OptionKind::Call, "3000", "0.5", "10", "400")
        .unwrap();

    let state = market.query_engine_state().unwrap();
    let resp = market
        .exec_verify_and_set_cost(&trader, state.cost, state.shares)
        .unwrap();
    assert!(resp.has_wasm_event("cost-updated"));

    assert_eq!(market.query_engine_state().unwrap().cost, state.cost);
}

#[test]
fn verify_and_set_cost_rejects_bad_residual() {
    let market = OptionsMarket::new(EveroptApp::new_cell().unwrap()).unwrap();
    let trader = market.clone_trader(0).unwrap();

    let state = market.query_engine_state().unwrap();
    let off_by_plenty = state.cost.checked_add(Number::from(1000u64)).unwrap();
    let err = market
        .exec_verify_and_set_cost(&trader, off_by_plenty, state.shares)
        .unwrap_err();
    assert_err_id(err, "invalid_verification");

    // state is untouched
    assert_eq!(market.query_engine_state().unwrap().cost, state.cost);
}

#[test]
fn verify_and_set_cost_rejects_mismatched_shares() {
    let market = OptionsMarket::new(EveroptApp::new_cell().unwrap()).unwrap();
    let trader = market.clone_trader(0).unwrap();

    let state = market.query_engine_state().unwrap();
    let mut shares = state.shares;
    shares[0] = shares[0].checked_add(Number::from(1u64)).unwrap();
    let err = market
        .exec_verify_and_set_cost(&trader, state.cost, shares)
        .unwrap_err();
    assert_err_id(err, "quantity_mismatch");
}
