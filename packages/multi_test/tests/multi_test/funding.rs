use everopt::contracts::market::events::FundingAccruedEvent;
use everopt::prelude::*;
use everopt_multi_test::market_wrapper::OptionsMarket;
use everopt_multi_test::response::CosmosResponseExt;
use everopt_multi_test::time::TimeJump;
use everopt_multi_test::EveroptApp;

#[test]
fn intrinsic_values() {
    let market = OptionsMarket::new(EveroptApp::new_cell().unwrap()).unwrap();

    market.exec_set_price("2000").unwrap();
    assert_eq!(
        market.query_intrinsic(OptionKind::Put, "2500").unwrap(),
        "500".parse().unwrap()
    );
    assert_eq!(
        market.query_intrinsic(OptionKind::Call, "2500").unwrap(),
        Price::zero()
    );

    market.exec_set_price("3000").unwrap();
    assert_eq!(
        market.query_intrinsic(OptionKind::Call, "2800").unwrap(),
        "200".parse().unwrap()
    );
}

#[test]
fn mark_covers_intrinsic_across_strikes() {
    let market = OptionsMarket::new(EveroptApp::new_cell().unwrap()).unwrap();

    for strike in ["2000", "2500", "2800", "3000", "3200", "3500", "4500"] {
        for kind in [OptionKind::Call, OptionKind::Put] {
            let mark = market.query_mark_price(kind, strike).unwrap();
            let intrinsic = market.query_intrinsic(kind, strike).unwrap();
            assert!(
                mark >= intrinsic,
                "time value negative for {kind} at {strike}: mark {mark}, intrinsic {intrinsic}"
            );
        }
    }
}

#[test]
fn funding_rate_reflects_time_value() {
    let market = OptionsMarket::new(EveroptApp::new_cell().unwrap()).unwrap();

    let fps = market
        .query_funding_per_second(OptionKind::Call, "3000", "1")
        .unwrap();
    // at-the-money time value is a few hundred units per funding period
    assert!(!fps.is_zero());
    assert!(fps < "1".parse().unwrap());

    // funding scales linearly in size, up to atomic truncation
    let fps_double = market
        .query_funding_per_second(OptionKind::Call, "3000", "2")
        .unwrap();
    let doubled = fps.checked_mul_dec(Decimal256::percent(200)).unwrap();
    assert!(doubled.diff(fps_double).into_decimal256() <= Decimal256::raw(10));
}

#[test]
fn accrual_debits_escrow_and_pays_pool() {
    let market = OptionsMarket::new(EveroptApp::new_cell().unwrap()).unwrap();
    let trader = market.clone_trader(0).unwrap();
    let anyone = market.clone_trader(9).unwrap();

    let (id, _) = market
        .exec_buy(&trader, OptionKind::Call, "3000", "1", "100", "700")
        .unwrap();

    market
        .jump_time_with_price(TimeJump::Minutes(30), "3000")
        .unwrap();

    let pending = market.query_pending_funding(id).unwrap();
    assert!(!pending.amount.is_zero());

    let funding_before = market.query_pool_stats().unwrap().funding_received;
    let resp = market.exec_accrue_funding(&anyone, id).unwrap();
    let event =
        FundingAccruedEvent::try_from(&resp.event_first("funding-accrued").unwrap()).unwrap();
    assert_eq!(event.id, id);
    assert_eq!(event.amount, pending.amount);

    let pos = market.query_position(id).unwrap().position;
    assert_eq!(
        pos.funding_balance,
        Collateral::from_decimal256(
            "100"
                .parse::<Collateral>()
                .unwrap()
                .into_decimal256()
                .checked_sub(event.amount.into_decimal256())
                .unwrap()
        )
    );

    let funding_after = market.query_pool_stats().unwrap().funding_received;
    assert_eq!(
        funding_after,
        funding_before.checked_add(event.amount).unwrap()
    );
}

#[test]
fn accrual_without_elapsed_time_is_a_noop() {
    let mut market = OptionsMarket::new(EveroptApp::new_cell().unwrap()).unwrap();
    let trader = market.clone_trader(0).unwrap();

    let (id, _) = market
        .exec_buy(&trader, OptionKind::Call, "3000", "1", "100", "700")
        .unwrap();

    market
        .jump_time_with_price(TimeJump::Minutes(10), "3000")
        .unwrap();

    // freeze the clock so the second accrual lands on the same timestamp
    market.automatic_time_jump_enabled = false;

    let first = market.exec_accrue_funding(&trader, id).unwrap();
    assert!(first.has_wasm_event("funding-accrued"));
    let balance = market.query_position(id).unwrap().position.funding_balance;

    let second = market.exec_accrue_funding(&trader, id).unwrap();
    assert!(!second.has_wasm_event("funding-accrued"));
    assert_eq!(
        market.query_position(id).unwrap().position.funding_balance,
        balance
    );
}

#[test]
fn deposit_tops_up_escrow() {
    let market = OptionsMarket::new(EveroptApp::new_cell().unwrap()).unwrap();
    let trader = market.clone_trader(0).unwrap();

    let (id, _) = market
        .exec_buy(&trader, OptionKind::Call, "3000", "1", "100", "700")
        .unwrap();

    let before = market.query_position(id).unwrap().position.funding_balance;
    let resp = market.exec_deposit_funding(&trader, id, "50").unwrap();
    assert!(resp.has_wasm_event("funding-deposited"));

    let after = market.query_position(id).unwrap().position.funding_balance;
    // the deposit may land after a block of accrual, so compare with room
    // for one block of funding
    let credited = Collateral::from_decimal256(
        after
            .into_decimal256()
            .checked_sub(before.into_decimal256())
            .unwrap(),
    );
    assert!(credited > "49".parse().unwrap());
    assert!(credited <= "50".parse().unwrap());
}

#[test]
fn funding_drains_to_liquidatable() {
    let market = OptionsMarket::new(EveroptApp::new_cell().unwrap()).unwrap();
    let trader = market.clone_trader(0).unwrap();
    let anyone = market.clone_trader(9).unwrap();

    let (id, _) = market
        .exec_buy(&trader, OptionKind::Call, "3000", "1", "100", "700")
        .unwrap();

    // a month with no top-ups: the escrow cannot cover the accrued funding
    market
        .jump_time_with_price(TimeJump::Days(30), "3000")
        .unwrap();
    market.exec_accrue_funding(&anyone, id).unwrap();

    let pos = market.query_position(id).unwrap().position;
    assert!(pos.funding_balance.is_zero());
    assert!(pos.active);

    // a drained escrow is within the grace window of running dry
    assert!(market.query_is_liquidatable(id).unwrap());
}

#[test]
fn grace_period_protects_low_balances() {
    let market = OptionsMarket::new(EveroptApp::new_cell().unwrap()).unwrap();
    let trader = market.clone_trader(0).unwrap();

    let (id, _) = market
        .exec_buy(&trader, OptionKind::Call, "3000", "1", "100", "700")
        .unwrap();

    // stop the funding clock and raise the minimum balance above the
    // escrow: only the slow (a) rule can fire now, and it needs the grace
    // period to pass first
    market
        .exec_config_update(everopt::contracts::market::config::ConfigUpdate {
            max_funding_rate: Some(Decimal256::zero()),
            min_funding_balance: Some("200".parse().unwrap()),
            ..Default::default()
        })
        .unwrap();

    assert!(!market.query_is_liquidatable(id).unwrap());

    market
        .jump_time_with_price(TimeJump::Hours(2), "3000")
        .unwrap();
    assert!(market.query_is_liquidatable(id).unwrap());
}
