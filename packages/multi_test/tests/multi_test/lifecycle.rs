use crate::assert_err_id;
use everopt::contracts::market::events::OptionBoughtEvent;
use everopt::prelude::*;
use everopt_multi_test::market_wrapper::OptionsMarket;
use everopt_multi_test::response::CosmosResponseExt;
use everopt_multi_test::time::TimeJump;
use everopt_multi_test::EveroptApp;

fn dec(s: &str) -> Decimal256 {
    s.parse().unwrap()
}

#[test]
fn buy_collects_premium_and_mints() {
    let market = OptionsMarket::new(EveroptApp::new_cell().unwrap()).unwrap();
    let trader = market.clone_trader(0).unwrap();

    let balance_before = market.query_quote_balance(&trader).unwrap();
    let premium_before = market.query_pool_stats().unwrap().premium_received;

    let (id, resp) = market
        .exec_buy(&trader, OptionKind::Call, "2800", "1", "100", "700")
        .unwrap();
    let event =
        OptionBoughtEvent::try_from(&resp.event_first("option-bought").unwrap()).unwrap();
    assert_eq!(event.id, id);
    assert_eq!(event.owner, trader);
    assert_eq!(event.prefund, "100".parse().unwrap());

    // the trader paid exactly premium plus prefund; the excess came back
    let balance_after = market.query_quote_balance(&trader).unwrap();
    let spent = balance_before.into_decimal256() - balance_after.into_decimal256();
    assert_eq!(
        spent,
        event.premium.into_decimal256() + event.prefund.into_decimal256()
    );

    // the premium landed in the pool
    let premium_after = market.query_pool_stats().unwrap().premium_received;
    assert_eq!(
        premium_after,
        premium_before.checked_add(event.premium).unwrap()
    );

    // the position token tracks the size
    let token = market
        .query_position_token_balance(&trader, OptionKind::Call, "2800")
        .unwrap();
    assert_eq!(token.amount, dec("1"));

    let pos = market.query_position(id).unwrap().position;
    assert!(pos.active);
    assert_eq!(pos.size, dec("1"));
    assert_eq!(pos.strike, "2800".parse().unwrap());

    let owned = market.query_positions(&trader).unwrap();
    assert_eq!(owned.positions.len(), 1);
    assert_eq!(owned.positions[0].id, id);
}

#[test]
fn buy_rejects_bad_inputs() {
    let market = OptionsMarket::new(EveroptApp::new_cell().unwrap()).unwrap();
    let trader = market.clone_trader(0).unwrap();

    let err = market
        .exec_buy(&trader, OptionKind::Call, "0", "1", "100", "700")
        .unwrap_err();
    assert_err_id(err, "invalid_strike");

    let err = market
        .exec_buy(&trader, OptionKind::Call, "3000", "0", "100", "700")
        .unwrap_err();
    assert_err_id(err, "invalid_size");

    // prefund below the minimum funding balance
    let err = market
        .exec_buy(&trader, OptionKind::Call, "3000", "1", "0.5", "700")
        .unwrap_err();
    assert_err_id(err, "insufficient_funding");

    // attached funds not covering premium plus prefund
    let err = market
        .exec_buy(&trader, OptionKind::Call, "3000", "1", "100", "101")
        .unwrap_err();
    assert_err_id(err, "missing_funds");
}

#[test]
fn exercise_pays_intrinsic_and_refunds_escrow() {
    let market = OptionsMarket::new(EveroptApp::new_cell().unwrap()).unwrap();
    let trader = market.clone_trader(0).unwrap();

    let (id, buy_resp) = market
        .exec_buy(&trader, OptionKind::Call, "2800", "1", "100", "700")
        .unwrap();
    let bought =
        OptionBoughtEvent::try_from(&buy_resp.event_first("option-bought").unwrap()).unwrap();

    let balance_before = market.query_quote_balance(&trader).unwrap();
    let losses_before = market.query_pool_stats().unwrap().losses_paid;

    let resp = market.exec_exercise(&trader, id).unwrap();
    let payout: Collateral = resp
        .event_first_attr("option-exercised", "payout")
        .unwrap()
        .parse()
        .unwrap();
    let refund: Collateral = resp
        .event_first_attr("option-exercised", "refund")
        .unwrap()
        .parse()
        .unwrap();

    // spot 3000 against strike 2800 on one unit
    assert_eq!(payout, "200".parse().unwrap());
    // the escrow came back, less one block of funding
    assert!(refund > "99".parse().unwrap());
    assert!(refund <= bought.prefund);

    let balance_after = market.query_quote_balance(&trader).unwrap();
    let received = balance_after.into_decimal256() - balance_before.into_decimal256();
    assert_eq!(
        received,
        payout.into_decimal256() + refund.into_decimal256()
    );

    // the pool booked the payout as a loss
    assert_eq!(
        market.query_pool_stats().unwrap().losses_paid,
        losses_before.checked_add(payout).unwrap()
    );

    // terminal state: token burned, position closed, no resurrection
    let token = market
        .query_position_token_balance(&trader, OptionKind::Call, "2800")
        .unwrap();
    assert_eq!(token.amount, Decimal256::zero());
    assert!(!market.query_position(id).unwrap().position.active);

    let err = market.exec_exercise(&trader, id).unwrap_err();
    assert_err_id(err, "position_inactive");
    let err = market.exec_sell(&trader, id, "1").unwrap_err();
    assert_err_id(err, "position_inactive");
    let err = market.exec_deposit_funding(&trader, id, "10").unwrap_err();
    assert_err_id(err, "position_inactive");
}

#[test]
fn exercise_requires_moneyness() {
    let market = OptionsMarket::new(EveroptApp::new_cell().unwrap()).unwrap();
    let trader = market.clone_trader(0).unwrap();

    let (id, _) = market
        .exec_buy(&trader, OptionKind::Call, "3200", "1", "100", "700")
        .unwrap();

    let err = market.exec_exercise(&trader, id).unwrap_err();
    assert_err_id(err, "not_in_the_money");
}

#[test]
fn partial_sell_keeps_position_active() {
    let market = OptionsMarket::new(EveroptApp::new_cell().unwrap()).unwrap();
    let trader = market.clone_trader(0).unwrap();

    let (id, _) = market
        .exec_buy(&trader, OptionKind::Call, "3000", "1", "100", "700")
        .unwrap();

    let balance_before = market.query_quote_balance(&trader).unwrap();
    let resp = market.exec_sell(&trader, id, "0.4").unwrap();
    let revenue: Collateral = resp
        .event_first_attr("option-sold", "revenue")
        .unwrap()
        .parse()
        .unwrap();
    assert!(!revenue.is_zero());

    let pos = market.query_position(id).unwrap().position;
    assert!(pos.active);
    assert_eq!(pos.size, dec("0.6"));

    let token = market
        .query_position_token_balance(&trader, OptionKind::Call, "3000")
        .unwrap();
    assert_eq!(token.amount, dec("0.6"));

    let balance_after = market.query_quote_balance(&trader).unwrap();
    assert_eq!(
        balance_after.into_decimal256() - balance_before.into_decimal256(),
        revenue.into_decimal256()
    );

    // selling more than remains is rejected
    let err = market.exec_sell(&trader, id, "0.7").unwrap_err();
    assert_err_id(err, "invalid_size");
}

#[test]
fn full_sell_closes_and_returns_escrow() {
    let market = OptionsMarket::new(EveroptApp::new_cell().unwrap()).unwrap();
    let trader = market.clone_trader(0).unwrap();

    let (id, _) = market
        .exec_buy(&trader, OptionKind::Call, "3000", "1", "100", "700")
        .unwrap();

    let resp = market.exec_sell(&trader, id, "1").unwrap();
    assert_eq!(
        resp.event_first_attr("option-sold", "closed").unwrap(),
        "true"
    );

    let pos = market.query_position(id).unwrap().position;
    assert!(!pos.active);
    assert!(pos.funding_balance.is_zero());

    let err = market.exec_sell(&trader, id, "1").unwrap_err();
    assert_err_id(err, "position_inactive");
}

#[test]
fn positions_are_owner_gated() {
    let market = OptionsMarket::new(EveroptApp::new_cell().unwrap()).unwrap();
    let trader = market.clone_trader(0).unwrap();
    let stranger = market.clone_trader(1).unwrap();

    let (id, _) = market
        .exec_buy(&trader, OptionKind::Call, "3000", "1", "100", "700")
        .unwrap();

    let err = market.exec_sell(&stranger, id, "1").unwrap_err();
    assert_err_id(err, "auth");
    let err = market.exec_exercise(&stranger, id).unwrap_err();
    assert_err_id(err, "auth");
    let err = market.exec_deposit_funding(&stranger, id, "10").unwrap_err();
    assert_err_id(err, "auth");
}

#[test]
fn liquidation_rewards_the_caller() {
    let market = OptionsMarket::new(EveroptApp::new_cell().unwrap()).unwrap();
    let trader = market.clone_trader(0).unwrap();
    let liquidator = market.clone_trader(7).unwrap();

    // a minimal escrow drains within the grace window straight away
    let (id, _) = market
        .exec_buy(&trader, OptionKind::Call, "3000", "1", "1", "700")
        .unwrap();
    assert!(market.query_is_liquidatable(id).unwrap());

    let balance_before = market.query_quote_balance(&liquidator).unwrap();
    let resp = market.exec_liquidate(&liquidator, id).unwrap();
    let reward: Collateral = resp
        .event_first_attr("position-liquidated", "reward")
        .unwrap()
        .parse()
        .unwrap();

    // remaining escrow after one block of funding
    assert!(!reward.is_zero());
    assert!(reward < "1".parse().unwrap());

    let balance_after = market.query_quote_balance(&liquidator).unwrap();
    assert_eq!(
        balance_after.into_decimal256() - balance_before.into_decimal256(),
        reward.into_decimal256()
    );

    let pos = market.query_position(id).unwrap().position;
    assert!(!pos.active);

    let err = market.exec_liquidate(&liquidator, id).unwrap_err();
    assert_err_id(err, "position_inactive");
}

#[test]
fn liquidation_requires_the_policy() {
    let market = OptionsMarket::new(EveroptApp::new_cell().unwrap()).unwrap();
    let trader = market.clone_trader(0).unwrap();
    let liquidator = market.clone_trader(7).unwrap();

    let (id, _) = market
        .exec_buy(&trader, OptionKind::Call, "3000", "1", "5000", "6000")
        .unwrap();

    assert!(!market.query_is_liquidatable(id).unwrap());
    let err = market.exec_liquidate(&liquidator, id).unwrap_err();
    assert_err_id(err, "not_liquidatable");

    // still healthy after a funded stretch of time
    market
        .jump_time_with_price(TimeJump::Hours(12), "3000")
        .unwrap();
    market.exec_accrue_funding(&liquidator, id).unwrap();
    assert!(!market.query_is_liquidatable(id).unwrap());
}
