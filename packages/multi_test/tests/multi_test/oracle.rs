use crate::assert_err_id;
use cosmwasm_std::Int128;
use everopt::contracts::feed::RoundDataResp;
use everopt::contracts::market::config::ConfigUpdate;
use everopt::prelude::*;
use everopt_multi_test::market_wrapper::OptionsMarket;
use everopt_multi_test::time::TimeJump;
use everopt_multi_test::EveroptApp;

#[test]
fn spot_scales_feed_decimals_to_wad() {
    let market = OptionsMarket::new(EveroptApp::new_cell().unwrap()).unwrap();

    market.exec_set_price("3123.45").unwrap();
    assert_eq!(market.query_spot_price().unwrap(), "3123.45".parse().unwrap());
}

#[test]
fn stale_rounds_are_rejected() {
    let market = OptionsMarket::new(EveroptApp::new_cell().unwrap()).unwrap();

    // two hours without a round exceeds the default one hour staleness
    market.jump_time(TimeJump::Hours(2)).unwrap();
    let err = market.query_spot_price().unwrap_err();
    assert!(format!("{err:?}").contains("stale_price"), "{err:?}");

    // a fresh round clears it up
    market.exec_set_price("3000").unwrap();
    market.query_spot_price().unwrap();
}

#[test]
fn carried_over_answers_are_rejected() {
    let market = OptionsMarket::new(EveroptApp::new_cell().unwrap()).unwrap();

    let now = market.now();
    market
        .exec_set_round_data(RoundDataResp {
            round_id: 50,
            answer: Int128::new(300_000_000_000),
            started_at: now,
            updated_at: now,
            answered_in_round: 49,
        })
        .unwrap();

    let err = market.query_spot_price().unwrap_err();
    assert!(format!("{err:?}").contains("stale_round"), "{err:?}");
}

#[test]
fn non_positive_answers_are_rejected() {
    let market = OptionsMarket::new(EveroptApp::new_cell().unwrap()).unwrap();

    let now = market.now();
    market
        .exec_set_round_data(RoundDataResp {
            round_id: 50,
            answer: Int128::new(-1),
            started_at: now,
            updated_at: now,
            answered_in_round: 50,
        })
        .unwrap();

    let err = market.query_spot_price().unwrap_err();
    assert!(format!("{err:?}").contains("invalid_price"), "{err:?}");
}

#[test]
fn oracle_failures_roll_back_operations() {
    let market = OptionsMarket::new(EveroptApp::new_cell().unwrap()).unwrap();
    let trader = market.clone_trader(0).unwrap();

    let (id, _) = market
        .exec_buy(&trader, OptionKind::Call, "2800", "1", "100", "700")
        .unwrap();

    // stale feed: the exercise fails wholesale and the position survives
    market.jump_time(TimeJump::Hours(2)).unwrap();
    let err = market.exec_exercise(&trader, id).unwrap_err();
    assert_err_id(err, "stale_price");

    let pos = market.query_position(id).unwrap().position;
    assert!(pos.active);
    assert_eq!(pos.funding_balance, "100".parse().unwrap());
}

#[test]
fn config_updates_validate_ranges() {
    let market = OptionsMarket::new(EveroptApp::new_cell().unwrap()).unwrap();

    let err = market
        .exec_config_update(ConfigUpdate {
            oracle_staleness_seconds: Some(30),
            ..Default::default()
        })
        .unwrap_err();
    assert_err_id(err, "invalid_config");

    let err = market
        .exec_config_update(ConfigUpdate {
            premium_factor: Some("0.5".parse().unwrap()),
            ..Default::default()
        })
        .unwrap_err();
    assert_err_id(err, "invalid_config");

    let err = market
        .exec_config_update(ConfigUpdate {
            funding_period_seconds: Some(0),
            ..Default::default()
        })
        .unwrap_err();
    assert_err_id(err, "invalid_config");

    market
        .exec_config_update(ConfigUpdate {
            oracle_staleness_seconds: Some(600),
            premium_factor: Some("3".parse().unwrap()),
            ..Default::default()
        })
        .unwrap();
    let config: everopt::contracts::market::config::Config =
        market.query(&MarketQueryMsg::Config {}).unwrap();
    assert_eq!(config.oracle_staleness_seconds, 600);
    assert_eq!(config.premium_factor, "3".parse::<cosmwasm_std::Decimal256>().unwrap());
}

#[test]
fn config_updates_are_owner_gated() {
    let market = OptionsMarket::new(EveroptApp::new_cell().unwrap()).unwrap();
    let stranger = market.clone_trader(0).unwrap();

    let err = market
        .exec(
            &stranger,
            &MarketExecuteMsg::Owner(
                everopt::contracts::market::entry::ExecuteOwnerMsg::ConfigUpdate {
                    update: ConfigUpdate::default(),
                },
            ),
            &[],
        )
        .unwrap_err();
    assert_err_id(err, "auth");
}

#[test]
fn pause_blocks_trading() {
    let market = OptionsMarket::new(EveroptApp::new_cell().unwrap()).unwrap();
    let trader = market.clone_trader(0).unwrap();

    market
        .exec_config_update(ConfigUpdate {
            paused: Some(true),
            ..Default::default()
        })
        .unwrap();

    let err = market
        .exec_buy(&trader, OptionKind::Call, "3000", "1", "100", "700")
        .unwrap_err();
    assert_err_id(err, "paused");

    // the owner can still operate the market back open
    market
        .exec_config_update(ConfigUpdate {
            paused: Some(false),
            ..Default::default()
        })
        .unwrap();
    market
        .exec_buy(&trader, OptionKind::Call, "3000", "1", "100", "700")
        .unwrap();
}
