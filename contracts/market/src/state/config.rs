use crate::prelude::*;
use cw_storage_plus::Item;
use everopt::contracts::market::config::ConfigUpdate;

const CONFIG_STORAGE: Item<Config> = Item::new(namespace::CONFIG);

pub(crate) fn load_config(store: &dyn Storage) -> Result<Config> {
    CONFIG_STORAGE.load(store).map_err(|e| e.into())
}

/// called only once, at instantiation
pub(crate) fn config_init(
    api: &dyn Api,
    store: &mut dyn Storage,
    mut config: Config,
    update: Option<ConfigUpdate>,
) -> Result<()> {
    apply_config_update(&mut config, api, update.unwrap_or_default())?;
    CONFIG_STORAGE.save(store, &config)?;

    Ok(())
}

pub(crate) fn update_config(
    config: &mut Config,
    api: &dyn Api,
    store: &mut dyn Storage,
    update: ConfigUpdate,
) -> Result<()> {
    apply_config_update(config, api, update)?;
    CONFIG_STORAGE.save(store, config)?;

    Ok(())
}

fn apply_config_update(
    config: &mut Config,
    api: &dyn Api,
    ConfigUpdate {
        feed,
        rebalance_threshold,
        oracle_staleness_seconds,
        premium_factor,
        funding_period_seconds,
        max_funding_rate,
        min_funding_balance,
        liquidation_grace_seconds,
        verification_tolerance,
        paused,
    }: ConfigUpdate,
) -> Result<()> {
    if let Some((feed, decimals)) = feed {
        opt_ensure!(
            decimals <= 18,
            ErrorId::InvalidConfig,
            ErrorDomain::Market,
            "feed decimals {decimals} exceed WAD precision"
        );
        config.feed = Some(feed.validate(api)?);
        config.feed_decimals = decimals;
    }

    if let Some(x) = rebalance_threshold {
        opt_ensure!(
            !x.is_zero(),
            ErrorId::InvalidConfig,
            ErrorDomain::Market,
            "rebalance threshold cannot be zero"
        );
        config.rebalance_threshold = x;
    }

    if let Some(x) = oracle_staleness_seconds {
        opt_ensure!(
            (60..=86400).contains(&x),
            ErrorId::InvalidConfig,
            ErrorDomain::Market,
            "oracle staleness {x} outside [60, 86400]"
        );
        config.oracle_staleness_seconds = x;
    }

    if let Some(x) = premium_factor {
        opt_ensure!(
            x >= Decimal256::one(),
            ErrorId::InvalidConfig,
            ErrorDomain::Market,
            "premium factor {x} below 1"
        );
        config.premium_factor = x;
    }

    if let Some(x) = funding_period_seconds {
        opt_ensure!(
            x > 0,
            ErrorId::InvalidConfig,
            ErrorDomain::Market,
            "funding period cannot be zero"
        );
        config.funding_period_seconds = x;
    }

    if let Some(x) = max_funding_rate {
        config.max_funding_rate = x;
    }

    if let Some(x) = min_funding_balance {
        config.min_funding_balance = x;
    }

    if let Some(x) = liquidation_grace_seconds {
        config.liquidation_grace_seconds = x;
    }

    if let Some(x) = verification_tolerance {
        opt_ensure!(
            !x.is_zero(),
            ErrorId::InvalidConfig,
            ErrorDomain::Market,
            "verification tolerance cannot be zero"
        );
        config.verification_tolerance = x;
    }

    if let Some(x) = paused {
        config.paused = x;
    }

    Ok(())
}
