//! Spot price adapter over the external aggregator feed.
use crate::prelude::*;
use everopt::contracts::feed::{QueryMsg as FeedQueryMsg, RoundDataResp};

impl State<'_> {
    /// Current spot in WAD, validated for freshness.
    ///
    /// Cached for the duration of the call so every component of one
    /// transaction prices against the same spot.
    pub(crate) fn spot_price(&self, _store: &dyn Storage) -> Result<Price> {
        self.spot_price_cache
            .get_or_try_init(|| self.spot_price_inner())
            .copied()
    }

    fn spot_price_inner(&self) -> Result<Price> {
        let feed = self.config.feed.as_ref().ok_or_else(|| {
            opt_anyhow!(
                ErrorId::FeedNotSet,
                ErrorDomain::Oracle,
                "no price feed configured"
            )
        })?;

        let round: RoundDataResp = self
            .querier
            .query_wasm_smart(feed, &FeedQueryMsg::LatestRoundData {})?;

        opt_ensure!(
            round.answer > cosmwasm_std::Int128::zero(),
            ErrorId::InvalidPrice,
            ErrorDomain::Oracle,
            "feed reported non-positive answer {}",
            round.answer
        );
        opt_ensure!(
            round.answered_in_round >= round.round_id,
            ErrorId::StaleRound,
            ErrorDomain::Oracle,
            "answer carried over from round {} while at round {}",
            round.answered_in_round,
            round.round_id
        );

        let age = self
            .now()
            .seconds()
            .saturating_sub(round.updated_at.seconds());
        opt_ensure!(
            age <= self.config.oracle_staleness_seconds,
            ErrorId::StalePrice,
            ErrorDomain::Oracle,
            "feed round is {age}s old, exceeding the {}s staleness limit",
            self.config.oracle_staleness_seconds
        );

        // scale the raw integer answer up to WAD
        let raw = u128::try_from(round.answer.i128()).map_err(|_| {
            opt_anyhow!(
                ErrorId::InvalidPrice,
                ErrorDomain::Oracle,
                "feed answer {} not representable",
                round.answer
            )
        })?;
        let price = Decimal256::from_atomics(raw, self.config.feed_decimals)
            .context("feed answer exceeds the representable price range")?;

        Ok(Price::from_decimal256(price))
    }
}
