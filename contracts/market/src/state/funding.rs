//! Derives mark prices, intrinsic values and funding rates from the
//! engine's risk-neutral distribution.
//!
//! An everlasting option never expires; its holder instead streams the
//! option's time value to the pool over each funding period. The mark is
//! the risk-neutral expected payoff scaled by the premium factor of the
//! everlasting structure, so time value is always the gap between mark and
//! intrinsic.
use crate::prelude::*;
use crate::state::engine::payoff;

impl State<'_> {
    /// Mark price per unit of size:
    /// `premium_factor · Σᵢ p[i]·payoff(midᵢ)`.
    pub(crate) fn mark_price(
        &self,
        store: &dyn Storage,
        kind: OptionKind,
        strike: Price,
    ) -> Result<Price> {
        let grid = self.grid(store)?;
        let midpoints = grid.midpoints()?;
        let prices = self.risk_neutral_prices(store)?;

        let mut expected = Decimal256::zero();
        for (mid, p) in midpoints.iter().zip(&prices) {
            expected = expected.checked_add(payoff(kind, strike, *mid).checked_mul(*p)?)?;
        }

        Ok(Price::from_decimal256(
            expected.checked_mul(self.config.premium_factor)?,
        ))
    }

    /// Intrinsic value per unit of size at the current spot.
    pub(crate) fn intrinsic(
        &self,
        store: &dyn Storage,
        kind: OptionKind,
        strike: Price,
    ) -> Result<Price> {
        let spot = self.spot_price(store)?;
        Ok(Price::from_decimal256(payoff(kind, strike, spot)))
    }

    /// Quote units drained from a position's escrow per second.
    ///
    /// `(mark − intrinsic)·size / funding_period`, capped by the configured
    /// maximum rate. Fails closed to zero if intrinsic somehow exceeds mark.
    pub(crate) fn funding_per_second(
        &self,
        store: &dyn Storage,
        kind: OptionKind,
        strike: Price,
        size: Decimal256,
    ) -> Result<Collateral> {
        let mark = self.mark_price(store, kind, strike)?;
        let intrinsic = self.intrinsic(store, kind, strike)?;

        let time_value = match mark
            .into_decimal256()
            .checked_sub(intrinsic.into_decimal256())
        {
            Ok(tv) => tv,
            Err(_) => return Ok(Collateral::zero()),
        };

        let uncapped = time_value
            .checked_mul(size)?
            .checked_div(Decimal256::from_ratio(self.config.funding_period_seconds, 1u64))?;
        let cap = self.config.max_funding_rate.checked_mul(size)?;

        Ok(Collateral::from_decimal256(std::cmp::min(uncapped, cap)))
    }
}
