//! Discretization of the price space into buckets.
//!
//! Bucket 0 is the open lower tail `[0, lower_edge)`, buckets
//! `1..=num_regular` are uniform-width regular buckets and bucket
//! `num_regular + 1` is the open upper tail `[upper_edge, ∞)`. The tails
//! carry finite midpoints so the pricing engine's logarithms stay bounded on
//! extreme prices.
use crate::prelude::*;
use everopt::contracts::market::entry::{BucketResp, BucketsResp, GridParams};
use everopt::contracts::market::events::RecenteredEvent;

const GRID: Item<Grid> = Item::new(namespace::GRID);

/// Upper limit on the regular bucket count, keeping every engine operation
/// comfortably O(N).
const MAX_REGULAR_BUCKETS: u32 = 512;

#[cw_serde]
pub(crate) struct Grid {
    pub(crate) center_price: Price,
    pub(crate) bucket_width: Price,
    pub(crate) num_regular: u32,
    pub(crate) lower_edge: Price,
    pub(crate) upper_edge: Price,
}

impl Grid {
    pub(crate) fn build(center_price: Price, bucket_width: Price, num_regular: u32) -> Result<Self> {
        opt_ensure!(
            num_regular >= 4 && num_regular % 2 == 0,
            ErrorId::InvalidConfig,
            ErrorDomain::Buckets,
            "num_regular must be even and at least 4, got {num_regular}"
        );
        opt_ensure!(
            num_regular <= MAX_REGULAR_BUCKETS,
            ErrorId::InvalidConfig,
            ErrorDomain::Buckets,
            "num_regular {num_regular} exceeds the maximum of {MAX_REGULAR_BUCKETS}"
        );
        opt_ensure!(
            !bucket_width.is_zero(),
            ErrorId::InvalidConfig,
            ErrorDomain::Buckets,
            "bucket width cannot be zero"
        );

        let half_span = bucket_width
            .checked_mul_dec(Decimal256::from_ratio(num_regular / 2, 1u64))?;
        let lower_edge = center_price
            .into_decimal256()
            .checked_sub(half_span.into_decimal256())
            .ok()
            .filter(|edge| !edge.is_zero())
            .map(Price::from_decimal256)
            .ok_or_else(|| {
                opt_anyhow!(
                    ErrorId::InvalidConfig,
                    ErrorDomain::Buckets,
                    "center {center_price} must exceed half the grid span {half_span}"
                )
            })?;
        let upper_edge = Price::from_decimal256(
            center_price
                .into_decimal256()
                .checked_add(half_span.into_decimal256())?,
        );

        Ok(Grid {
            center_price,
            bucket_width,
            num_regular,
            lower_edge,
            upper_edge,
        })
    }

    /// Total bucket count, tails included.
    pub(crate) fn num_buckets(&self) -> u32 {
        self.num_regular + 2
    }

    /// Midpoint of the given bucket.
    pub(crate) fn midpoint(&self, index: u32) -> Result<Price> {
        self.ensure_index(index)?;
        if index == 0 {
            // tail midpoint
            self.lower_edge
                .checked_div_dec(Decimal256::from_ratio(2u64, 1u64))
        } else if index == self.num_regular + 1 {
            Ok(Price::from_decimal256(
                self.upper_edge
                    .into_decimal256()
                    .checked_add(self.bucket_width.into_decimal256())?,
            ))
        } else {
            let offset = self
                .bucket_width
                .checked_mul_dec(Decimal256::from_ratio(index - 1, 1u64))?;
            let half = self
                .bucket_width
                .checked_div_dec(Decimal256::from_ratio(2u64, 1u64))?;
            Ok(Price::from_decimal256(
                self.lower_edge
                    .into_decimal256()
                    .checked_add(offset.into_decimal256())?
                    .checked_add(half.into_decimal256())?,
            ))
        }
    }

    /// Bounds of the given bucket, lower-inclusive, upper-exclusive. The
    /// upper tail has no upper bound.
    pub(crate) fn bounds(&self, index: u32) -> Result<(Price, Option<Price>)> {
        self.ensure_index(index)?;
        if index == 0 {
            Ok((Price::zero(), Some(self.lower_edge)))
        } else if index == self.num_regular + 1 {
            Ok((self.upper_edge, None))
        } else {
            let lower = Price::from_decimal256(
                self.lower_edge.into_decimal256().checked_add(
                    self.bucket_width
                        .checked_mul_dec(Decimal256::from_ratio(index - 1, 1u64))?
                        .into_decimal256(),
                )?,
            );
            let upper = Price::from_decimal256(
                lower
                    .into_decimal256()
                    .checked_add(self.bucket_width.into_decimal256())?,
            );
            Ok((lower, Some(upper)))
        }
    }

    /// Index of the bucket containing the given price.
    pub(crate) fn index_of(&self, price: Price) -> Result<u32> {
        if price < self.lower_edge {
            return Ok(0);
        }
        if price >= self.upper_edge {
            return Ok(self.num_regular + 1);
        }
        let offset = price
            .into_decimal256()
            .checked_sub(self.lower_edge.into_decimal256())?
            .atomics()
            .checked_div(self.bucket_width.into_decimal256().atomics())?;
        let offset = u32::try_from(cosmwasm_std::Uint128::try_from(offset)?.u128())
            .context("bucket offset out of range")?;
        Ok(offset + 1)
    }

    /// Midpoints of all buckets, tails included.
    pub(crate) fn midpoints(&self) -> Result<Vec<Price>> {
        (0..self.num_buckets()).map(|i| self.midpoint(i)).collect()
    }

    fn ensure_index(&self, index: u32) -> Result<()> {
        opt_ensure!(
            index < self.num_buckets(),
            ErrorId::IndexOutOfRange,
            ErrorDomain::Buckets,
            "bucket index {index} out of range, have {} buckets",
            self.num_buckets()
        );
        Ok(())
    }
}

/// called only once, at instantiation
pub(crate) fn grid_init(store: &mut dyn Storage, params: &GridParams) -> Result<()> {
    let grid = Grid::build(params.center_price, params.bucket_width, params.num_regular)?;
    GRID.save(store, &grid)?;

    Ok(())
}

impl State<'_> {
    pub(crate) fn grid(&self, store: &dyn Storage) -> Result<Grid> {
        GRID.load(store).map_err(|e| e.into())
    }

    /// Whether spot has drifted beyond the rebalance threshold.
    ///
    /// This is the one place a feed failure is deliberately swallowed: a
    /// broken feed must never make the permissionless recenter path panic
    /// callers, it just reports no rebalance.
    pub(crate) fn needs_rebalance(&self, store: &dyn Storage) -> bool {
        fn inner(state: &State, store: &dyn Storage) -> Result<bool> {
            let grid = state.grid(store)?;
            let spot = state.spot_price(store)?;
            let drift = spot
                .diff(grid.center_price)
                .into_decimal256()
                .checked_div(grid.center_price.into_decimal256())?;
            Ok(drift > state.config.rebalance_threshold)
        }
        inner(self, store).unwrap_or(false)
    }

    /// Rebuild the grid edges around a new center. Width and bucket count
    /// are invariant for the lifetime of the market.
    pub(crate) fn recenter(&self, ctx: &mut StateContext, new_center: Price) -> Result<()> {
        opt_ensure!(
            self.needs_rebalance(ctx.storage),
            ErrorId::InvalidConfig,
            ErrorDomain::Buckets,
            "spot has not drifted beyond the rebalance threshold"
        );

        let old = self.grid(ctx.storage)?;
        let new = Grid::build(new_center, old.bucket_width, old.num_regular)?;
        GRID.save(ctx.storage, &new)?;

        ctx.response_mut().add_event(RecenteredEvent {
            old_center: old.center_price,
            new_center,
        });

        Ok(())
    }

    pub(crate) fn buckets_resp(&self, store: &dyn Storage) -> Result<BucketsResp> {
        let grid = self.grid(store)?;
        Ok(BucketsResp {
            center_price: grid.center_price,
            bucket_width: grid.bucket_width,
            num_regular: grid.num_regular,
            lower_edge: grid.lower_edge,
            upper_edge: grid.upper_edge,
            midpoints: grid.midpoints()?,
        })
    }

    pub(crate) fn bucket_resp(&self, store: &dyn Storage, index: u32) -> Result<BucketResp> {
        let grid = self.grid(store)?;
        let (lower, upper) = grid.bounds(index)?;
        Ok(BucketResp {
            midpoint: grid.midpoint(index)?,
            lower,
            upper,
        })
    }
}
