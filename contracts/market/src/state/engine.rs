//! The constant-log-utility market maker.
//!
//! The engine prices every option against the pooled counterparty through
//! the cost function `f(C) = Σᵢ π[i]·ln(C − q[i])`. Committed states keep
//! `f(C) = U` (up to the solver tolerance) where `U` was fixed once by the
//! pool subsidy, and `C > max q` at all times: the market maker's loss is
//! bounded by the subsidy.
//!
//! A trade adds its bucket payoff vector to the shares (buy) or subtracts
//! it (sell); the new cost is the unique root of `f` above `max q`, found
//! by bisection. `f` is strictly increasing there, so the root exists and
//! is unique whenever it lies above the domain epsilon; a root squeezed
//! below that margin means the book cannot absorb the trade.
use crate::prelude::*;
use crate::state::buckets::Grid;
use everopt::contracts::liquidity_pool::QueryMsg as PoolQueryMsg;
use everopt::contracts::market::entry::EngineStateResp;
use everopt::contracts::market::events::{CostUpdatedEvent, TradeExecutedEvent};
use everopt::math;

const PRIOR: Item<Vec<Decimal256>> = Item::new(namespace::ENGINE_PRIOR);
const SHARES: Item<Vec<Number>> = Item::new(namespace::ENGINE_SHARES);
const COST: Item<Number> = Item::new(namespace::ENGINE_COST);
const UTILITY: Item<Number> = Item::new(namespace::ENGINE_UTILITY);

const SOLVER_MAX_ITERATIONS: u32 = 100;
const SOLVER_MAX_DOUBLINGS: u32 = 50;

/// Bisection convergence width, `10^-10` WAD.
fn convergence_tol() -> Number {
    Number::new_positive(Decimal256::raw(100_000_000))
}

/// Offset above `max q` below which the cost function is not evaluated.
fn domain_eps() -> Number {
    Number::new_positive(Decimal256::raw(1_000_000_000))
}

/// Committed engine state.
pub(crate) struct EngineStored {
    pub(crate) prior: Vec<Decimal256>,
    pub(crate) shares: Vec<Number>,
    pub(crate) cost: Number,
    pub(crate) utility: Number,
}

/// Result of pricing a trade without committing it.
pub(crate) struct TradePreview {
    pub(crate) new_shares: Vec<Number>,
    pub(crate) new_cost: Number,
    /// Raw cost move, before clamping; what the arbitrage guard inspects
    pub(crate) delta: Number,
    /// Premium (buy) or revenue (sell), WAD quote units
    pub(crate) amount: Collateral,
}

pub(crate) fn load_engine(store: &dyn Storage) -> Result<EngineStored> {
    let cost = COST.may_load(store)?.ok_or_else(|| {
        opt_anyhow!(
            ErrorId::NotInitialized,
            ErrorDomain::Engine,
            "the pricing engine has not been initialized"
        )
    })?;
    Ok(EngineStored {
        prior: PRIOR.load(store)?,
        shares: SHARES.load(store)?,
        cost,
        utility: UTILITY.load(store)?,
    })
}

/// `f(C) = Σᵢ π[i]·ln(C − q[i])`
pub fn cost_function(prior: &[Decimal256], shares: &[Number], cost: Number) -> Result<Number> {
    opt_ensure!(
        prior.len() == shares.len(),
        ErrorId::QuantityMismatch,
        ErrorDomain::Engine,
        "prior has {} entries but shares has {}",
        prior.len(),
        shares.len()
    );

    let mut total = Number::ZERO;
    for (pi, q) in prior.iter().zip(shares) {
        let wealth = cost.checked_sub(*q)?;
        if !wealth.is_strictly_positive() {
            opt_bail!(
                ErrorId::LogDomain,
                ErrorDomain::Engine,
                "cost {cost} does not exceed share {q}"
            );
        }
        let term = math::ln(wealth.abs_unsigned())?.checked_mul(Number::new_positive(*pi))?;
        total = total.checked_add(term)?;
    }
    Ok(total)
}

/// Solve `f(C) = utility` for the unique root above `max q`.
///
/// Returns the upper bisection bound, so the committed cost never
/// undershoots the root: buys charge at least the exact premium and sells
/// refund at most the exact revenue.
pub fn solve_cost(
    prior: &[Decimal256],
    shares: &[Number],
    utility: Number,
    prev_cost: Number,
) -> Result<Number> {
    let max_share = shares.iter().copied().max().unwrap_or(Number::ZERO);

    let mut low = max_share.checked_add(domain_eps())?;
    if cost_function(prior, shares, low)? >= utility {
        // the root sits inside the domain margin: the book cannot absorb
        // this trade without breaking the bounded-loss invariant
        opt_bail!(
            ErrorId::InsufficientLiquidity,
            ErrorDomain::Engine,
            "cost solution would not exceed the maximum share {max_share}"
        );
    }

    let two = Number::from(2u64);
    let floor = max_share.checked_add(Number::from(10_000u64))?;
    let mut high = std::cmp::max(prev_cost.checked_mul(two)?, floor);
    let mut doublings = 0;
    while cost_function(prior, shares, high)? < utility {
        opt_ensure!(
            doublings < SOLVER_MAX_DOUBLINGS,
            ErrorId::SolverDidNotConverge,
            ErrorDomain::Engine,
            "no upper bracket after {SOLVER_MAX_DOUBLINGS} doublings"
        );
        high = high.checked_mul(two)?;
        doublings += 1;
    }

    for _ in 0..SOLVER_MAX_ITERATIONS {
        if high.checked_sub(low)? <= convergence_tol() {
            break;
        }
        let mid = low.checked_add(high)?.checked_div(two)?;
        if cost_function(prior, shares, mid)? < utility {
            low = mid;
        } else {
            high = mid;
        }
    }
    opt_ensure!(
        high.checked_sub(low)? <= convergence_tol(),
        ErrorId::SolverDidNotConverge,
        ErrorDomain::Engine,
        "bisection did not converge within {SOLVER_MAX_ITERATIONS} iterations"
    );

    Ok(high)
}

/// Per-bucket payoff of one unit of the option.
pub fn payoff(kind: OptionKind, strike: Price, midpoint: Price) -> Decimal256 {
    match kind {
        OptionKind::Call => {
            if midpoint > strike {
                midpoint.into_decimal256() - strike.into_decimal256()
            } else {
                Decimal256::zero()
            }
        }
        OptionKind::Put => {
            if strike > midpoint {
                strike.into_decimal256() - midpoint.into_decimal256()
            } else {
                Decimal256::zero()
            }
        }
    }
}

/// The payoff vector `κ` of a trade.
pub fn kappa(
    midpoints: &[Price],
    kind: OptionKind,
    strike: Price,
    size: Decimal256,
) -> Result<Vec<Decimal256>> {
    midpoints
        .iter()
        .map(|mid| {
            payoff(kind, strike, *mid)
                .checked_mul(size)
                .map_err(|e| e.into())
        })
        .collect()
}

fn shifted_shares(
    shares: &[Number],
    kap: &[Decimal256],
    is_buy: bool,
) -> Result<Vec<Number>> {
    shares
        .iter()
        .zip(kap)
        .map(|(q, k)| {
            let k = Number::new_positive(*k);
            if is_buy {
                q.checked_add(k)
            } else {
                q.checked_sub(k)
            }
        })
        .collect()
}

impl State<'_> {
    /// One-shot engine initialization against the pool subsidy.
    pub(crate) fn initialize_engine(
        &self,
        ctx: &mut StateContext,
        subsidy: Collateral,
        sigma: Option<Decimal256>,
    ) -> Result<()> {
        opt_ensure!(
            COST.may_load(ctx.storage)?.is_none(),
            ErrorId::AlreadyInitialized,
            ErrorDomain::Engine,
            "the pricing engine is already initialized"
        );
        opt_ensure!(
            !subsidy.is_zero(),
            ErrorId::ZeroSubsidy,
            ErrorDomain::Engine,
            "the engine subsidy cannot be zero"
        );

        // the pool's reserved subsidy is the worst-case loss backing; the
        // engine must not claim more than is actually earmarked
        let reserved: Collateral = self
            .querier
            .query_wasm_smart(&self.config.pool, &PoolQueryMsg::MaxSubsidy {})?;
        opt_ensure!(
            subsidy <= reserved,
            ErrorId::InsufficientAvailable,
            ErrorDomain::Engine,
            "subsidy {subsidy} exceeds the pool's reserved {reserved}"
        );

        let grid = self.grid(ctx.storage)?;
        let prior = match sigma {
            None => uniform_prior(grid.num_buckets())?,
            Some(sigma) => {
                let spot = self.spot_price(ctx.storage)?;
                lognormal_prior(&grid.midpoints()?, spot, sigma)?
            }
        };

        let cost = subsidy.into_number();
        // with q ≡ 0 and Σπ = 1 exactly, f(C₀) collapses to ln(C₀)
        let utility = math::ln(subsidy.into_decimal256())?;

        let shares = vec![Number::ZERO; prior.len()];
        PRIOR.save(ctx.storage, &prior)?;
        SHARES.save(ctx.storage, &shares)?;
        COST.save(ctx.storage, &cost)?;
        UTILITY.save(ctx.storage, &utility)?;

        Ok(())
    }

    /// Price a trade without committing it.
    pub(crate) fn trade_preview(
        &self,
        store: &dyn Storage,
        kind: OptionKind,
        strike: Price,
        size: Decimal256,
        is_buy: bool,
    ) -> Result<TradePreview> {
        let engine = load_engine(store)?;
        let grid = self.grid(store)?;
        trade_preview_inner(&engine, &grid, kind, strike, size, is_buy)
    }

    /// Same computation as [State::trade_preview], then commit.
    pub(crate) fn execute_trade(
        &self,
        ctx: &mut StateContext,
        kind: OptionKind,
        strike: Price,
        size: Decimal256,
        is_buy: bool,
    ) -> Result<TradePreview> {
        let engine = load_engine(ctx.storage)?;
        let grid = self.grid(ctx.storage)?;
        let preview = trade_preview_inner(&engine, &grid, kind, strike, size, is_buy)?;

        SHARES.save(ctx.storage, &preview.new_shares)?;
        COST.save(ctx.storage, &preview.new_cost)?;

        ctx.response_mut().add_event(TradeExecutedEvent {
            kind,
            strike,
            size,
            is_buy,
            amount: preview.amount,
        });
        ctx.response_mut().add_event(CostUpdatedEvent {
            old_cost: engine.cost,
            new_cost: preview.new_cost,
        });

        Ok(preview)
    }

    /// Commit an off-chain solved cost after verifying the residual.
    ///
    /// The share witness must match the committed state exactly, so a trade
    /// landing between the off-chain solve and this commit invalidates the
    /// submission instead of silently mispricing.
    pub(crate) fn verify_and_set_cost(
        &self,
        ctx: &mut StateContext,
        cost: Number,
        shares: &[Number],
    ) -> Result<()> {
        let engine = load_engine(ctx.storage)?;

        opt_ensure!(
            engine.shares == shares,
            ErrorId::QuantityMismatch,
            ErrorDomain::Engine,
            "submitted shares do not match the committed state"
        );

        let residual = cost_function(&engine.prior, &engine.shares, cost)?
            .checked_sub(engine.utility)?
            .abs_unsigned();
        opt_ensure!(
            residual <= self.config.verification_tolerance,
            ErrorId::InvalidVerification,
            ErrorDomain::Engine,
            "cost function residual {residual} exceeds the tolerance"
        );

        COST.save(ctx.storage, &cost)?;
        ctx.response_mut().add_event(CostUpdatedEvent {
            old_cost: engine.cost,
            new_cost: cost,
        });

        Ok(())
    }

    /// The engine's risk-neutral distribution, `p[i] ∝ π[i]/(C − q[i])`.
    pub(crate) fn risk_neutral_prices(&self, store: &dyn Storage) -> Result<Vec<Decimal256>> {
        let engine = load_engine(store)?;
        risk_neutral_inner(&engine)
    }

    pub(crate) fn engine_state_resp(&self, store: &dyn Storage) -> Result<EngineStateResp> {
        let grid = self.grid(store)?;
        match COST.may_load(store)? {
            None => Ok(EngineStateResp {
                initialized: false,
                cost: Number::ZERO,
                utility: Number::ZERO,
                shares: Vec::new(),
                prior: Vec::new(),
                num_buckets: grid.num_buckets(),
            }),
            Some(_) => {
                let engine = load_engine(store)?;
                Ok(EngineStateResp {
                    initialized: true,
                    cost: engine.cost,
                    utility: engine.utility,
                    shares: engine.shares,
                    prior: engine.prior,
                    num_buckets: grid.num_buckets(),
                })
            }
        }
    }
}

fn trade_preview_inner(
    engine: &EngineStored,
    grid: &Grid,
    kind: OptionKind,
    strike: Price,
    size: Decimal256,
    is_buy: bool,
) -> Result<TradePreview> {
    let midpoints = grid.midpoints()?;
    let kap = kappa(&midpoints, kind, strike, size)?;
    let new_shares = shifted_shares(&engine.shares, &kap, is_buy)?;
    let new_cost = solve_cost(&engine.prior, &new_shares, engine.utility, engine.cost)?;

    let delta = if is_buy {
        new_cost.checked_sub(engine.cost)?
    } else {
        engine.cost.checked_sub(new_cost)?
    };
    // a payoff-free trade can land within solver tolerance of zero
    let amount = Collateral::from_decimal256(
        delta.try_into_non_negative_value().unwrap_or_default(),
    );

    Ok(TradePreview {
        new_shares,
        new_cost,
        delta,
        amount,
    })
}

fn risk_neutral_inner(engine: &EngineStored) -> Result<Vec<Decimal256>> {
    let mut weights = Vec::with_capacity(engine.prior.len());
    let mut total = Decimal256::zero();
    for (pi, q) in engine.prior.iter().zip(&engine.shares) {
        let wealth = engine.cost.checked_sub(*q)?;
        if !wealth.is_strictly_positive() {
            opt_bail!(
                ErrorId::LogDomain,
                ErrorDomain::Engine,
                "cost does not exceed share {q}"
            );
        }
        let weight = pi.checked_div(wealth.abs_unsigned())?;
        weights.push(weight);
        total = total.checked_add(weight)?;
    }
    weights
        .into_iter()
        .map(|w| w.checked_div(total).map_err(|e| e.into()))
        .collect()
}

/// Uniform prior over all buckets, exact to the last atomic by folding the
/// division residue into bucket 0.
fn uniform_prior(num_buckets: u32) -> Result<Vec<Decimal256>> {
    let n = u64::from(num_buckets);
    let base = Decimal256::one().checked_div(Decimal256::from_ratio(n, 1u64))?;
    let mut prior = vec![base; usize::try_from(num_buckets)?];
    let spread = base.checked_mul(Decimal256::from_ratio(n, 1u64))?;
    let residue = Decimal256::one().checked_sub(spread)?;
    prior[0] = prior[0].checked_add(residue)?;
    Ok(prior)
}

/// Log-normal prior centered on spot:
/// `wᵢ = exp(−(ln(midᵢ/spot))²/(2σ²))/midᵢ`, normalized, with the rounding
/// residue folded into bucket 0 so the prior sums to 1 exactly. Entries are
/// kept strictly positive by bumping underflowed weights to one atomic.
fn lognormal_prior(midpoints: &[Price], spot: Price, sigma: Decimal256) -> Result<Vec<Decimal256>> {
    opt_ensure!(
        !sigma.is_zero(),
        ErrorId::ZeroSigma,
        ErrorDomain::Engine,
        "the prior width sigma cannot be zero"
    );

    let two_sigma_sq = Number::new_positive(
        sigma
            .checked_mul(sigma)?
            .checked_mul(Decimal256::from_ratio(2u64, 1u64))?,
    );

    let mut weights = Vec::with_capacity(midpoints.len());
    let mut total = Decimal256::zero();
    for mid in midpoints {
        let log_moneyness = math::ln(mid.checked_div_price(spot)?)?;
        let exponent = log_moneyness
            .checked_mul(log_moneyness)?
            .checked_div(two_sigma_sq)?;
        let weight = math::exp(-exponent)?.checked_div(mid.into_decimal256())?;
        weights.push(weight);
        total = total.checked_add(weight)?;
    }
    opt_ensure!(
        !total.is_zero(),
        ErrorId::ZeroSigma,
        ErrorDomain::Engine,
        "sigma {sigma} is too narrow for the bucket grid"
    );

    let atom = Decimal256::raw(1);
    let mut prior = vec![Decimal256::zero(); midpoints.len()];
    let mut spread = Decimal256::zero();
    for (slot, weight) in prior.iter_mut().zip(&weights).skip(1) {
        let mut p = weight.checked_div(total)?;
        if p.is_zero() {
            p = atom;
        }
        *slot = p;
        spread = spread.checked_add(p)?;
    }
    // bucket 0 absorbs its own weight plus the normalization residue
    prior[0] = Decimal256::one().checked_sub(spread).map_err(|_| {
        opt_anyhow!(
            ErrorId::ZeroSigma,
            ErrorDomain::Engine,
            "sigma {sigma} leaves no mass for the lower tail"
        )
    })?;
    opt_ensure!(
        !prior[0].is_zero(),
        ErrorId::ZeroSigma,
        ErrorDomain::Engine,
        "sigma {sigma} leaves no mass for the lower tail"
    );

    Ok(prior)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn test_midpoints() -> Vec<Price> {
        let grid = Grid::build(
            "3000".parse().unwrap(),
            "50".parse().unwrap(),
            64,
        )
        .unwrap();
        grid.midpoints().unwrap()
    }

    fn fresh_engine(subsidy: u64) -> EngineStored {
        let prior = uniform_prior(66).unwrap();
        EngineStored {
            shares: vec![Number::ZERO; prior.len()],
            prior,
            cost: Number::from(subsidy),
            utility: math::ln(Decimal256::from_ratio(subsidy, 1u64)).unwrap(),
        }
    }

    fn preview(
        engine: &EngineStored,
        kind: OptionKind,
        strike: &str,
        size: &str,
        is_buy: bool,
    ) -> TradePreview {
        let grid = Grid::build(
            "3000".parse().unwrap(),
            "50".parse().unwrap(),
            64,
        )
        .unwrap();
        trade_preview_inner(
            engine,
            &grid,
            kind,
            strike.parse().unwrap(),
            Decimal256::from_str(size).unwrap(),
            is_buy,
        )
        .unwrap()
    }

    #[test]
    fn uniform_prior_sums_to_one() {
        let prior = uniform_prior(66).unwrap();
        let total = prior
            .iter()
            .fold(Decimal256::zero(), |acc, p| acc + *p);
        assert_eq!(total, Decimal256::one());
        assert!(prior.iter().all(|p| !p.is_zero()));
    }

    #[test]
    fn lognormal_prior_sums_to_one() {
        let prior = lognormal_prior(
            &test_midpoints(),
            "3000".parse().unwrap(),
            Decimal256::from_str("0.2").unwrap(),
        )
        .unwrap();
        let total = prior
            .iter()
            .fold(Decimal256::zero(), |acc, p| acc + *p);
        assert_eq!(total, Decimal256::one());
        assert!(prior.iter().all(|p| !p.is_zero()));

        // mass concentrates near spot
        let at_spot = prior[33];
        assert!(prior[5] < at_spot);
        assert!(prior[60] < at_spot);
    }

    #[test]
    fn lognormal_prior_rejects_zero_sigma() {
        let err = lognormal_prior(
            &test_midpoints(),
            "3000".parse().unwrap(),
            Decimal256::zero(),
        )
        .unwrap_err();
        assert_eq!(error_id_of(&err), Some(ErrorId::ZeroSigma));
    }

    #[test]
    fn solver_recovers_initial_cost() {
        let engine = fresh_engine(10_000);
        let solved = solve_cost(
            &engine.prior,
            &engine.shares,
            engine.utility,
            engine.cost,
        )
        .unwrap();
        assert!(solved.approx_eq_eps(engine.cost, convergence_tol() * 2u64));
    }

    #[test]
    fn buy_increases_cost_and_keeps_bounded_loss() {
        let engine = fresh_engine(10_000);
        let strikes = ["2800", "3000", "3200", "3500"];
        let mut current = engine;
        for strike in strikes {
            let preview = preview(&current, OptionKind::Call, strike, "0.1", true);
            assert!(preview.new_cost > current.cost, "strike {strike}");
            let max_share = preview
                .new_shares
                .iter()
                .copied()
                .max()
                .unwrap();
            assert!(preview.new_cost > max_share, "strike {strike}");
            current = EngineStored {
                prior: current.prior,
                shares: preview.new_shares,
                cost: preview.new_cost,
                utility: current.utility,
            };
        }
    }

    #[test]
    fn premium_decreases_with_strike() {
        let engine = fresh_engine(10_000);
        let at_the_money = preview(&engine, OptionKind::Call, "3000", "1", true);
        let out_of_the_money = preview(&engine, OptionKind::Call, "4000", "1", true);
        assert!(!at_the_money.amount.is_zero());
        assert!(out_of_the_money.amount < at_the_money.amount);
    }

    #[test]
    fn buy_sell_round_trip_restores_cost() {
        let engine = fresh_engine(10_000);
        let bought = preview(&engine, OptionKind::Call, "3000", "1", true);
        let after_buy = EngineStored {
            prior: engine.prior.clone(),
            shares: bought.new_shares,
            cost: bought.new_cost,
            utility: engine.utility,
        };
        let sold = preview(&after_buy, OptionKind::Call, "3000", "1", false);
        assert!(sold
            .new_cost
            .approx_eq_eps(engine.cost, convergence_tol() * 2u64));
        assert!(sold.amount <= bought.amount);
    }

    #[test]
    fn risk_neutral_prices_sum_to_one() {
        let engine = fresh_engine(10_000);
        let prices = risk_neutral_inner(&engine).unwrap();
        let total = prices
            .iter()
            .fold(Decimal256::zero(), |acc, p| acc + *p);
        let diff = total.diff(Decimal256::one());
        assert!(diff < Decimal256::percent(1), "sum was {total}");
    }

    #[test]
    fn oversized_sell_is_rejected() {
        // a nearly-insolvent book: one bucket holds shares close to the
        // whole cost
        let prior = vec![
            Decimal256::percent(1),
            Decimal256::percent(99),
        ];
        let shares = vec![Number::from(10u64), Number::ZERO];
        let err = solve_cost(&prior, &shares, Number::ZERO, Number::from(10u64)).unwrap_err();
        assert_eq!(error_id_of(&err), Some(ErrorId::InsufficientLiquidity));
    }

    #[test]
    fn cost_function_rejects_log_domain() {
        let prior = uniform_prior(4).unwrap();
        let shares = vec![Number::from(5u64); 4];
        let err = cost_function(&prior, &shares, Number::from(5u64)).unwrap_err();
        assert_eq!(error_id_of(&err), Some(ErrorId::LogDomain));
    }
}
