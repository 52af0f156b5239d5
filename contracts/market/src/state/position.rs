//! Position lifecycle: open, accrue funding, sell back, exercise,
//! liquidate.
//!
//! Funding settles before any other mutation of a position, so cash flows
//! always accrue against the pre-operation state. Closed positions stay in
//! the table as terminal records; every mutating entry rejects them.
use crate::prelude::*;
use crate::state::guard;
use everopt::contracts::liquidity_pool::ExecuteMsg as PoolExecuteMsg;
use everopt::contracts::market::entry::{PendingFundingResp, PositionResp, PositionsResp};
use everopt::contracts::market::events::{
    FundingAccruedEvent, FundingDepositedEvent, OptionBoughtEvent, OptionExercisedEvent,
    OptionSoldEvent, PositionLiquidatedEvent,
};
use everopt::contracts::position_token::ExecuteMsg as PositionTokenExecuteMsg;

pub(super) const OPEN_POSITIONS: Map<u64, Position> = Map::new(namespace::OPEN_POSITIONS);
pub(super) const LAST_POSITION_ID: Item<PositionId> = Item::new(namespace::LAST_POSITION_ID);
pub(super) const POSITIONS_BY_OWNER: Map<(&Addr, u64), ()> =
    Map::new(namespace::POSITIONS_BY_OWNER);

pub(crate) fn positions_init(store: &mut dyn Storage) -> Result<()> {
    LAST_POSITION_ID.save(store, &PositionId::new(0))?;

    Ok(())
}

pub(crate) fn get_position(store: &dyn Storage, id: PositionId) -> Result<Position> {
    OPEN_POSITIONS.may_load(store, id.u64())?.ok_or_else(|| {
        opt_anyhow!(
            ErrorId::IndexOutOfRange,
            ErrorDomain::Market,
            "no position with id {id}"
        )
    })
}

fn save_position(store: &mut dyn Storage, id: PositionId, pos: &Position) -> Result<()> {
    OPEN_POSITIONS.save(store, id.u64(), pos)?;

    Ok(())
}

fn assert_position_active(pos: &Position) -> Result<()> {
    opt_ensure!(
        pos.active,
        ErrorId::PositionInactive,
        ErrorDomain::Market,
        "the position is closed"
    );
    Ok(())
}

fn assert_position_owner(pos: &Position, addr: &Addr) -> Result<()> {
    opt_ensure!(
        pos.owner == *addr,
        ErrorId::Auth,
        ErrorDomain::Market,
        "{addr} is not the position owner"
    );
    Ok(())
}

/// Solver breakdowns must not block a liquidation; anything else (auth,
/// storage, oracle) still propagates.
fn is_solver_failure(err: &anyhow::Error) -> bool {
    matches!(
        error_id_of(err),
        Some(
            ErrorId::LogDomain
                | ErrorId::SolverDidNotConverge
                | ErrorId::InsufficientLiquidity
                | ErrorId::LnUndefined
                | ErrorId::ExpOverflow
        )
    )
}

/// Smallest representable quote-unit increment above `amount`; never zero.
fn round_up_to_precision(token: &Token, amount: Collateral) -> Result<Collateral> {
    let floored = token.round_down_to_precision(amount)?;
    if floored < amount || floored.is_zero() {
        let unit = Collateral::from_decimal256(token.from_u128(1)?);
        floored.checked_add(unit).map_err(|e| e.into())
    } else {
        Ok(floored)
    }
}

impl State<'_> {
    /// Open a new position.
    pub(crate) fn buy(
        &self,
        ctx: &mut StateContext,
        sender: &Addr,
        funds: Collateral,
        kind: OptionKind,
        strike: Price,
        size: Decimal256,
        prefund: Collateral,
    ) -> Result<()> {
        opt_ensure!(
            !strike.is_zero(),
            ErrorId::InvalidStrike,
            ErrorDomain::Market,
            "strike cannot be zero"
        );
        opt_ensure!(
            !size.is_zero(),
            ErrorId::InvalidSize,
            ErrorDomain::Market,
            "size cannot be zero"
        );
        opt_ensure!(
            prefund >= self.config.min_funding_balance,
            ErrorId::InsufficientFunding,
            ErrorDomain::Market,
            "prefund {prefund} below the minimum funding balance {}",
            self.config.min_funding_balance
        );

        let token = self.get_token(ctx.storage)?.clone();
        let prefund = NonZero::new(prefund)
            .map(|p| token.validate_collateral(p))
            .transpose()?
            .map(NonZero::raw)
            .unwrap_or_default();

        let preview = self.execute_trade(ctx, kind, strike, size, true)?;
        guard::validate_trade(preview.delta)?;
        let premium = round_up_to_precision(&token, preview.amount)?;

        let required = premium.checked_add(prefund)?;
        opt_ensure!(
            funds >= required,
            ErrorId::MissingFunds,
            ErrorDomain::Market,
            "attached {funds} does not cover premium plus prefund {required}"
        );
        let excess = funds.checked_sub(required)?;
        ctx.queue_transfer(sender.clone(), excess)?;

        // the premium belongs to the pool
        let premium_msg =
            token.into_execute_msg(&self.config.pool, premium, &PoolExecuteMsg::ReceivePremium {})?;
        ctx.response_mut().add_message(premium_msg);

        let id = LAST_POSITION_ID.load(ctx.storage)?.next();
        LAST_POSITION_ID.save(ctx.storage, &id)?;

        let pos = Position {
            owner: sender.clone(),
            kind,
            strike,
            size,
            funding_balance: prefund,
            last_funding_time: self.now(),
            active: true,
        };
        save_position(ctx.storage, id, &pos)?;
        POSITIONS_BY_OWNER.save(ctx.storage, (sender, id.u64()), &())?;

        ctx.response_mut().add_execute_submessage_oneshot(
            &self.config.position_token,
            &PositionTokenExecuteMsg::Mint {
                owner: sender.into(),
                kind,
                strike,
                amount: size,
            },
        )?;

        ctx.response_mut().add_event(OptionBoughtEvent {
            owner: sender.clone(),
            id,
            kind,
            strike,
            size,
            premium,
            prefund,
        });

        Ok(())
    }

    /// Sell size back to the market maker; a full-size sell closes.
    pub(crate) fn sell(
        &self,
        ctx: &mut StateContext,
        sender: &Addr,
        id: PositionId,
        size: Decimal256,
    ) -> Result<()> {
        let mut pos = get_position(ctx.storage, id)?;
        assert_position_active(&pos)?;
        assert_position_owner(&pos, sender)?;
        opt_ensure!(
            !size.is_zero() && size <= pos.size,
            ErrorId::InvalidSize,
            ErrorDomain::Market,
            "sell size {size} outside (0, {}]",
            pos.size
        );

        self.accrue_position_funding(ctx, id, &mut pos)?;

        let preview = self.execute_trade(ctx, pos.kind, pos.strike, size, false)?;
        let token = self.get_token(ctx.storage)?;
        let revenue = token.round_down_to_precision(preview.amount)?;

        if let Some(revenue) = NonZero::new(revenue) {
            ctx.response_mut().add_execute_submessage_oneshot(
                &self.config.pool,
                &PoolExecuteMsg::RecordLoss {
                    recipient: sender.into(),
                    amount: revenue.raw(),
                },
            )?;
        }

        ctx.response_mut().add_execute_submessage_oneshot(
            &self.config.position_token,
            &PositionTokenExecuteMsg::Burn {
                owner: sender.into(),
                kind: pos.kind,
                strike: pos.strike,
                amount: size,
            },
        )?;

        pos.size = pos.size.checked_sub(size)?;
        let closed = pos.size.is_zero();
        if closed {
            pos.active = false;
            // the escrow belongs to the owner once nothing is left to fund
            ctx.queue_transfer(sender.clone(), pos.funding_balance)?;
            pos.funding_balance = Collateral::zero();
        }
        save_position(ctx.storage, id, &pos)?;

        ctx.response_mut().add_event(OptionSoldEvent {
            owner: sender.clone(),
            id,
            size,
            revenue,
            closed,
        });

        Ok(())
    }

    /// Exercise an in-the-money position at spot, closing it.
    pub(crate) fn exercise(
        &self,
        ctx: &mut StateContext,
        sender: &Addr,
        id: PositionId,
    ) -> Result<()> {
        let mut pos = get_position(ctx.storage, id)?;
        assert_position_active(&pos)?;
        assert_position_owner(&pos, sender)?;

        self.accrue_position_funding(ctx, id, &mut pos)?;

        let intrinsic = self.intrinsic(ctx.storage, pos.kind, pos.strike)?;
        opt_ensure!(
            !intrinsic.is_zero(),
            ErrorId::NotInTheMoney,
            ErrorDomain::Market,
            "spot does not favor this {} at strike {}",
            pos.kind,
            pos.strike
        );

        let payout_wad =
            Collateral::from_decimal256(intrinsic.into_decimal256().checked_mul(pos.size)?);
        let token = self.get_token(ctx.storage)?;
        let payout = token.round_down_to_precision(payout_wad)?;

        if let Some(payout) = NonZero::new(payout) {
            ctx.response_mut().add_execute_submessage_oneshot(
                &self.config.pool,
                &PoolExecuteMsg::RecordLoss {
                    recipient: sender.into(),
                    amount: payout.raw(),
                },
            )?;
        }

        // book the realized exit so the distribution sheds this payoff
        self.execute_trade(ctx, pos.kind, pos.strike, pos.size, false)?;

        ctx.response_mut().add_execute_submessage_oneshot(
            &self.config.position_token,
            &PositionTokenExecuteMsg::Burn {
                owner: sender.into(),
                kind: pos.kind,
                strike: pos.strike,
                amount: pos.size,
            },
        )?;

        let refund = pos.funding_balance;
        ctx.queue_transfer(sender.clone(), refund)?;
        pos.funding_balance = Collateral::zero();
        pos.active = false;
        save_position(ctx.storage, id, &pos)?;

        ctx.response_mut().add_event(OptionExercisedEvent {
            owner: sender.clone(),
            id,
            payout,
            refund,
        });

        Ok(())
    }

    /// Top up a position's funding escrow.
    pub(crate) fn deposit_funding(
        &self,
        ctx: &mut StateContext,
        sender: &Addr,
        funds: Collateral,
        id: PositionId,
    ) -> Result<()> {
        let mut pos = get_position(ctx.storage, id)?;
        assert_position_active(&pos)?;
        assert_position_owner(&pos, sender)?;

        let token = self.get_token(ctx.storage)?;
        let amount = NonZero::new(funds).ok_or_else(|| {
            opt_anyhow!(
                ErrorId::MissingFunds,
                ErrorDomain::Market,
                "a funding deposit requires attached funds"
            )
        })?;
        let amount = token.validate_collateral(amount)?.raw();

        self.accrue_position_funding(ctx, id, &mut pos)?;

        pos.funding_balance = pos.funding_balance.checked_add(amount)?;
        save_position(ctx.storage, id, &pos)?;

        ctx.response_mut()
            .add_event(FundingDepositedEvent { id, amount });

        Ok(())
    }

    /// Settle accrued funding. Permissionless.
    pub(crate) fn accrue_funding(&self, ctx: &mut StateContext, id: PositionId) -> Result<()> {
        let mut pos = get_position(ctx.storage, id)?;
        assert_position_active(&pos)?;

        self.accrue_position_funding(ctx, id, &mut pos)?;
        save_position(ctx.storage, id, &pos)?;

        Ok(())
    }

    /// Close a position whose funding has drained, awarding the remaining
    /// escrow to the caller.
    pub(crate) fn liquidate(
        &self,
        ctx: &mut StateContext,
        sender: &Addr,
        id: PositionId,
    ) -> Result<()> {
        let mut pos = get_position(ctx.storage, id)?;
        assert_position_active(&pos)?;
        opt_ensure!(
            self.is_liquidatable(ctx.storage, &pos)?,
            ErrorId::NotLiquidatable,
            ErrorDomain::Market,
            "position {id} still has funding"
        );

        self.accrue_position_funding(ctx, id, &mut pos)?;

        // the exit revenue stays with the pool; a pathological book must
        // not keep the position alive
        match self.execute_trade(ctx, pos.kind, pos.strike, pos.size, false) {
            Ok(_) => {}
            Err(err) if is_solver_failure(&err) => {}
            Err(err) => return Err(err),
        }

        ctx.response_mut().add_execute_submessage_oneshot(
            &self.config.position_token,
            &PositionTokenExecuteMsg::Burn {
                owner: (&pos.owner).into(),
                kind: pos.kind,
                strike: pos.strike,
                amount: pos.size,
            },
        )?;

        let reward = pos.funding_balance;
        ctx.queue_transfer(sender.clone(), reward)?;
        pos.funding_balance = Collateral::zero();
        pos.active = false;
        save_position(ctx.storage, id, &pos)?;

        ctx.response_mut().add_event(PositionLiquidatedEvent {
            id,
            liquidator: sender.clone(),
            reward,
        });

        Ok(())
    }

    /// Debit funding owed since the last settlement and route it to the
    /// pool. Advances `last_funding_time` even when the owed amount rounds
    /// to zero, so fractions cannot accrue for free indefinitely.
    fn accrue_position_funding(
        &self,
        ctx: &mut StateContext,
        id: PositionId,
        pos: &mut Position,
    ) -> Result<()> {
        let now = self.now();
        let elapsed = now.seconds().saturating_sub(pos.last_funding_time.seconds());
        if elapsed == 0 {
            return Ok(());
        }

        let fps = self.funding_per_second(ctx.storage, pos.kind, pos.strike, pos.size)?;
        let accrued = fps.checked_mul_dec(Decimal256::from_ratio(elapsed, 1u64))?;
        let token = self.get_token(ctx.storage)?;
        // floor to whole quote units
        let mut owed = token.round_down_to_precision(accrued)?;

        if owed >= pos.funding_balance {
            owed = pos.funding_balance;
            pos.funding_balance = Collateral::zero();
        } else {
            pos.funding_balance = pos.funding_balance.checked_sub(owed)?;
        }
        pos.last_funding_time = now;

        if let Some(owed) = NonZero::new(owed) {
            let funding_msg = token.into_execute_msg(
                &self.config.pool,
                owed.raw(),
                &PoolExecuteMsg::ReceiveFunding {},
            )?;
            ctx.response_mut().add_message(funding_msg);

            ctx.response_mut().add_event(FundingAccruedEvent {
                id,
                amount: owed.raw(),
                timestamp: now,
            });
        }

        Ok(())
    }

    /// Liquidation policy: (a) the escrow fell below the configured minimum
    /// and more than the grace period passed since the last settlement, or
    /// (b) the escrow drains within the grace period at the current rate.
    pub(crate) fn is_liquidatable(&self, store: &dyn Storage, pos: &Position) -> Result<bool> {
        if !pos.active {
            return Ok(false);
        }

        let grace = self.config.liquidation_grace_seconds;
        let elapsed = self
            .now()
            .seconds()
            .saturating_sub(pos.last_funding_time.seconds());
        if pos.funding_balance < self.config.min_funding_balance && elapsed > grace {
            return Ok(true);
        }

        let fps = self.funding_per_second(store, pos.kind, pos.strike, pos.size)?;
        if fps.is_zero() {
            return Ok(false);
        }
        let drain_seconds = pos
            .funding_balance
            .into_decimal256()
            .checked_div(fps.into_decimal256())?;
        Ok(drain_seconds < Decimal256::from_ratio(grace, 1u64))
    }

    pub(crate) fn position_resp(&self, store: &dyn Storage, id: PositionId) -> Result<PositionResp> {
        Ok(PositionResp {
            id,
            position: get_position(store, id)?,
        })
    }

    pub(crate) fn positions_resp(&self, store: &dyn Storage, owner: &Addr) -> Result<PositionsResp> {
        let positions = POSITIONS_BY_OWNER
            .prefix(owner)
            .range(store, None, None, Order::Ascending)
            .map(|res| {
                let (id, ()) = res?;
                let id = PositionId::new(id);
                Ok(PositionResp {
                    id,
                    position: get_position(store, id)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(PositionsResp { positions })
    }

    /// What an accrual right now would debit, without mutating.
    pub(crate) fn pending_funding_resp(
        &self,
        store: &dyn Storage,
        id: PositionId,
    ) -> Result<PendingFundingResp> {
        let pos = get_position(store, id)?;
        if !pos.active {
            return Ok(PendingFundingResp {
                amount: Collateral::zero(),
                last_funding_time: pos.last_funding_time,
            });
        }

        let elapsed = self
            .now()
            .seconds()
            .saturating_sub(pos.last_funding_time.seconds());
        let fps = self.funding_per_second(store, pos.kind, pos.strike, pos.size)?;
        let accrued = fps.checked_mul_dec(Decimal256::from_ratio(elapsed, 1u64))?;
        let token = self.get_token(store)?;
        let owed = std::cmp::min(token.round_down_to_precision(accrued)?, pos.funding_balance);

        Ok(PendingFundingResp {
            amount: owed,
            last_funding_time: pos.last_funding_time,
        })
    }
}
