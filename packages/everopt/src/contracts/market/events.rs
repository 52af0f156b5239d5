//! Typed events emitted by the market contract.
use super::position::{OptionKind, PositionId};
use crate::event::CosmwasmEventExt;
use crate::number::{Collateral, Number, Price};
use cosmwasm_std::{Addr, Decimal256, Event, Timestamp};

/// A position was opened.
#[derive(Debug)]
pub struct OptionBoughtEvent {
    /// Position owner
    pub owner: Addr,
    /// Newly assigned id
    pub id: PositionId,
    /// Call or put
    pub kind: OptionKind,
    /// Strike price
    pub strike: Price,
    /// Size, WAD
    pub size: Decimal256,
    /// Premium paid to the pool
    pub premium: Collateral,
    /// Initial funding escrow
    pub prefund: Collateral,
}

impl From<OptionBoughtEvent> for Event {
    fn from(src: OptionBoughtEvent) -> Self {
        Event::new("option-bought").add_attributes(vec![
            ("owner", src.owner.to_string()),
            ("pos-id", src.id.to_string()),
            ("kind", src.kind.to_string()),
            ("strike", src.strike.to_string()),
            ("size", src.size.to_string()),
            ("premium", src.premium.to_string()),
            ("prefund", src.prefund.to_string()),
        ])
    }
}

impl TryFrom<&Event> for OptionBoughtEvent {
    type Error = anyhow::Error;

    fn try_from(evt: &Event) -> anyhow::Result<Self> {
        Ok(OptionBoughtEvent {
            owner: evt.unchecked_addr_attr("owner")?,
            id: evt.map_attr_result("pos-id", |s| s.parse())?,
            kind: evt.map_attr_result("kind", |s| s.parse())?,
            strike: evt.decimal_attr("strike")?,
            size: evt.map_attr_result("size", |s| s.parse().map_err(anyhow::Error::from))?,
            premium: evt.decimal_attr("premium")?,
            prefund: evt.decimal_attr("prefund")?,
        })
    }
}

/// Size was sold back to the market maker.
#[derive(Debug)]
pub struct OptionSoldEvent {
    /// Position owner
    pub owner: Addr,
    /// Position id
    pub id: PositionId,
    /// Size sold, WAD
    pub size: Decimal256,
    /// Revenue paid out of the pool
    pub revenue: Collateral,
    /// Whether the sell closed the position
    pub closed: bool,
}

impl From<OptionSoldEvent> for Event {
    fn from(src: OptionSoldEvent) -> Self {
        Event::new("option-sold").add_attributes(vec![
            ("owner", src.owner.to_string()),
            ("pos-id", src.id.to_string()),
            ("size", src.size.to_string()),
            ("revenue", src.revenue.to_string()),
            ("closed", src.closed.to_string()),
        ])
    }
}

/// A position was exercised at spot.
#[derive(Debug)]
pub struct OptionExercisedEvent {
    /// Position owner
    pub owner: Addr,
    /// Position id
    pub id: PositionId,
    /// Intrinsic payout drawn from the pool
    pub payout: Collateral,
    /// Funding escrow returned to the owner
    pub refund: Collateral,
}

impl From<OptionExercisedEvent> for Event {
    fn from(src: OptionExercisedEvent) -> Self {
        Event::new("option-exercised").add_attributes(vec![
            ("owner", src.owner.to_string()),
            ("pos-id", src.id.to_string()),
            ("payout", src.payout.to_string()),
            ("refund", src.refund.to_string()),
        ])
    }
}

/// A drained position was liquidated.
#[derive(Debug)]
pub struct PositionLiquidatedEvent {
    /// Position id
    pub id: PositionId,
    /// Caller that triggered the liquidation
    pub liquidator: Addr,
    /// Remaining escrow awarded to the liquidator
    pub reward: Collateral,
}

impl From<PositionLiquidatedEvent> for Event {
    fn from(src: PositionLiquidatedEvent) -> Self {
        Event::new("position-liquidated").add_attributes(vec![
            ("pos-id", src.id.to_string()),
            ("liquidator", src.liquidator.to_string()),
            ("reward", src.reward.to_string()),
        ])
    }
}

/// Funding was settled against a position's escrow.
#[derive(Debug)]
pub struct FundingAccruedEvent {
    /// Position id
    pub id: PositionId,
    /// Amount debited and routed to the pool
    pub amount: Collateral,
    /// Settlement time
    pub timestamp: Timestamp,
}

impl From<FundingAccruedEvent> for Event {
    fn from(src: FundingAccruedEvent) -> Self {
        Event::new("funding-accrued").add_attributes(vec![
            ("pos-id", src.id.to_string()),
            ("amount", src.amount.to_string()),
            ("timestamp", src.timestamp.nanos().to_string()),
        ])
    }
}

impl TryFrom<&Event> for FundingAccruedEvent {
    type Error = anyhow::Error;

    fn try_from(evt: &Event) -> anyhow::Result<Self> {
        Ok(FundingAccruedEvent {
            id: evt.map_attr_result("pos-id", |s| s.parse())?,
            amount: evt.decimal_attr("amount")?,
            timestamp: evt.timestamp_attr("timestamp")?,
        })
    }
}

/// A position's funding escrow was topped up.
#[derive(Debug)]
pub struct FundingDepositedEvent {
    /// Position id
    pub id: PositionId,
    /// Amount added to the escrow
    pub amount: Collateral,
}

impl From<FundingDepositedEvent> for Event {
    fn from(src: FundingDepositedEvent) -> Self {
        Event::new("funding-deposited").add_attributes(vec![
            ("pos-id", src.id.to_string()),
            ("amount", src.amount.to_string()),
        ])
    }
}

/// The engine committed a trade.
#[derive(Debug)]
pub struct TradeExecutedEvent {
    /// Call or put
    pub kind: OptionKind,
    /// Strike price
    pub strike: Price,
    /// Size traded, WAD
    pub size: Decimal256,
    /// Buy (true) or sell (false)
    pub is_buy: bool,
    /// Premium or revenue, WAD quote units
    pub amount: Collateral,
}

impl From<TradeExecutedEvent> for Event {
    fn from(src: TradeExecutedEvent) -> Self {
        Event::new("trade-executed").add_attributes(vec![
            ("kind", src.kind.to_string()),
            ("strike", src.strike.to_string()),
            ("size", src.size.to_string()),
            ("is-buy", src.is_buy.to_string()),
            ("amount", src.amount.to_string()),
        ])
    }
}

/// The engine's cached cost moved.
#[derive(Debug)]
pub struct CostUpdatedEvent {
    /// Cost before
    pub old_cost: Number,
    /// Cost after
    pub new_cost: Number,
}

impl From<CostUpdatedEvent> for Event {
    fn from(src: CostUpdatedEvent) -> Self {
        Event::new("cost-updated").add_attributes(vec![
            ("old-cost", src.old_cost.to_string()),
            ("new-cost", src.new_cost.to_string()),
        ])
    }
}

impl TryFrom<&Event> for CostUpdatedEvent {
    type Error = anyhow::Error;

    fn try_from(evt: &Event) -> anyhow::Result<Self> {
        Ok(CostUpdatedEvent {
            old_cost: evt.number_attr("old-cost")?,
            new_cost: evt.number_attr("new-cost")?,
        })
    }
}

/// The bucket grid was recentered.
#[derive(Debug)]
pub struct RecenteredEvent {
    /// Center before
    pub old_center: Price,
    /// Center after
    pub new_center: Price,
}

impl From<RecenteredEvent> for Event {
    fn from(src: RecenteredEvent) -> Self {
        Event::new("recentered").add_attributes(vec![
            ("old-center", src.old_center.to_string()),
            ("new-center", src.new_center.to_string()),
        ])
    }
}

/// A new price-bounds Merkle root was committed.
#[derive(Debug)]
pub struct PriceBoundsUpdatedEvent {
    /// Hex-encoded root, empty when cleared
    pub root: Option<String>,
}

impl From<PriceBoundsUpdatedEvent> for Event {
    fn from(src: PriceBoundsUpdatedEvent) -> Self {
        Event::new("price-bounds-updated")
            .add_attribute("merkle-root", src.root.unwrap_or_default())
    }
}
