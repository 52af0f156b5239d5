//! Data types for the semi-fungible position token contract.
//!
//! Balances are fungible per `(kind, strike)` pair. The token id packs the
//! option kind into the high bits and the WAD strike into the low 128 bits.
use crate::contracts::market::position::OptionKind;
use crate::error::{ErrorDomain, ErrorId};
use crate::number::{Price, UnsignedDecimal};
use crate::opt_ensure;
use crate::prelude::RawAddr;
use anyhow::Result;
use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{Decimal256, Uint128, Uint256};

/// The one-time instantiation message.
#[cw_serde]
pub struct InstantiateMsg {
    /// Contract owner; defaults to the instantiation sender
    pub owner: Option<RawAddr>,
}

/// Execute message for the position token contract.
#[cw_serde]
pub enum ExecuteMsg {
    /// Wire the minting market contract. Owner-only, one-shot.
    SetMinter {
        /// The market address
        minter: RawAddr,
    },

    /// Mint size to an owner. Minter-only.
    Mint {
        /// Receiving owner
        owner: RawAddr,
        /// Call or put
        kind: OptionKind,
        /// Strike price, WAD
        strike: Price,
        /// Size to mint, WAD
        amount: Decimal256,
    },

    /// Burn size from an owner. Minter-only.
    Burn {
        /// Owner to burn from
        owner: RawAddr,
        /// Call or put
        kind: OptionKind,
        /// Strike price, WAD
        strike: Price,
        /// Size to burn, WAD
        amount: Decimal256,
    },
}

/// Query message for the position token contract.
#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    /// Balance of one `(owner, kind, strike)` combination
    #[returns(BalanceResp)]
    Balance {
        /// Token owner
        owner: RawAddr,
        /// Call or put
        kind: OptionKind,
        /// Strike price, WAD
        strike: Price,
    },

    /// Total minted supply of one `(kind, strike)` combination
    #[returns(SupplyResp)]
    Supply {
        /// Call or put
        kind: OptionKind,
        /// Strike price, WAD
        strike: Price,
    },
}

/// Response for [QueryMsg::Balance].
#[cw_serde]
pub struct BalanceResp {
    /// The packed token id
    pub token_id: Uint256,
    /// Owned size, WAD
    pub amount: Decimal256,
}

/// Response for [QueryMsg::Supply].
#[cw_serde]
pub struct SupplyResp {
    /// The packed token id
    pub token_id: Uint256,
    /// Total minted size, WAD
    pub amount: Decimal256,
}

/// Pack an option kind and WAD strike into a token id:
/// `(kind << 128) | strike_atomics`.
pub fn encode_token_id(kind: OptionKind, strike: Price) -> Result<Uint256> {
    let atomics = strike.into_decimal256().atomics();
    let limit = Uint256::from(Uint128::MAX).checked_add(Uint256::one())?; // 2^128
    opt_ensure!(
        atomics < limit,
        ErrorId::Conversion,
        ErrorDomain::PositionToken,
        "strike {strike} does not fit into a token id"
    );
    let kind_bits = match kind {
        OptionKind::Call => Uint256::zero(),
        OptionKind::Put => limit,
    };
    Ok(kind_bits.checked_add(atomics)?)
}
