//! Represents the native coin or CW20 used as the quote asset.
//!
//! The overall ideas of the Token API are:
//! 1. use the decimal types, not u128 or Uint128
//! 2. abstract over the Cw20/Native variants
//!
//! At the end of the day, call transfer/query with the same business logic as
//! contract math and don't worry at all about conversions or addresses/denoms.
//! The `decimal_places` conversion in [Token::into_u128]/[Token::from_u128]
//! is the single place where WAD values meet the coarser on-chain unit.
use crate::error::{ErrorDomain, ErrorId, OptError};
use crate::number::{Collateral, NonZero, UnsignedDecimal};
use crate::prelude::RawAddr;
use anyhow::{anyhow, Result};
use cosmwasm_schema::cw_serde;
use cosmwasm_std::{
    to_json_binary, Addr, BankMsg, Coin, CosmosMsg, Decimal256, QuerierWrapper, WasmMsg,
};
use cw20::{BalanceResponse as Cw20BalanceResponse, Cw20ExecuteMsg, Cw20QueryMsg};
use serde::Serialize;

/// The number of decimal places for tokens may vary
/// and there is a smart query cost for deriving it at runtime
/// so we grab the info at init time and then store it as a full-fledged token
#[cw_serde]
pub enum TokenInit {
    /// A cw20 address. Decimal places will be derived.
    Cw20 {
        /// Address of the CW20 contract
        addr: RawAddr,
    },

    /// Native currency. May cover some IBC tokens too
    Native {
        /// Denom used within the chain for this native coin
        denom: String,
        /// Number of decimal points
        decimal_places: u8,
    },
}

/// The quote asset, with its decimal places resolved.
#[cw_serde]
#[derive(Eq)]
pub enum Token {
    /// An asset controlled by a CW20 token.
    Cw20 {
        /// Address of the contract
        addr: RawAddr,
        /// Decimals places used by the contract
        decimal_places: u8,
    },

    /// Native coin on the blockchain
    Native {
        /// Native coin denom string
        denom: String,
        /// Decimal places used by the asset
        decimal_places: u8,
    },
}

impl Token {
    /// Resolve a [TokenInit], querying CW20 metadata when needed.
    pub fn from_init(querier: &QuerierWrapper, api: &dyn cosmwasm_std::Api, init: TokenInit) -> Result<Self> {
        match init {
            TokenInit::Native {
                denom,
                decimal_places,
            } => Ok(Token::Native {
                denom,
                decimal_places,
            }),
            TokenInit::Cw20 { addr } => {
                let validated = addr.validate(api)?;
                let info: cw20::TokenInfoResponse =
                    querier.query_wasm_smart(validated, &Cw20QueryMsg::TokenInfo {})?;
                Ok(Token::Cw20 {
                    addr,
                    decimal_places: info.decimals,
                })
            }
        }
    }

    pub(crate) fn name(&self) -> String {
        match self {
            Self::Native { denom, .. } => {
                format!("native-{}", denom)
            }
            Self::Cw20 { addr, .. } => {
                format!("cw20-{}", addr)
            }
        }
    }

    /// Decimal places of the on-chain unit.
    pub fn decimal_places(&self) -> u8 {
        match self {
            Self::Native { decimal_places, .. } => *decimal_places,
            Self::Cw20 { decimal_places, .. } => *decimal_places,
        }
    }

    /// This is the usual function to call for transferring money
    /// the result can simply be added as a Message to any Response
    /// the amount is expressed as Collateral such that it mirrors self.query_balance()
    pub fn into_transfer_msg(
        &self,
        recipient: &Addr,
        amount: NonZero<Collateral>,
    ) -> Result<Option<CosmosMsg>> {
        match self {
            Self::Native { denom, .. } => {
                Ok(self.into_u128(amount.into_decimal256())?.map(|amount| {
                    CosmosMsg::Bank(BankMsg::Send {
                        to_address: recipient.to_string(),
                        amount: vec![Coin {
                            denom: denom.clone(),
                            amount: amount.into(),
                        }],
                    })
                }))
            }
            Self::Cw20 { addr, .. } => match self.into_u128(amount.into_decimal256())? {
                None => Ok(None),
                Some(raw) => {
                    let msg = Cw20ExecuteMsg::Transfer {
                        recipient: recipient.into(),
                        amount: raw.into(),
                    };
                    Ok(Some(CosmosMsg::Wasm(WasmMsg::Execute {
                        contract_addr: addr.to_string(),
                        msg: to_json_binary(&msg)?,
                        funds: Vec::new(),
                    })))
                }
            },
        }
    }

    /// Get the balance - this is expressed as Collateral
    /// such that it mirrors self.into_transfer_msg()
    pub fn query_balance(&self, querier: &QuerierWrapper, user_addr: &Addr) -> Result<Collateral> {
        let raw = match self {
            Self::Cw20 { addr, .. } => {
                let resp: Cw20BalanceResponse = querier.query_wasm_smart(
                    addr.as_str(),
                    &Cw20QueryMsg::Balance {
                        address: user_addr.to_string(),
                    },
                )?;

                resp.balance.u128()
            }
            Self::Native { denom, .. } => {
                let coin = querier.query_balance(user_addr, denom)?;
                coin.amount.u128()
            }
        };
        self.from_u128(raw).map(Collateral::from_decimal256)
    }

    /// helper function
    ///
    /// given a u128, typically via a native Coin.amount or Cw20 amount
    /// get the Decimal256 representation according to the token's config
    ///
    /// this is essentially the inverse of self.into_u128()
    pub fn from_u128(&self, amount: u128) -> Result<Decimal256> {
        Decimal256::from_atomics(amount, self.decimal_places().into()).map_err(|e| e.into())
    }

    /// helper function
    ///
    /// given a decimal, typically via business logic and client API
    /// get the u128 representation, e.g. for Coin or Cw20
    /// according to the token's config
    ///
    /// this will only return None if the amount is zero (or rounds to 0)
    /// which then bubbles up into other methods that build on this
    ///
    /// this is essentially the inverse of self.from_u128()
    pub fn into_u128(&self, amount: Decimal256) -> Result<Option<u128>> {
        let value: u128 = amount
            .into_number()
            .to_u128_with_precision(self.decimal_places().into())
            .ok_or_else(|| {
                anyhow!(OptError::new(
                    ErrorId::Conversion,
                    ErrorDomain::Wallet,
                    format!("{} unable to convert {amount} to u128!", self.name()),
                ))
            })?;

        if value > 0 {
            Ok(Some(value))
        } else {
            Ok(None)
        }
    }

    /// Round down to the supported precision of this token
    pub fn round_down_to_precision(&self, amount: Collateral) -> Result<Collateral> {
        self.from_u128(
            self.into_u128(amount.into_decimal256())?
                .unwrap_or_default(),
        )
        .map(Collateral::from_decimal256)
    }

    /// helper to create an execute message with funds attached
    ///
    /// native funds ride on the message itself; cw20 funds go through the
    /// receiver's `Receive` hook via a cw20 `Send`
    pub fn into_execute_msg<T: Serialize>(
        &self,
        contract_addr: &Addr,
        amount: Collateral,
        execute_msg: &T,
    ) -> Result<WasmMsg> {
        match self {
            Self::Cw20 { addr, .. } => match self.into_u128(amount.into_decimal256())? {
                Some(raw) => {
                    let msg = Cw20ExecuteMsg::Send {
                        contract: contract_addr.to_string(),
                        amount: raw.into(),
                        msg: to_json_binary(execute_msg)?,
                    };
                    Ok(WasmMsg::Execute {
                        contract_addr: addr.to_string(),
                        msg: to_json_binary(&msg)?,
                        funds: Vec::new(),
                    })
                }
                None => {
                    // no funds, so just send the execute_msg directly to the contract
                    Ok(WasmMsg::Execute {
                        contract_addr: contract_addr.to_string(),
                        msg: to_json_binary(execute_msg)?,
                        funds: Vec::new(),
                    })
                }
            },
            Self::Native { denom, .. } => {
                let funds = match self.into_u128(amount.into_decimal256())? {
                    None => Vec::new(),
                    Some(raw) => vec![Coin {
                        denom: denom.clone(),
                        amount: raw.into(),
                    }],
                };

                Ok(WasmMsg::Execute {
                    contract_addr: contract_addr.to_string(),
                    msg: to_json_binary(execute_msg)?,
                    funds,
                })
            }
        }
    }

    /// The amount of this token attached as native funds.
    ///
    /// Fails on foreign denoms. Always zero for CW20 tokens, whose funds
    /// arrive through the `Receive` hook instead.
    pub fn amount_from_funds(&self, funds: &[Coin]) -> Result<Collateral> {
        match self {
            Self::Cw20 { .. } => {
                if funds.is_empty() {
                    Ok(Collateral::zero())
                } else {
                    Err(anyhow!(OptError::new(
                        ErrorId::UnnecessaryFunds,
                        ErrorDomain::Wallet,
                        format!("{} does not accept native funds", self.name()),
                    )))
                }
            }
            Self::Native { denom, .. } => {
                let mut total = Collateral::zero();
                for coin in funds {
                    if coin.denom != *denom {
                        return Err(anyhow!(OptError::new(
                            ErrorId::NativeFunds,
                            ErrorDomain::Wallet,
                            format!("unexpected denom {}, expected {denom}", coin.denom),
                        )));
                    }
                    total = total.checked_add(Collateral::from_decimal256(
                        self.from_u128(coin.amount.u128())?,
                    ))?;
                }
                Ok(total)
            }
        }
    }

    /// Validates that the given collateral doesn't require more precision
    /// than what the token supports
    pub fn validate_collateral(&self, value: NonZero<Collateral>) -> Result<NonZero<Collateral>> {
        let value_decimal256 = value.into_decimal256();

        if let Some(value_128) = self.into_u128(value_decimal256)? {
            let value_truncated = self.from_u128(value_128)?;
            if value_truncated == value_decimal256 {
                return Ok(value);
            }
        }

        let msg = format!(
            "Token Collateral must be as precise as the Token (is {}, only {} decimal places supported)",
            value,
            self.decimal_places()
        );
        Err(anyhow!(OptError::new(
            ErrorId::Conversion,
            ErrorDomain::Wallet,
            msg
        )))
    }
}
