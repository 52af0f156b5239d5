//! Stateless arbitrage checks on prices computed elsewhere.
//!
//! Only non-negativity hard-blocks trades inline. The surface checks
//! (convexity, monotonicity, put-call parity) are exported for off-chain
//! enforcement, where a full sweep over the strike surface is affordable.
//! Off-chain computed price bounds are committed as a SHA-256 Merkle root
//! and individual bounds verified in place.
use crate::prelude::*;
use everopt::contracts::market::events::PriceBoundsUpdatedEvent;
use sha2::{Digest, Sha256};

const PRICE_BOUNDS_ROOT: Item<String> = Item::new(namespace::PRICE_BOUNDS_ROOT);

/// Tolerance of the convexity check, 0.1%.
fn convexity_tolerance() -> Decimal256 {
    Decimal256::permille(1)
}

/// Reject a quoted price that came out negative. The engine's solver
/// conservatism keeps honest quotes non-negative; anything else indicates a
/// broken book and must not trade.
pub fn validate_trade(quoted: Number) -> Result<()> {
    opt_ensure!(
        quoted.is_positive_or_zero(),
        ErrorId::InvalidPrice,
        ErrorDomain::Guard,
        "negative quoted price {quoted}"
    );
    Ok(())
}

/// Convexity across three strikes `k1 < k2 < k3`: with
/// `λ = (k3−k2)/(k3−k1)`, requires `c2 ≤ λ·c1 + (1−λ)·c3` up to the 0.1%
/// tolerance.
pub fn check_convexity(
    strikes: (Price, Price, Price),
    prices: (Price, Price, Price),
) -> Result<bool> {
    let (k1, k2, k3) = strikes;
    let (c1, c2, c3) = prices;
    opt_ensure!(
        k1 < k2 && k2 < k3,
        ErrorId::InvalidStrike,
        ErrorDomain::Guard,
        "strikes must be strictly increasing"
    );

    let width = k3.into_decimal256().checked_sub(k1.into_decimal256())?;
    let lambda = k3
        .into_decimal256()
        .checked_sub(k2.into_decimal256())?
        .checked_div(width)?;
    let one_minus_lambda = Decimal256::one().checked_sub(lambda)?;

    let combo = c1
        .into_decimal256()
        .checked_mul(lambda)?
        .checked_add(c3.into_decimal256().checked_mul(one_minus_lambda)?)?;
    let allowed = combo.checked_mul(Decimal256::one().checked_add(convexity_tolerance())?)?;

    Ok(c2.into_decimal256() <= allowed)
}

/// Monotonicity across a strike-sorted price surface: call prices
/// non-increasing in strike, put prices non-decreasing.
pub fn check_monotonicity(kind: OptionKind, surface: &[(Price, Price)]) -> bool {
    surface.windows(2).all(|pair| {
        let (k_lo, c_lo) = pair[0];
        let (k_hi, c_hi) = pair[1];
        debug_assert!(k_lo < k_hi);
        match kind {
            OptionKind::Call => c_hi <= c_lo,
            OptionKind::Put => c_hi >= c_lo,
        }
    })
}

/// Zero-rate put-call parity: `call − put = spot − strike`, within the
/// given tolerance. Used off-chain to tighten published bounds.
pub fn check_put_call_parity(
    call: Price,
    put: Price,
    spot: Price,
    strike: Price,
    tolerance: Decimal256,
) -> Result<bool> {
    let lhs = call.into_number().checked_sub(put.into_number())?;
    let rhs = spot.into_number().checked_sub(strike.into_number())?;
    Ok(lhs.checked_sub(rhs)?.abs_unsigned() <= tolerance)
}

/// Hash of one published `(kind, strike, bid, ask)` bound.
pub fn leaf_hash(kind: OptionKind, strike: Price, bid: Price, ask: Price) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(format!("{kind}:{strike}:{bid}:{ask}").as_bytes());
    hasher.finalize().into()
}

/// Verify a Merkle proof of sorted-pair SHA-256 hashes against a
/// hex-encoded root.
pub fn verify_merkle_proof(root: &str, leaf: [u8; 32], proof: &[String]) -> Result<bool> {
    let mut current = leaf;
    for sibling in proof {
        let sibling: [u8; 32] = hex::decode(sibling)
            .ok()
            .and_then(|bytes| bytes.try_into().ok())
            .ok_or_else(|| {
                opt_anyhow!(
                    ErrorId::InvalidVerification,
                    ErrorDomain::Guard,
                    "malformed proof node"
                )
            })?;
        let mut hasher = Sha256::new();
        if current <= sibling {
            hasher.update(current);
            hasher.update(sibling);
        } else {
            hasher.update(sibling);
            hasher.update(current);
        }
        current = hasher.finalize().into();
    }
    Ok(hex::encode(current) == root.to_lowercase())
}

impl State<'_> {
    /// Owner commitment of a new price-bounds root; `None` disables bound
    /// verification entirely.
    pub(crate) fn set_price_bounds(
        &self,
        ctx: &mut StateContext,
        root: Option<String>,
    ) -> Result<()> {
        match &root {
            Some(root) => {
                opt_ensure!(
                    root.len() == 64 && hex::decode(root).is_ok(),
                    ErrorId::InvalidVerification,
                    ErrorDomain::Guard,
                    "price bounds root must be 32 hex-encoded bytes"
                );
                PRICE_BOUNDS_ROOT.save(ctx.storage, root)?;
            }
            None => PRICE_BOUNDS_ROOT.remove(ctx.storage),
        }

        ctx.response_mut()
            .add_event(PriceBoundsUpdatedEvent { root });

        Ok(())
    }

    pub(crate) fn price_bounds(&self, store: &dyn Storage) -> Result<Option<String>> {
        PRICE_BOUNDS_ROOT.may_load(store).map_err(|e| e.into())
    }

    /// Check one published bound against the committed root. With no root
    /// committed every bound passes.
    pub(crate) fn verify_price_bound(
        &self,
        store: &dyn Storage,
        kind: OptionKind,
        strike: Price,
        bid: Price,
        ask: Price,
        proof: &[String],
    ) -> Result<bool> {
        match self.price_bounds(store)? {
            None => Ok(true),
            Some(root) => verify_merkle_proof(&root, leaf_hash(kind, strike, bid, ask), proof),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> Price {
        s.parse().unwrap()
    }

    #[test]
    fn trade_validation() {
        assert!(validate_trade(Number::from(5u64)).is_ok());
        assert!(validate_trade(Number::ZERO).is_ok());
        let err = validate_trade(-Number::from(5u64)).unwrap_err();
        assert_eq!(error_id_of(&err), Some(ErrorId::InvalidPrice));
    }

    #[test]
    fn convexity() {
        // a convex surface passes
        assert!(check_convexity(
            (p("2800"), p("3000"), p("3200")),
            (p("320"), p("210"), p("130")),
        )
        .unwrap());
        // a bulge fails
        assert!(!check_convexity(
            (p("2800"), p("3000"), p("3200")),
            (p("320"), p("260"), p("130")),
        )
        .unwrap());
        // strikes out of order are rejected
        assert!(check_convexity(
            (p("3000"), p("2800"), p("3200")),
            (p("1"), p("1"), p("1")),
        )
        .is_err());
    }

    #[test]
    fn monotonicity() {
        let calls = [(p("2800"), p("320")), (p("3000"), p("210")), (p("3200"), p("130"))];
        assert!(check_monotonicity(OptionKind::Call, &calls));
        assert!(!check_monotonicity(OptionKind::Put, &calls));

        let puts = [(p("2800"), p("110")), (p("3000"), p("190")), (p("3200"), p("310"))];
        assert!(check_monotonicity(OptionKind::Put, &puts));
        assert!(!check_monotonicity(OptionKind::Call, &puts));
    }

    #[test]
    fn parity() {
        let tol = Decimal256::from_ratio(1u64, 100u64);
        // call 210, put 210, spot = strike = 3000
        assert!(
            check_put_call_parity(p("210"), p("210"), p("3000"), p("3000"), tol).unwrap()
        );
        // call - put = 100 = spot - strike
        assert!(
            check_put_call_parity(p("310"), p("210"), p("3100"), p("3000"), tol).unwrap()
        );
        assert!(
            !check_put_call_parity(p("310"), p("210"), p("3000"), p("3000"), tol).unwrap()
        );
    }

    #[test]
    fn merkle_round_trip() {
        let leaf_a = leaf_hash(OptionKind::Call, p("3000"), p("200"), p("220"));
        let leaf_b = leaf_hash(OptionKind::Put, p("3000"), p("190"), p("205"));

        let mut hasher = Sha256::new();
        if leaf_a <= leaf_b {
            hasher.update(leaf_a);
            hasher.update(leaf_b);
        } else {
            hasher.update(leaf_b);
            hasher.update(leaf_a);
        }
        let root: [u8; 32] = hasher.finalize().into();
        let root = hex::encode(root);

        assert!(verify_merkle_proof(&root, leaf_a, &[hex::encode(leaf_b)]).unwrap());
        assert!(verify_merkle_proof(&root, leaf_b, &[hex::encode(leaf_a)]).unwrap());
        // a bound that was never published fails
        let leaf_c = leaf_hash(OptionKind::Call, p("3000"), p("100"), p("220"));
        assert!(!verify_merkle_proof(&root, leaf_c, &[hex::encode(leaf_b)]).unwrap());
    }
}
