use crate::error::{CoreError, CoreResult};
use rust_decimal::prelude::*;
use rust_decimal::RoundingStrategy;

/// A non-negative decimal score, scale 2, half-up rounding throughout.
///
/// Closed under `add` and `decay`: both operations always produce another
/// non-negative `Score`, so once a value is wrapped the invariant never
/// needs re-checking downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Score(Decimal);

impl Score {
    pub fn zero() -> Self {
        Score(Decimal::ZERO)
    }

    pub fn try_new(value: Decimal) -> CoreResult<Self> {
        if value.is_sign_negative() {
            return Err(CoreError::Invariant(format!(
                "score must be non-negative, got {value}"
            )));
        }
        Ok(Score(round_half_up(value)))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn as_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or(0.0)
    }

    /// Multiplicative down-weighting. `factor` must be in [0,1].
    pub fn decay(&self, factor: Decimal) -> CoreResult<Score> {
        if factor < Decimal::ZERO || factor > Decimal::ONE {
            return Err(CoreError::Invariant(format!(
                "decay factor must be within [0,1], got {factor}"
            )));
        }
        Ok(Score(round_half_up(self.0 * factor)))
    }

    pub fn add(&self, other: Score) -> Score {
        Score(round_half_up(self.0 + other.0))
    }
}

fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn rejects_negative() {
        assert!(Score::try_new(dec!(-1)).is_err());
    }

    #[test]
    fn add_preserves_non_negativity() {
        let a = Score::try_new(dec!(1.005)).unwrap();
        let b = Score::try_new(dec!(2.005)).unwrap();
        let sum = a.add(b);
        assert!(sum.value() >= Decimal::ZERO);
    }

    #[test]
    fn decay_is_monotonically_non_increasing() {
        let s = Score::try_new(dec!(100.00)).unwrap();
        let full = s.decay(dec!(1.0)).unwrap();
        let half = s.decay(dec!(0.5)).unwrap();
        let none = s.decay(dec!(0.0)).unwrap();
        assert!(full.value() >= half.value());
        assert!(half.value() >= none.value());
    }

    #[test]
    fn decay_rejects_out_of_range_factor() {
        let s = Score::try_new(dec!(10)).unwrap();
        assert!(s.decay(dec!(1.1)).is_err());
        assert!(s.decay(dec!(-0.1)).is_err());
    }
}
