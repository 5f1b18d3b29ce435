use crate::error::CoreResult;
use crate::models::RankingWeight;
use crate::score::Score;
use rust_decimal::Decimal;

/// Weight given to the current bucket's raw score in the two-bucket decay
/// composition; the previous bucket gets `1 - CURRENT_WEIGHT`. Fixed
/// constants of the core, per spec.
pub const CURRENT_WEIGHT: Decimal = Decimal::from_parts(9, 0, 0, false, 1);
pub const PREVIOUS_WEIGHT: Decimal = Decimal::from_parts(1, 0, 0, false, 1);

/// Raw score of a single metric row: `max(0, round(view*vw + like*lw +
/// order*ow, 2, HALF_UP))`. The clamp handles a negative `like_count`
/// pushing the weighted total below zero.
pub fn raw_score(
    view_count: i64,
    like_count: i64,
    order_amount: Decimal,
    weight: &RankingWeight,
) -> CoreResult<Score> {
    let total = Decimal::from(view_count) * weight.view_weight
        + Decimal::from(like_count) * weight.like_weight
        + order_amount * weight.order_weight;
    let clamped = total.max(Decimal::ZERO);
    Score::try_new(clamped)
}

/// Decay composition for a single product across the current and previous
/// bucket: `raw_prev * 0.1 + raw_current * 0.9`. A missing side contributes
/// zero. Used by both the hourly and daily rankings (the "current"/
/// "previous" sides are whatever the caller determined those buckets to be).
pub fn decayed_score(raw_current: Option<Score>, raw_previous: Option<Score>) -> CoreResult<Score> {
    let current = raw_current.unwrap_or_else(Score::zero).decay(CURRENT_WEIGHT)?;
    let previous = raw_previous.unwrap_or_else(Score::zero).decay(PREVIOUS_WEIGHT)?;
    Ok(current.add(previous))
}

/// Single-row contribution mode used by the chunk-oriented hourly job: each
/// row contributes independently, weighted by whether its bucket is the
/// "current" bucket of the window. The store-side `ZINCRBY` then sums
/// contributions across rows for the same product.
pub fn single_row_contribution(row_score: Score, is_current_bucket: bool) -> CoreResult<Score> {
    let weight = if is_current_bucket { CURRENT_WEIGHT } else { PREVIOUS_WEIGHT };
    row_score.decay(weight)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn weights() -> RankingWeight {
        RankingWeight {
            id: 1,
            view_weight: dec!(0.1),
            like_weight: dec!(0.2),
            order_weight: dec!(0.6),
        }
    }

    #[test]
    fn scenario_hourly_decay() {
        let w = weights();
        // p=100: current (100,10,1000), previous (80,8,800)
        let raw_current_100 = raw_score(100, 10, dec!(1000), &w).unwrap();
        let raw_previous_100 = raw_score(80, 8, dec!(800), &w).unwrap();
        let final_100 = decayed_score(Some(raw_current_100), Some(raw_previous_100)).unwrap();
        assert_eq!(final_100.value(), dec!(599.76));

        // p=200: current only (50,5,500)
        let raw_current_200 = raw_score(50, 5, dec!(500), &w).unwrap();
        let final_200 = decayed_score(Some(raw_current_200), None).unwrap();
        assert_eq!(final_200.value(), dec!(275.40));

        assert!(final_100.value() > final_200.value());
    }

    #[test]
    fn scenario_previous_only_outranks_current_only() {
        let w = weights();
        // p=100: previous only (100,10,1000)
        let raw_previous_100 = raw_score(100, 10, dec!(1000), &w).unwrap();
        let final_100 = decayed_score(None, Some(raw_previous_100)).unwrap();
        assert_eq!(final_100.value(), dec!(61.20));

        // p=200: current only (50,5,500)
        let raw_current_200 = raw_score(50, 5, dec!(500), &w).unwrap();
        let final_200 = decayed_score(Some(raw_current_200), None).unwrap();
        assert_eq!(final_200.value(), dec!(275.40));

        assert!(final_200.value() > final_100.value());
    }

    #[test]
    fn negative_likes_clamp_to_zero() {
        let w = weights();
        // likes cancel out enough to push the weighted total negative.
        let raw = raw_score(0, -1000, dec!(0), &w).unwrap();
        assert_eq!(raw.value(), dec!(0.00));
    }
}
