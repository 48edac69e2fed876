//! Proportional debt allocation.
//!
//! Fans an amount out across counterparties in proportion to their weights
//! (the size of their balances). This is a heuristic, not minimal debt
//! netting: shares are recomputed from current balances on every call and are
//! never required to add back up to the original amount.

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::{EngineError, MoneyCents, ResultEngine};

/// Allocations at or below this amount are rounding noise and are dropped.
pub const NOISE_THRESHOLD: MoneyCents = MoneyCents::new(1);

/// One counterparty's share of an allocated amount.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Allocation {
    pub member_id: Uuid,
    pub amount: MoneyCents,
}

/// Splits `amount` across `weights` proportionally.
///
/// Each share is `amount × weight / Σ weight`, rounded to cents. Non-positive
/// weights are ignored. Shares at or below [`NOISE_THRESHOLD`] are dropped.
/// The result is ordered by ascending amount, then member id.
///
/// Returns an empty list when there is nothing to allocate or no positive
/// weight to allocate it to.
pub fn allocate_proportionally(
    amount: Decimal,
    weights: &[(Uuid, Decimal)],
) -> ResultEngine<Vec<Allocation>> {
    if amount <= Decimal::ZERO {
        return Ok(Vec::new());
    }

    let weights: Vec<_> = weights
        .iter()
        .filter(|(_, weight)| *weight > Decimal::ZERO)
        .collect();
    let overflow = || EngineError::InvalidAmount("allocation overflows".to_string());
    let total_weight = weights
        .iter()
        .try_fold(Decimal::ZERO, |acc, (_, weight)| acc.checked_add(*weight))
        .ok_or_else(overflow)?;
    if total_weight.is_zero() {
        return Ok(Vec::new());
    }

    let mut allocations = Vec::with_capacity(weights.len());
    for (member_id, weight) in weights {
        // ratio <= 1, so the product never exceeds `amount`.
        let ratio = weight.checked_div(total_weight).ok_or_else(overflow)?;
        let exact = amount.checked_mul(ratio).ok_or_else(overflow)?;
        let share = MoneyCents::from_decimal(exact)?;
        if share > NOISE_THRESHOLD {
            allocations.push(Allocation {
                member_id: *member_id,
                amount: share,
            });
        }
    }

    allocations.sort_by(|a, b| {
        a.amount
            .cmp(&b.amount)
            .then_with(|| a.member_id.cmp(&b.member_id))
    });
    Ok(allocations)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn cents(value: i64) -> Decimal {
        MoneyCents::new(value).to_decimal()
    }

    #[test]
    fn debt_fans_out_by_creditor_balance() {
        // A owes 30.00; B is owed 10.00 and C 20.00.
        let (b, c) = (Uuid::new_v4(), Uuid::new_v4());
        let allocations =
            allocate_proportionally(cents(3000), &[(b, cents(1000)), (c, cents(2000))]).unwrap();
        assert_eq!(
            allocations,
            vec![
                Allocation {
                    member_id: b,
                    amount: MoneyCents::new(1000),
                },
                Allocation {
                    member_id: c,
                    amount: MoneyCents::new(2000),
                },
            ]
        );
    }

    #[test]
    fn sub_cent_share_is_dropped() {
        let (big, tiny) = (Uuid::new_v4(), Uuid::new_v4());
        // tiny would receive 1.00 × 0.004 = 0.004.
        let allocations = allocate_proportionally(
            cents(100),
            &[(big, Decimal::new(996, 3)), (tiny, Decimal::new(4, 3))],
        )
        .unwrap();
        assert_eq!(allocations.len(), 1);
        assert_eq!(allocations[0].member_id, big);
        assert_eq!(allocations[0].amount, MoneyCents::new(100));
    }

    #[test]
    fn exactly_one_cent_is_noise() {
        let a = Uuid::new_v4();
        let allocations = allocate_proportionally(cents(1), &[(a, cents(500))]).unwrap();
        assert!(allocations.is_empty());
    }

    #[test]
    fn nothing_to_allocate_or_nobody_to_allocate_to() {
        let a = Uuid::new_v4();
        let cases: [(Decimal, Vec<(Uuid, Decimal)>); 3] = [
            (Decimal::ZERO, vec![(a, cents(100))]),
            (cents(100), vec![]),
            (cents(100), vec![(a, Decimal::ZERO)]),
        ];
        for (amount, weights) in cases {
            assert!(allocate_proportionally(amount, &weights).unwrap().is_empty());
        }
    }

    #[test]
    fn extreme_balances_allocate_without_overflow() {
        // Balances near the top of the cents range.
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let huge = MoneyCents::new(i64::MAX / 2).to_decimal();
        let allocations = allocate_proportionally(huge, &[(a, huge)]).unwrap();
        assert_eq!(
            allocations,
            vec![Allocation {
                member_id: a,
                amount: MoneyCents::new(i64::MAX / 2),
            }]
        );

        let weight = Decimal::from(400_000_000_000_000i64);
        let pair = [(a, weight), (b, weight)];
        let allocations = allocate_proportionally(weight, &pair).unwrap();
        assert_eq!(allocations.len(), 2);
        assert!(
            allocations
                .iter()
                .all(|allocation| allocation.amount.to_decimal() == weight / Decimal::TWO)
        );
    }

    #[test]
    fn uneven_weights_round_each_share() {
        let ids = [Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];
        let weights: Vec<_> = ids.iter().map(|id| (*id, cents(100))).collect();
        let allocations = allocate_proportionally(cents(1000), &weights).unwrap();
        assert_eq!(allocations.len(), 3);
        assert!(allocations.iter().all(|a| a.amount == MoneyCents::new(333)));
        // Equal amounts fall back to id order.
        let mut sorted = ids.to_vec();
        sorted.sort();
        let order: Vec<_> = allocations.iter().map(|a| a.member_id).collect();
        assert_eq!(order, sorted);
    }

    proptest! {
        #[test]
        fn allocations_stay_within_the_amount(
            amount in 0i64..=10_000_000,
            raw_weights in prop::collection::vec(1i64..=1_000_000, 0..=8),
        ) {
            let weights: Vec<_> = raw_weights
                .iter()
                .map(|w| (Uuid::new_v4(), cents(*w)))
                .collect();
            let allocations = allocate_proportionally(cents(amount), &weights).unwrap();

            // Each rounding adds at most half a cent.
            let total: i64 = allocations.iter().map(|a| a.amount.cents()).sum();
            prop_assert!(total <= amount + weights.len() as i64);
            prop_assert!(allocations.len() <= weights.len());
            for allocation in &allocations {
                prop_assert!(allocation.amount > NOISE_THRESHOLD);
            }
            for pair in allocations.windows(2) {
                prop_assert!(pair[0].amount <= pair[1].amount);
            }
        }
    }
}
