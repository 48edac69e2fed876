//! Expenses and share resolution.
//!
//! An [`Expense`] is paid in full by one member and split among participants.
//! Each participant states either a fixed share amount or a percentage of the
//! total; [`resolve_shares`] turns those into concrete amounts and checks that
//! they reconstruct the total.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    EngineError, MoneyCents, ParticipantShare, ResultEngine, expense_splits::ExpenseSplit,
    money::SCALE, util::parse_uuid,
};

/// Largest accepted gap between the sum of the shares and the total.
pub const SPLIT_TOLERANCE: MoneyCents = MoneyCents::new(1);

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Expense {
    pub id: Uuid,
    pub group_id: Uuid,
    pub payer_id: Uuid,
    pub description: Option<String>,
    pub total: MoneyCents,
    pub location: Option<String>,
    pub paid_at: DateTime<Utc>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub splits: Vec<ExpenseSplit>,
}

/// A participant share after percentage conversion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ResolvedShare {
    pub member_id: Uuid,
    pub amount: MoneyCents,
    pub percent: Option<Decimal>,
}

/// Resolves the participant shares of an expense of `total`.
///
/// Percent rows become `total × percent / 100`. The tolerance check runs on
/// the full-precision values. Rounding to cents then uses the largest
/// remainder method: every share is truncated to cents and the cents left
/// over go to the shares with the largest truncated fraction (ties by member
/// id). The stored shares add up to the exact sum rounded to cents, so
/// percentages covering 100% reconstruct the total to the cent.
///
/// An empty list resolves to no shares and fails the sum check.
pub(crate) fn resolve_shares(
    total: MoneyCents,
    participants: &[ParticipantShare],
) -> ResultEngine<Vec<ResolvedShare>> {
    let hundred = Decimal::ONE_HUNDRED;
    let total_exact = total.to_decimal();
    let mut seen = HashSet::with_capacity(participants.len());
    let mut exact_shares = Vec::with_capacity(participants.len());

    for participant in participants {
        if !seen.insert(participant.member_id) {
            return Err(EngineError::InvalidParticipantData(format!(
                "participant {} listed more than once",
                participant.member_id
            )));
        }
        let exact = match (participant.share_amount, participant.share_percent) {
            (Some(amount), None) => {
                if amount.is_negative() {
                    return Err(EngineError::InvalidParticipantData(format!(
                        "negative share for participant {}",
                        participant.member_id
                    )));
                }
                amount.to_decimal()
            }
            (None, Some(percent)) => {
                if percent.is_sign_negative() || percent > hundred {
                    return Err(EngineError::InvalidParticipantData(format!(
                        "percent for participant {} must be between 0 and 100",
                        participant.member_id
                    )));
                }
                total_exact * percent / hundred
            }
            (None, None) => {
                return Err(EngineError::InvalidParticipantData(format!(
                    "participant {} has neither share amount nor share percent",
                    participant.member_id
                )));
            }
            (Some(_), Some(_)) => {
                return Err(EngineError::InvalidParticipantData(format!(
                    "participant {} has both share amount and share percent",
                    participant.member_id
                )));
            }
        };
        exact_shares.push((participant, exact));
    }

    let sum: Decimal = exact_shares.iter().map(|(_, exact)| *exact).sum();
    if (sum - total_exact).abs() > SPLIT_TOLERANCE.to_decimal() {
        return Err(EngineError::PartsSumMismatch(format!(
            "shares add up to {}, expected {total}",
            sum.round_dp(4)
        )));
    }

    let target = MoneyCents::from_decimal(sum)?;
    let mut shares = Vec::with_capacity(exact_shares.len());
    let mut fractions = Vec::with_capacity(exact_shares.len());
    let mut assigned = MoneyCents::ZERO;
    for (index, (participant, exact)) in exact_shares.into_iter().enumerate() {
        let truncated = exact.round_dp_with_strategy(SCALE, RoundingStrategy::ToZero);
        let amount = MoneyCents::from_decimal(truncated)?;
        assigned.accumulate(amount)?;
        fractions.push((exact - truncated, participant.member_id, index));
        shares.push(ResolvedShare {
            member_id: participant.member_id,
            amount,
            percent: participant.share_percent,
        });
    }

    // `target - assigned` is the rounded sum of the truncated fractions, so
    // it never exceeds the number of shares that have one.
    let unroundable =
        || EngineError::PartsSumMismatch(format!("cannot round shares to {target}"));
    let leftover = target
        .cents()
        .checked_sub(assigned.cents())
        .and_then(|cents| usize::try_from(cents).ok())
        .ok_or_else(unroundable)?;
    fractions.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
    for (fraction, _, index) in fractions.into_iter().take(leftover) {
        if fraction.is_zero() {
            return Err(unroundable());
        }
        shares[index].amount.accumulate(MoneyCents::new(1))?;
    }

    Ok(shares)
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub group_id: String,
    pub payer_id: String,
    pub description: Option<String>,
    pub amount_minor: i64,
    pub location: Option<String>,
    pub paid_at: DateTimeUtc,
    pub created_by: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::expense_splits::Entity")]
    ExpenseSplits,
}

impl Related<super::expense_splits::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ExpenseSplits.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Expense> for ActiveModel {
    fn from(expense: &Expense) -> Self {
        Self {
            id: ActiveValue::Set(expense.id.to_string()),
            group_id: ActiveValue::Set(expense.group_id.to_string()),
            payer_id: ActiveValue::Set(expense.payer_id.to_string()),
            description: ActiveValue::Set(expense.description.clone()),
            amount_minor: ActiveValue::Set(expense.total.cents()),
            location: ActiveValue::Set(expense.location.clone()),
            paid_at: ActiveValue::Set(expense.paid_at),
            created_by: ActiveValue::Set(expense.created_by.to_string()),
            created_at: ActiveValue::Set(expense.created_at),
        }
    }
}

impl TryFrom<Model> for Expense {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "expense")?,
            group_id: parse_uuid(&model.group_id, "group")?,
            payer_id: parse_uuid(&model.payer_id, "user")?,
            description: model.description,
            total: MoneyCents::new(model.amount_minor),
            location: model.location,
            paid_at: model.paid_at,
            created_by: parse_uuid(&model.created_by, "user")?,
            created_at: model.created_at,
            splits: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use crate::ErrorKind;

    fn amounts(shares: &[ResolvedShare]) -> Vec<i64> {
        shares.iter().map(|s| s.amount.cents()).collect()
    }

    #[test]
    fn fixed_amounts_are_kept() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let shares = resolve_shares(
            MoneyCents::new(3000),
            &[
                ParticipantShare::amount(a, MoneyCents::new(1000)),
                ParticipantShare::amount(b, MoneyCents::new(2000)),
            ],
        )
        .unwrap();
        assert_eq!(amounts(&shares), vec![1000, 2000]);
        assert_eq!(shares[0].percent, None);
    }

    #[test]
    fn percentages_convert_against_the_total() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let shares = resolve_shares(
            MoneyCents::new(8000),
            &[
                ParticipantShare::percent(a, Decimal::from(25)),
                ParticipantShare::percent(b, Decimal::from(75)),
            ],
        )
        .unwrap();
        assert_eq!(amounts(&shares), vec![2000, 6000]);
        assert_eq!(shares[1].percent, Some(Decimal::from(75)));
    }

    #[test]
    fn thirds_pass_at_full_precision() {
        let third = Decimal::from(100) / Decimal::from(3);
        let ids = [Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];
        let participants: Vec<_> = ids
            .iter()
            .map(|id| ParticipantShare::percent(*id, third))
            .collect();
        let shares = resolve_shares(MoneyCents::new(10000), &participants).unwrap();

        // The leftover cent goes to the lowest member id.
        let lowest = ids.iter().min().copied().unwrap();
        for share in &shares {
            let expected = if share.member_id == lowest { 3334 } else { 3333 };
            assert_eq!(share.amount.cents(), expected);
        }
    }

    #[test]
    fn quarter_percent_shares_reconstruct_a_small_total() {
        // 25% of 0.10 is 0.025 each; rounding each alone would store 0.12.
        let ids: Vec<_> = (0..4).map(|_| Uuid::new_v4()).collect();
        let participants: Vec<_> = ids
            .iter()
            .map(|id| ParticipantShare::percent(*id, Decimal::from(25)))
            .collect();
        let shares = resolve_shares(MoneyCents::new(10), &participants).unwrap();

        assert_eq!(amounts(&shares).iter().sum::<i64>(), 10);
        let mut sorted = ids.clone();
        sorted.sort();
        for share in &shares {
            let expected = if share.member_id == sorted[0] || share.member_id == sorted[1] {
                3
            } else {
                2
            };
            assert_eq!(share.amount.cents(), expected);
        }
    }

    #[test]
    fn largest_fraction_takes_the_leftover_cent() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        // 10.01 × 30% = 3.003 and 10.01 × 70% = 7.007.
        let shares = resolve_shares(
            MoneyCents::new(1001),
            &[
                ParticipantShare::percent(a, Decimal::from(30)),
                ParticipantShare::percent(b, Decimal::from(70)),
            ],
        )
        .unwrap();
        assert_eq!(amounts(&shares), vec![300, 701]);
    }

    #[test]
    fn empty_participant_list_is_a_sum_mismatch() {
        let err = resolve_shares(MoneyCents::new(1000), &[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PartsSumMismatch);
    }

    #[test]
    fn mixed_rows_within_tolerance_are_accepted() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let shares = resolve_shares(
            MoneyCents::new(1000),
            &[
                ParticipantShare::amount(a, MoneyCents::new(667)),
                ParticipantShare::percent(b, Decimal::from_str("33.33").unwrap()),
            ],
        )
        .unwrap();
        assert_eq!(amounts(&shares), vec![667, 333]);
    }

    #[test]
    fn shortfall_is_a_sum_mismatch() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let err = resolve_shares(
            MoneyCents::new(3000),
            &[
                ParticipantShare::amount(a, MoneyCents::new(1000)),
                ParticipantShare::amount(b, MoneyCents::new(1500)),
            ],
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PartsSumMismatch);
    }

    #[test]
    fn off_by_two_cents_is_rejected() {
        let a = Uuid::new_v4();
        let err = resolve_shares(
            MoneyCents::new(1000),
            &[ParticipantShare::amount(a, MoneyCents::new(998))],
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PartsSumMismatch);

        let ok = resolve_shares(
            MoneyCents::new(1000),
            &[ParticipantShare::amount(a, MoneyCents::new(999))],
        );
        assert!(ok.is_ok());
    }

    #[test]
    fn malformed_rows_are_invalid_participant_data() {
        let a = Uuid::new_v4();
        let total = MoneyCents::new(1000);

        let cases = vec![
            vec![ParticipantShare::new(a)],
            vec![ParticipantShare {
                member_id: a,
                share_amount: Some(MoneyCents::new(500)),
                share_percent: Some(Decimal::from(50)),
            }],
            vec![ParticipantShare::amount(a, MoneyCents::new(-1000))],
            vec![ParticipantShare::percent(a, Decimal::from(101))],
            vec![
                ParticipantShare::amount(a, MoneyCents::new(500)),
                ParticipantShare::amount(a, MoneyCents::new(500)),
            ],
        ];
        for participants in cases {
            let err = resolve_shares(total, &participants).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidParticipantData);
        }
    }

    #[test]
    fn zero_shares_are_allowed() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let shares = resolve_shares(
            MoneyCents::new(1000),
            &[
                ParticipantShare::amount(a, MoneyCents::new(1000)),
                ParticipantShare::amount(b, MoneyCents::ZERO),
            ],
        )
        .unwrap();
        assert_eq!(amounts(&shares), vec![1000, 0]);
    }
}
