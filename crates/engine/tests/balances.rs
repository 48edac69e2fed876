use uuid::Uuid;

use engine::{Allocation, ErrorKind, MoneyCents};

mod common;
use common::{balance, cents, engine_with_db, group_with_members, pay, settle};

#[tokio::test]
async fn member_without_activity_has_zero_balance() {
    let (engine, _db) = engine_with_db().await;
    let (group_id, m) = group_with_members(&engine, 2).await;
    pay(&engine, group_id, m[0], &[(m[0], 500)]).await;

    assert_eq!(balance(&engine, group_id, m[1]).await, MoneyCents::ZERO);
    let debts = engine.my_debts(group_id, m[1], m[1]).await.unwrap();
    assert!(debts.is_empty());
}

#[tokio::test]
async fn summary_reports_paid_owed_and_balance() {
    let (engine, _db) = engine_with_db().await;
    let (group_id, m) = group_with_members(&engine, 3).await;

    pay(&engine, group_id, m[0], &[(m[0], 1000), (m[1], 1000), (m[2], 1000)]).await;
    pay(&engine, group_id, m[1], &[(m[0], 600), (m[2], 600)]).await;
    settle(&engine, group_id, m[2], m[0], 500).await;

    let summary = engine.group_summary(group_id, m[2]).await.unwrap();
    assert_eq!(summary.total, cents(4200));

    let ids: Vec<_> = summary.per_member.iter().map(|row| row.member_id).collect();
    let mut sorted = m.clone();
    sorted.sort();
    assert_eq!(ids, sorted);

    let row = |id: Uuid| {
        summary
            .per_member
            .iter()
            .find(|row| row.member_id == id)
            .unwrap()
    };
    assert_eq!(row(m[0]).total_paid, cents(3000));
    assert_eq!(row(m[0]).total_owed, cents(1600));
    assert_eq!(row(m[0]).balance, cents(1900));
    assert_eq!(row(m[1]).total_paid, cents(1200));
    assert_eq!(row(m[1]).total_owed, cents(1000));
    assert_eq!(row(m[1]).balance, cents(200));
    assert_eq!(row(m[2]).total_paid, MoneyCents::ZERO);
    assert_eq!(row(m[2]).total_owed, cents(1600));
    assert_eq!(row(m[2]).balance, cents(-2100));
}

#[tokio::test]
async fn summary_reads_are_idempotent() {
    let (engine, _db) = engine_with_db().await;
    let (group_id, m) = group_with_members(&engine, 3).await;
    pay(&engine, group_id, m[1], &[(m[0], 123), (m[1], 456), (m[2], 789)]).await;
    settle(&engine, group_id, m[0], m[1], 100).await;

    let first = engine.group_summary(group_id, m[0]).await.unwrap();
    let second = engine.group_summary(group_id, m[0]).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[tokio::test]
async fn debts_and_credits_are_proportional() {
    let (engine, _db) = engine_with_db().await;
    let (group_id, m) = group_with_members(&engine, 3).await;
    let (a, b, c) = (m[0], m[1], m[2]);

    // A: -30.00, B: +10.00, C: +20.00
    pay(&engine, group_id, b, &[(a, 1000)]).await;
    pay(&engine, group_id, c, &[(a, 2000)]).await;

    let debts = engine.my_debts(group_id, a, a).await.unwrap();
    assert_eq!(
        debts,
        vec![
            Allocation {
                member_id: b,
                amount: cents(1000),
            },
            Allocation {
                member_id: c,
                amount: cents(2000),
            },
        ]
    );

    assert_eq!(
        engine.my_credits(group_id, c, c).await.unwrap(),
        vec![Allocation {
            member_id: a,
            amount: cents(2000),
        }]
    );
    assert_eq!(
        engine.my_credits(group_id, b, b).await.unwrap(),
        vec![Allocation {
            member_id: a,
            amount: cents(1000),
        }]
    );

    // Creditors owe nothing and debtors are owed nothing.
    assert!(engine.my_debts(group_id, b, b).await.unwrap().is_empty());
    assert!(engine.my_credits(group_id, a, a).await.unwrap().is_empty());
}

#[tokio::test]
async fn sub_cent_allocation_is_filtered() {
    let (engine, _db) = engine_with_db().await;
    let (group_id, m) = group_with_members(&engine, 4).await;
    let (a, b, c, d) = (m[0], m[1], m[2], m[3]);

    // A: -1.00, D: -99.00, B: +0.40, C: +99.60
    pay(&engine, group_id, b, &[(d, 40)]).await;
    pay(&engine, group_id, c, &[(a, 100), (d, 9860)]).await;

    // B's share of A's debt is 1.00 × 0.40 / 100.00 = 0.004.
    let debts = engine.my_debts(group_id, a, a).await.unwrap();
    assert_eq!(
        debts,
        vec![Allocation {
            member_id: c,
            amount: cents(100),
        }]
    );
}

#[tokio::test]
async fn reads_require_membership_then_group() {
    let (engine, _db) = engine_with_db().await;
    let (group_id, m) = group_with_members(&engine, 1).await;
    let outsider = Uuid::new_v4();

    let err = engine.group_summary(group_id, outsider).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
    let err = engine
        .member_balance(group_id, m[0], outsider)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
    let err = engine.my_debts(group_id, m[0], outsider).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
    let err = engine
        .my_credits(Uuid::new_v4(), m[0], m[0])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
}
