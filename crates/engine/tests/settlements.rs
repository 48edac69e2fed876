use sea_orm::{ConnectionTrait, Statement};
use uuid::Uuid;

use engine::{Direction, ErrorKind, MoneyCents, Origin, RecordSettlementCmd};

mod common;
use common::{
    balance, cents, count_rows, day, engine_with_db, group_with_members, pay, settle,
};

#[tokio::test]
async fn settlement_moves_the_same_amount_both_ways() {
    let (engine, _db) = engine_with_db().await;
    let (group_id, m) = group_with_members(&engine, 2).await;

    let settlement_id = settle(&engine, group_id, m[1], m[0], 2550).await;

    let entries = engine
        .query_ledger_entries(group_id, None, m[0])
        .await
        .unwrap();
    assert_eq!(entries.len(), 2);
    for entry in &entries {
        assert_eq!(entry.origin, Origin::Settlement { settlement_id });
        assert_eq!(entry.amount, cents(2550));
        let expected = if entry.member_id == m[1] {
            Direction::Debit
        } else {
            Direction::Credit
        };
        assert_eq!(entry.direction, expected);
    }

    assert_eq!(balance(&engine, group_id, m[1]).await, cents(-2550));
    assert_eq!(balance(&engine, group_id, m[0]).await, cents(2550));
}

#[tokio::test]
async fn settlement_shifts_exactly_the_amount() {
    let (engine, _db) = engine_with_db().await;
    let (group_id, m) = group_with_members(&engine, 3).await;

    pay(&engine, group_id, m[0], &[(m[0], 1000), (m[1], 1000), (m[2], 1000)]).await;
    let mut before = Vec::new();
    for member in &m {
        before.push(balance(&engine, group_id, *member).await);
    }

    settle(&engine, group_id, m[1], m[2], 750).await;

    assert_eq!(balance(&engine, group_id, m[0]).await, before[0]);
    assert_eq!(balance(&engine, group_id, m[1]).await, before[1] - cents(750));
    assert_eq!(balance(&engine, group_id, m[2]).await, before[2] + cents(750));

    let mut sum = MoneyCents::ZERO;
    for member in &m {
        sum += balance(&engine, group_id, *member).await;
    }
    assert_eq!(sum, MoneyCents::ZERO);
}

#[tokio::test]
async fn group_balances_always_sum_to_zero() {
    let (engine, _db) = engine_with_db().await;
    let (group_id, m) = group_with_members(&engine, 4).await;

    pay(&engine, group_id, m[0], &[(m[1], 333), (m[2], 333), (m[3], 334)]).await;
    pay(&engine, group_id, m[2], &[(m[0], 1999), (m[2], 1)]).await;
    settle(&engine, group_id, m[3], m[1], 77).await;
    settle(&engine, group_id, m[1], m[2], 12345).await;

    let mut sum = MoneyCents::ZERO;
    for member in &m {
        sum += balance(&engine, group_id, *member).await;
    }
    assert_eq!(sum, MoneyCents::ZERO);

    let summary = engine.group_summary(group_id, m[0]).await.unwrap();
    let summary_sum: MoneyCents = summary.per_member.iter().map(|row| row.balance).sum();
    assert_eq!(summary_sum, MoneyCents::ZERO);
}

#[tokio::test]
async fn settlement_preconditions() {
    let (engine, _db) = engine_with_db().await;
    let (group_id, m) = group_with_members(&engine, 2).await;
    let outsider = Uuid::new_v4();

    let cmd = |payer, receiver, amount, requester| {
        RecordSettlementCmd::new(group_id, payer, receiver, cents(amount), day(5), requester)
    };

    let cases = [
        (cmd(m[0], m[1], 100, outsider), ErrorKind::Forbidden),
        (cmd(outsider, m[1], 100, m[0]), ErrorKind::FromUserNotMember),
        (cmd(m[0], outsider, 100, m[0]), ErrorKind::ToUserNotMember),
        (cmd(m[0], m[0], 100, m[0]), ErrorKind::SameUser),
        (cmd(m[0], m[1], 0, m[0]), ErrorKind::InvalidAmount),
        (cmd(m[0], m[1], -100, m[0]), ErrorKind::InvalidAmount),
    ];
    for (cmd, expected) in cases {
        let err = engine.record_settlement(cmd).await.unwrap_err();
        assert_eq!(err.kind(), expected);
    }

    let err = engine
        .record_settlement(RecordSettlementCmd::new(
            Uuid::new_v4(),
            m[0],
            m[1],
            cents(100),
            day(5),
            m[0],
        ))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
}

#[tokio::test]
async fn ledger_insert_fault_rolls_back_the_settlement() {
    let (engine, db) = engine_with_db().await;
    let (group_id, m) = group_with_members(&engine, 2).await;

    let backend = db.get_database_backend();
    db.execute(Statement::from_string(
        backend,
        "CREATE TRIGGER inject_ledger_fault BEFORE INSERT ON ledger_entries \
         WHEN NEW.direction = 'credit' \
         BEGIN SELECT RAISE(ABORT, 'injected fault'); END;"
            .to_string(),
    ))
    .await
    .unwrap();

    let err = engine
        .record_settlement(RecordSettlementCmd::new(
            group_id,
            m[0],
            m[1],
            cents(500),
            day(1),
            m[0],
        ))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FailedToCreateSettlement);

    // The debit row was inserted before the fault and must be gone too.
    assert_eq!(count_rows(&db, "settlements").await, 0);
    assert_eq!(count_rows(&db, "ledger_entries").await, 0);
}

#[tokio::test]
async fn settlements_are_listed_most_recent_first() {
    let (engine, _db) = engine_with_db().await;
    let (group_id, m) = group_with_members(&engine, 2).await;

    let mut ids = Vec::new();
    for d in [2, 9, 4] {
        let id = engine
            .record_settlement(RecordSettlementCmd::new(
                group_id,
                m[0],
                m[1],
                cents(100),
                day(d),
                m[0],
            ))
            .await
            .unwrap();
        ids.push(id);
    }

    let listed: Vec<_> = engine
        .list_settlements(group_id, m[1])
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.id)
        .collect();
    assert_eq!(listed, vec![ids[1], ids[2], ids[0]]);
}
