#![allow(dead_code)]

use chrono::NaiveDate;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};
use uuid::Uuid;

use engine::{
    Engine, MembershipRole, MoneyCents, NewMember, ParticipantShare, RecordExpenseCmd,
    RecordSettlementCmd,
};
use migration::MigratorTrait;

pub async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

/// Creates a group of `size` members; the first one is its admin.
pub async fn group_with_members(engine: &Engine, size: usize) -> (Uuid, Vec<Uuid>) {
    let mut members = Vec::with_capacity(size);
    for idx in 0..size {
        let id = engine
            .create_member(NewMember::new(format!("member-{idx}")))
            .await
            .unwrap();
        members.push(id);
    }
    let group_id = engine
        .create_group("Trip", Some("summer"), members[0])
        .await
        .unwrap();
    for member in &members[1..] {
        engine
            .add_member(group_id, *member, MembershipRole::Member, members[0])
            .await
            .unwrap();
    }
    (group_id, members)
}

pub fn cents(value: i64) -> MoneyCents {
    MoneyCents::new(value)
}

pub fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
}

/// `payer` pays for everyone in `shares`, each share a fixed amount.
pub async fn pay(
    engine: &Engine,
    group_id: Uuid,
    payer: Uuid,
    shares: &[(Uuid, i64)],
) -> Uuid {
    let total: i64 = shares.iter().map(|(_, amount)| amount).sum();
    let cmd = RecordExpenseCmd::new(group_id, payer, cents(total), payer).participants(
        shares
            .iter()
            .map(|(member, amount)| ParticipantShare::amount(*member, cents(*amount))),
    );
    engine.record_expense(cmd).await.unwrap()
}

pub async fn settle(
    engine: &Engine,
    group_id: Uuid,
    payer: Uuid,
    receiver: Uuid,
    amount: i64,
) -> Uuid {
    engine
        .record_settlement(RecordSettlementCmd::new(
            group_id,
            payer,
            receiver,
            cents(amount),
            day(2),
            payer,
        ))
        .await
        .unwrap()
}

pub async fn count_rows(db: &DatabaseConnection, table: &str) -> i64 {
    let backend = db.get_database_backend();
    let row = db
        .query_one(Statement::from_string(
            backend,
            format!("SELECT COUNT(*) AS n FROM {table}"),
        ))
        .await
        .unwrap()
        .unwrap();
    row.try_get::<i64>("", "n").unwrap()
}

pub async fn balance(engine: &Engine, group_id: Uuid, member_id: Uuid) -> MoneyCents {
    engine
        .member_balance(group_id, member_id, member_id)
        .await
        .unwrap()
}
