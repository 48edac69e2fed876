//! Ledger immutability guard.
//!
//! `ledger_entries` is append-only. Two triggers abort any `UPDATE` or
//! `DELETE` on it with the message `LEDGER_IMMUTABLE` while the single row of
//! `ledger_guard` is armed. Group teardown is the only code path that disarms
//! the guard, and it does so inside its own transaction.

use sea_orm::{ConnectionTrait, DbBackend, Statement};
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum LedgerGuard {
    Table,
    Id,
    Armed,
}

const GUARD_TRIGGERS: [(&str, &str); 2] = [
    ("ledger_entries_no_update", "UPDATE"),
    ("ledger_entries_no_delete", "DELETE"),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        let backend = db.get_database_backend();
        if backend != DbBackend::Sqlite {
            return Err(DbErr::Migration(
                "the ledger guard is only implemented for sqlite".to_string(),
            ));
        }

        manager
            .create_table(
                Table::create()
                    .table(LedgerGuard::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LedgerGuard::Id)
                            .integer()
                            .not_null()
                            .primary_key()
                            .check(Expr::col(LedgerGuard::Id).eq(1)),
                    )
                    .col(ColumnDef::new(LedgerGuard::Armed).boolean().not_null())
                    .to_owned(),
            )
            .await?;

        db.execute(Statement::from_string(
            backend,
            "INSERT INTO ledger_guard (id, armed) VALUES (1, 1);".to_string(),
        ))
        .await?;

        for (name, event) in GUARD_TRIGGERS {
            db.execute(Statement::from_string(
                backend,
                format!(
                    "CREATE TRIGGER IF NOT EXISTS {name} BEFORE {event} ON ledger_entries \
                     WHEN (SELECT armed FROM ledger_guard WHERE id = 1) = 1 \
                     BEGIN SELECT RAISE(ABORT, 'LEDGER_IMMUTABLE'); END;"
                ),
            ))
            .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        let backend = db.get_database_backend();
        for (name, _) in GUARD_TRIGGERS {
            db.execute(Statement::from_string(
                backend,
                format!("DROP TRIGGER IF EXISTS {name};"),
            ))
            .await?;
        }
        manager
            .drop_table(Table::drop().table(LedgerGuard::Table).to_owned())
            .await?;
        Ok(())
    }
}
