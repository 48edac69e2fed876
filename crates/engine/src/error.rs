//! The module contains the errors the engine can return.
//!
//! Every variant maps to one stable [`ErrorKind`] (see [`EngineError::kind`]),
//! whose [`code`](ErrorKind::code) is what callers should match on when they
//! need to translate an engine failure into a transport status.
//!
//! No error leaves partial side effects: validation runs before any write and
//! every write happens inside a single database transaction.
use sea_orm::DbErr;
use serde::Serialize;
use thiserror::Error;

/// Message raised by the ledger guard triggers on `UPDATE`/`DELETE`.
pub(crate) const LEDGER_IMMUTABLE: &str = "LEDGER_IMMUTABLE";

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("user not found: {0}")]
    UserNotFound(String),
    #[error("group not found: {0}")]
    GroupNotFound(String),
    #[error("expense not found: {0}")]
    ExpenseNotFound(String),
    #[error("settlement not found: {0}")]
    SettlementNotFound(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("payer is not a member of the group: {0}")]
    PayerNotMember(String),
    #[error("participant is not a member of the group: {0}")]
    ParticipantNotMember(String),
    #[error("payer is not a member of the group: {0}")]
    FromUserNotMember(String),
    #[error("receiver is not a member of the group: {0}")]
    ToUserNotMember(String),
    #[error("Invalid participant data: {0}")]
    InvalidParticipantData(String),
    #[error("split amounts do not add up to the total: {0}")]
    PartsSumMismatch(String),
    #[error("payer and receiver must differ: {0}")]
    SameUser(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid receipt: {0}")]
    InvalidReceipt(String),
    #[error("Invalid id: {0}")]
    InvalidId(String),
    #[error("Invalid name: {0}")]
    InvalidName(String),
    #[error("\"{0}\" already a member!")]
    AlreadyMember(String),
    #[error("cannot remove a member with a non-zero balance: {0}")]
    CannotRemoveMemberWithBalance(String),
    #[error("ledger entries are immutable: {0}")]
    LedgerImmutable(String),
    #[error("failed to create expense: {0}")]
    FailedToCreateExpense(String),
    #[error("failed to create settlement: {0}")]
    FailedToCreateSettlement(String),
    #[error(transparent)]
    Database(DbErr),
}

/// Stable, transport-independent identity of an [`EngineError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    UserNotFound,
    GroupNotFound,
    ExpenseNotFound,
    SettlementNotFound,
    Forbidden,
    PayerNotMember,
    ParticipantNotMember,
    FromUserNotMember,
    ToUserNotMember,
    InvalidParticipantData,
    PartsSumMismatch,
    SameUser,
    InvalidAmount,
    InvalidReceipt,
    InvalidId,
    InvalidName,
    AlreadyMember,
    CannotRemoveMemberWithBalance,
    LedgerImmutable,
    FailedToCreateExpense,
    FailedToCreateSettlement,
    Database,
}

/// Coarse grouping of error kinds, one per transport status class.
///
/// An HTTP boundary maps these to 404, 403, 400, 409 and 500 respectively.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    NotFound,
    Forbidden,
    Validation,
    Conflict,
    Internal,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::GroupNotFound => "GROUP_NOT_FOUND",
            Self::ExpenseNotFound => "EXPENSE_NOT_FOUND",
            Self::SettlementNotFound => "SETTLEMENT_NOT_FOUND",
            Self::Forbidden => "FORBIDDEN",
            Self::PayerNotMember => "PAYER_NOT_MEMBER",
            Self::ParticipantNotMember => "PARTICIPANT_NOT_MEMBER",
            Self::FromUserNotMember => "FROM_USER_NOT_MEMBER",
            Self::ToUserNotMember => "TO_USER_NOT_MEMBER",
            Self::InvalidParticipantData => "INVALID_PARTICIPANT_DATA",
            Self::PartsSumMismatch => "PARTS_SUM_MISMATCH",
            Self::SameUser => "SAME_USER",
            Self::InvalidAmount => "INVALID_AMOUNT",
            Self::InvalidReceipt => "INVALID_RECEIPT",
            Self::InvalidId => "INVALID_ID",
            Self::InvalidName => "INVALID_NAME",
            Self::AlreadyMember => "ALREADY_MEMBER",
            Self::CannotRemoveMemberWithBalance => "CANNOT_REMOVE_MEMBER_WITH_BALANCE",
            Self::LedgerImmutable => "LEDGER_IMMUTABLE",
            Self::FailedToCreateExpense => "FAILED_TO_CREATE_EXPENSE",
            Self::FailedToCreateSettlement => "FAILED_TO_CREATE_SETTLEMENT",
            Self::Database => "DATABASE",
        }
    }

    #[must_use]
    pub const fn category(self) -> ErrorCategory {
        match self {
            Self::UserNotFound
            | Self::GroupNotFound
            | Self::ExpenseNotFound
            | Self::SettlementNotFound => ErrorCategory::NotFound,
            Self::Forbidden => ErrorCategory::Forbidden,
            Self::PayerNotMember
            | Self::ParticipantNotMember
            | Self::FromUserNotMember
            | Self::ToUserNotMember
            | Self::InvalidParticipantData
            | Self::PartsSumMismatch
            | Self::SameUser
            | Self::InvalidAmount
            | Self::InvalidReceipt
            | Self::InvalidId
            | Self::InvalidName => ErrorCategory::Validation,
            Self::AlreadyMember | Self::CannotRemoveMemberWithBalance => ErrorCategory::Conflict,
            Self::LedgerImmutable
            | Self::FailedToCreateExpense
            | Self::FailedToCreateSettlement
            | Self::Database => ErrorCategory::Internal,
        }
    }
}

impl core::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

impl EngineError {
    /// Returns the stable kind of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UserNotFound(_) => ErrorKind::UserNotFound,
            Self::GroupNotFound(_) => ErrorKind::GroupNotFound,
            Self::ExpenseNotFound(_) => ErrorKind::ExpenseNotFound,
            Self::SettlementNotFound(_) => ErrorKind::SettlementNotFound,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::PayerNotMember(_) => ErrorKind::PayerNotMember,
            Self::ParticipantNotMember(_) => ErrorKind::ParticipantNotMember,
            Self::FromUserNotMember(_) => ErrorKind::FromUserNotMember,
            Self::ToUserNotMember(_) => ErrorKind::ToUserNotMember,
            Self::InvalidParticipantData(_) => ErrorKind::InvalidParticipantData,
            Self::PartsSumMismatch(_) => ErrorKind::PartsSumMismatch,
            Self::SameUser(_) => ErrorKind::SameUser,
            Self::InvalidAmount(_) => ErrorKind::InvalidAmount,
            Self::InvalidReceipt(_) => ErrorKind::InvalidReceipt,
            Self::InvalidId(_) => ErrorKind::InvalidId,
            Self::InvalidName(_) => ErrorKind::InvalidName,
            Self::AlreadyMember(_) => ErrorKind::AlreadyMember,
            Self::CannotRemoveMemberWithBalance(_) => ErrorKind::CannotRemoveMemberWithBalance,
            Self::LedgerImmutable(_) => ErrorKind::LedgerImmutable,
            Self::FailedToCreateExpense(_) => ErrorKind::FailedToCreateExpense,
            Self::FailedToCreateSettlement(_) => ErrorKind::FailedToCreateSettlement,
            Self::Database(_) => ErrorKind::Database,
        }
    }
}

impl From<DbErr> for EngineError {
    /// Storage errors raised by the ledger guard are surfaced as
    /// [`EngineError::LedgerImmutable`]; everything else stays a database
    /// error.
    fn from(err: DbErr) -> Self {
        let message = err.to_string();
        if message.contains(LEDGER_IMMUTABLE) {
            return Self::LedgerImmutable(message);
        }
        Self::Database(err)
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            (a, b) => a.kind() == b.kind() && a.to_string() == b.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_abort_maps_to_ledger_immutable() {
        let err = EngineError::from(DbErr::Custom(
            "error returned from database: (code: 1811) LEDGER_IMMUTABLE".to_string(),
        ));
        assert_eq!(err.kind(), ErrorKind::LedgerImmutable);
        assert_eq!(err.kind().category(), ErrorCategory::Internal);
    }

    #[test]
    fn other_db_errors_stay_database() {
        let err = EngineError::from(DbErr::Custom("disk I/O error".to_string()));
        assert_eq!(err.kind(), ErrorKind::Database);
    }

    #[test]
    fn kinds_have_stable_codes_and_categories() {
        let err = EngineError::PartsSumMismatch("x".to_string());
        assert_eq!(err.kind().code(), "PARTS_SUM_MISMATCH");
        assert_eq!(err.kind().category(), ErrorCategory::Validation);
        assert_eq!(
            EngineError::GroupNotFound("g".to_string()).kind().category(),
            ErrorCategory::NotFound
        );
        assert_eq!(
            EngineError::CannotRemoveMemberWithBalance("m".to_string())
                .kind()
                .category(),
            ErrorCategory::Conflict
        );
        assert_eq!(ErrorKind::Forbidden.to_string(), "FORBIDDEN");
    }
}
