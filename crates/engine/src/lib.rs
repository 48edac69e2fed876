//! Group ledger and debt-settlement engine.
//!
//! Members of a group record shared expenses and direct settlements. Every
//! write turns into append-only [`LedgerEntry`] rows, and balances, summaries
//! and suggested transfers are always derived from those rows.

pub use allocation::{Allocation, NOISE_THRESHOLD, allocate_proportionally};
pub use commands::{NewMember, ParticipantShare, RecordExpenseCmd, RecordSettlementCmd};
pub use error::{EngineError, ErrorCategory, ErrorKind};
pub use expense_splits::ExpenseSplit;
pub use expenses::{Expense, SPLIT_TOLERANCE};
pub use groups::Group;
pub use ledger::{Direction, LedgerEntry, Origin};
pub use memberships::{Membership, MembershipRole};
pub use money::MoneyCents;
pub use ops::{Engine, EngineBuilder, GroupSummary, MemberSummary};
pub use receipts::Receipt;
pub use settlements::Settlement;
pub use users::Member;

mod allocation;
mod commands;
mod error;
mod expense_splits;
mod expenses;
mod groups;
mod ledger;
mod memberships;
mod money;
mod ops;
mod receipts;
mod settlements;
mod users;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
