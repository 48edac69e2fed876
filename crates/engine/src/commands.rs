//! Command structs for engine write operations.
//!
//! These types group the parameters of expense, settlement and member
//! creation, keeping call sites readable and avoiding long argument lists.
//! Shape checks (positive amounts, well-formed share rows) run on the command
//! before any database work.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::MoneyCents;

/// One participant row of an expense split.
///
/// Exactly one of `share_amount` / `share_percent` must be set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParticipantShare {
    pub member_id: Uuid,
    pub share_amount: Option<MoneyCents>,
    pub share_percent: Option<Decimal>,
}

impl ParticipantShare {
    /// A participant with no share yet; set one with the builder methods.
    #[must_use]
    pub fn new(member_id: Uuid) -> Self {
        Self {
            member_id,
            share_amount: None,
            share_percent: None,
        }
    }

    /// A participant owing a fixed amount.
    #[must_use]
    pub fn amount(member_id: Uuid, amount: MoneyCents) -> Self {
        Self::new(member_id).share_amount(amount)
    }

    /// A participant owing a percentage (0..=100) of the total.
    #[must_use]
    pub fn percent(member_id: Uuid, percent: Decimal) -> Self {
        Self::new(member_id).share_percent(percent)
    }

    #[must_use]
    pub fn share_amount(mut self, amount: MoneyCents) -> Self {
        self.share_amount = Some(amount);
        self
    }

    #[must_use]
    pub fn share_percent(mut self, percent: Decimal) -> Self {
        self.share_percent = Some(percent);
        self
    }
}

/// Record an expense paid by one member and split among participants.
#[derive(Clone, Debug)]
pub struct RecordExpenseCmd {
    pub group_id: Uuid,
    pub payer_id: Uuid,
    pub total: MoneyCents,
    pub description: Option<String>,
    pub location: Option<String>,
    /// Defaults to the time of recording.
    pub paid_at: Option<DateTime<Utc>>,
    pub participants: Vec<ParticipantShare>,
    pub requester_id: Uuid,
}

impl RecordExpenseCmd {
    #[must_use]
    pub fn new(group_id: Uuid, payer_id: Uuid, total: MoneyCents, requester_id: Uuid) -> Self {
        Self {
            group_id,
            payer_id,
            total,
            description: None,
            location: None,
            paid_at: None,
            participants: Vec::new(),
            requester_id,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    #[must_use]
    pub fn paid_at(mut self, paid_at: DateTime<Utc>) -> Self {
        self.paid_at = Some(paid_at);
        self
    }

    #[must_use]
    pub fn participant(mut self, participant: ParticipantShare) -> Self {
        self.participants.push(participant);
        self
    }

    #[must_use]
    pub fn participants(
        mut self,
        participants: impl IntoIterator<Item = ParticipantShare>,
    ) -> Self {
        self.participants.extend(participants);
        self
    }
}

/// Record a direct payment from one member to another.
#[derive(Clone, Debug)]
pub struct RecordSettlementCmd {
    pub group_id: Uuid,
    pub payer_id: Uuid,
    pub receiver_id: Uuid,
    pub amount: MoneyCents,
    pub paid_on: NaiveDate,
    pub requester_id: Uuid,
}

impl RecordSettlementCmd {
    #[must_use]
    pub fn new(
        group_id: Uuid,
        payer_id: Uuid,
        receiver_id: Uuid,
        amount: MoneyCents,
        paid_on: NaiveDate,
        requester_id: Uuid,
    ) -> Self {
        Self {
            group_id,
            payer_id,
            receiver_id,
            amount,
            paid_on,
            requester_id,
        }
    }
}

/// Register a new member (user) of the system.
#[derive(Clone, Debug)]
pub struct NewMember {
    pub display_name: String,
    pub contact: Option<String>,
    pub payment_identifier: Option<String>,
}

impl NewMember {
    #[must_use]
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            contact: None,
            payment_identifier: None,
        }
    }

    #[must_use]
    pub fn contact(mut self, contact: impl Into<String>) -> Self {
        self.contact = Some(contact.into());
        self
    }

    #[must_use]
    pub fn payment_identifier(mut self, payment_identifier: impl Into<String>) -> Self {
        self.payment_identifier = Some(payment_identifier.into());
        self
    }
}
