//! Storage abstraction over the three collections.

use thiserror::Error;

use taxtally_core::{CalculationId, ReminderId, UserId};

use crate::records::{CalculationRecord, ReminderPatch, ReminderRecord, UserRecord};

/// Storage failure.
///
/// `DuplicateEmail` is the one business-visible case; everything else is an
/// opaque backend problem the HTTP layer reports as a 500 without detail.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("email already registered")]
    DuplicateEmail,

    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

/// Persistence for users, calculations, and reminders.
///
/// Every operation on an owned resource filters by the resource id **and**
/// the owning user id together; a miss on either looks identical to the
/// caller. Misses are encoded in the `Ok` shape (`Option` / `bool`), not as
/// errors.
#[async_trait::async_trait]
pub trait TaxStore: Send + Sync {
    /// Insert a new user. Fails with [`StoreError::DuplicateEmail`] when the
    /// email is already registered; the check and the insert are atomic.
    async fn insert_user(&self, user: UserRecord) -> Result<(), StoreError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError>;

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<UserRecord>, StoreError>;

    async fn insert_calculation(&self, calculation: CalculationRecord) -> Result<(), StoreError>;

    /// Calculations owned by `owner`, newest first, at most `limit`.
    async fn list_calculations(
        &self,
        owner: UserId,
        limit: usize,
    ) -> Result<Vec<CalculationRecord>, StoreError>;

    /// Returns true when a record was deleted, false when nothing matched.
    async fn delete_calculation(
        &self,
        owner: UserId,
        id: CalculationId,
    ) -> Result<bool, StoreError>;

    async fn insert_reminder(&self, reminder: ReminderRecord) -> Result<(), StoreError>;

    /// Reminders owned by `owner`, soonest due first, at most `limit`.
    async fn list_reminders(
        &self,
        owner: UserId,
        limit: usize,
    ) -> Result<Vec<ReminderRecord>, StoreError>;

    /// Apply `patch` to the matching reminder and return the updated record,
    /// or `None` when nothing matched.
    async fn update_reminder(
        &self,
        owner: UserId,
        id: ReminderId,
        patch: ReminderPatch,
    ) -> Result<Option<ReminderRecord>, StoreError>;

    /// Returns true when a record was deleted, false when nothing matched.
    async fn delete_reminder(&self, owner: UserId, id: ReminderId) -> Result<bool, StoreError>;
}
