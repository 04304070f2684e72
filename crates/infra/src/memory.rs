//! In-memory store for tests and development.

use std::collections::HashMap;
use std::sync::RwLock;

use taxtally_core::{CalculationId, ReminderId, UserId};

use crate::records::{CalculationRecord, ReminderPatch, ReminderRecord, UserRecord};
use crate::store::{StoreError, TaxStore};

/// Process-local [`TaxStore`] backed by hash maps.
///
/// Uniqueness and ownership checks run under the same write guard as the
/// mutation they protect, so concurrent requests cannot interleave between
/// check and write.
#[derive(Debug, Default)]
pub struct InMemoryTaxStore {
    users: RwLock<HashMap<UserId, UserRecord>>,
    calculations: RwLock<HashMap<CalculationId, CalculationRecord>>,
    reminders: RwLock<HashMap<ReminderId, ReminderRecord>>,
}

impl InMemoryTaxStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned(collection: &str) -> StoreError {
    StoreError::backend(format!("{collection} lock poisoned"))
}

#[async_trait::async_trait]
impl TaxStore for InMemoryTaxStore {
    async fn insert_user(&self, user: UserRecord) -> Result<(), StoreError> {
        let mut users = self.users.write().map_err(|_| poisoned("users"))?;
        if users.values().any(|u| u.email == user.email) {
            return Err(StoreError::DuplicateEmail);
        }
        users.insert(user.id, user);
        Ok(())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let users = self.users.read().map_err(|_| poisoned("users"))?;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<UserRecord>, StoreError> {
        let users = self.users.read().map_err(|_| poisoned("users"))?;
        Ok(users.get(&id).cloned())
    }

    async fn insert_calculation(&self, calculation: CalculationRecord) -> Result<(), StoreError> {
        let mut calculations = self
            .calculations
            .write()
            .map_err(|_| poisoned("calculations"))?;
        calculations.insert(calculation.id, calculation);
        Ok(())
    }

    async fn list_calculations(
        &self,
        owner: UserId,
        limit: usize,
    ) -> Result<Vec<CalculationRecord>, StoreError> {
        let calculations = self
            .calculations
            .read()
            .map_err(|_| poisoned("calculations"))?;
        let mut owned: Vec<CalculationRecord> = calculations
            .values()
            .filter(|c| c.owner_id == owner)
            .cloned()
            .collect();
        // Newest first; ids are time-ordered, which breaks created_at ties.
        owned.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.as_uuid().cmp(a.id.as_uuid()))
        });
        owned.truncate(limit);
        Ok(owned)
    }

    async fn delete_calculation(
        &self,
        owner: UserId,
        id: CalculationId,
    ) -> Result<bool, StoreError> {
        let mut calculations = self
            .calculations
            .write()
            .map_err(|_| poisoned("calculations"))?;
        match calculations.get(&id) {
            Some(c) if c.owner_id == owner => {
                calculations.remove(&id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn insert_reminder(&self, reminder: ReminderRecord) -> Result<(), StoreError> {
        let mut reminders = self.reminders.write().map_err(|_| poisoned("reminders"))?;
        reminders.insert(reminder.id, reminder);
        Ok(())
    }

    async fn list_reminders(
        &self,
        owner: UserId,
        limit: usize,
    ) -> Result<Vec<ReminderRecord>, StoreError> {
        let reminders = self.reminders.read().map_err(|_| poisoned("reminders"))?;
        let mut owned: Vec<ReminderRecord> = reminders
            .values()
            .filter(|r| r.owner_id == owner)
            .cloned()
            .collect();
        owned.sort_by(|a, b| {
            a.due_date
                .cmp(&b.due_date)
                .then_with(|| a.id.as_uuid().cmp(b.id.as_uuid()))
        });
        owned.truncate(limit);
        Ok(owned)
    }

    async fn update_reminder(
        &self,
        owner: UserId,
        id: ReminderId,
        patch: ReminderPatch,
    ) -> Result<Option<ReminderRecord>, StoreError> {
        let mut reminders = self.reminders.write().map_err(|_| poisoned("reminders"))?;
        match reminders.get_mut(&id) {
            Some(r) if r.owner_id == owner => {
                patch.apply(r);
                Ok(Some(r.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn delete_reminder(&self, owner: UserId, id: ReminderId) -> Result<bool, StoreError> {
        let mut reminders = self.reminders.write().map_err(|_| poisoned("reminders"))?;
        match reminders.get(&id) {
            Some(r) if r.owner_id == owner => {
                reminders.remove(&id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
