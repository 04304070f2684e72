//! Stored record shapes for the three collections.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use taxtally_core::{CalculationId, ReminderId, UserId};

/// A registered user.
///
/// `email` is unique across the store (enforced at write time, see
/// [`crate::store::TaxStore::insert_user`]). `password_hash` is a bcrypt
/// digest, never the plaintext.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// A saved tax calculation.
///
/// `inputs` and `results` are opaque to the server: whatever ordered mapping
/// the client sent is stored and returned verbatim. `owner_id` scopes every
/// read and delete and is never exposed over HTTP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationRecord {
    pub id: CalculationId,
    pub owner_id: UserId,
    pub calc_type: String,
    pub inputs: Map<String, Value>,
    pub results: Map<String, Value>,
    pub created_at: DateTime<Utc>,
}

/// A due-date reminder.
///
/// `due_date` stays a plain date string; ISO dates sort correctly under the
/// lexicographic order the store uses. `completed` starts false and only
/// flips through an explicit update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderRecord {
    pub id: ReminderId,
    pub owner_id: UserId,
    pub title: String,
    pub description: String,
    pub due_date: String,
    pub category: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

/// Partial update for a reminder. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ReminderPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<String>,
    pub category: Option<String>,
    pub completed: Option<bool>,
}

impl ReminderPatch {
    /// True when no field was supplied at all.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.due_date.is_none()
            && self.category.is_none()
            && self.completed.is_none()
    }

    /// Apply the supplied fields onto `reminder`.
    pub fn apply(&self, reminder: &mut ReminderRecord) {
        if let Some(title) = &self.title {
            reminder.title = title.clone();
        }
        if let Some(description) = &self.description {
            reminder.description = description.clone();
        }
        if let Some(due_date) = &self.due_date {
            reminder.due_date = due_date.clone();
        }
        if let Some(category) = &self.category {
            reminder.category = category.clone();
        }
        if let Some(completed) = self.completed {
            reminder.completed = completed;
        }
    }
}
