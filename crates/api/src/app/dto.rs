use serde::Deserialize;
use serde_json::{Map, Value};

use taxtally_infra::{CalculationRecord, ReminderPatch, ReminderRecord, UserRecord};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateCalculationRequest {
    pub calc_type: String,
    pub inputs: Map<String, Value>,
    pub results: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct CreateReminderRequest {
    pub title: String,
    pub description: String,
    pub due_date: String,
    pub category: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateReminderRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<String>,
    pub category: Option<String>,
    pub completed: Option<bool>,
}

impl UpdateReminderRequest {
    pub fn into_patch(self) -> ReminderPatch {
        ReminderPatch {
            title: self.title,
            description: self.description,
            due_date: self.due_date,
            category: self.category,
            completed: self.completed,
        }
    }
}

// -------------------------
// JSON mapping helpers
// -------------------------

/// Public shape of a user; the password hash never leaves the server.
pub fn user_to_json(user: &UserRecord) -> Value {
    serde_json::json!({
        "id": user.id.to_string(),
        "name": user.name,
        "email": user.email,
    })
}

/// Stored calculation minus the owning user id.
pub fn calculation_to_json(calculation: &CalculationRecord) -> Value {
    serde_json::json!({
        "id": calculation.id.to_string(),
        "calc_type": calculation.calc_type,
        "inputs": calculation.inputs,
        "results": calculation.results,
        "created_at": calculation.created_at,
    })
}

/// Stored reminder minus the owning user id.
pub fn reminder_to_json(reminder: &ReminderRecord) -> Value {
    serde_json::json!({
        "id": reminder.id.to_string(),
        "title": reminder.title,
        "description": reminder.description,
        "due_date": reminder.due_date,
        "category": reminder.category,
        "completed": reminder.completed,
        "created_at": reminder.created_at,
    })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use taxtally_core::{CalculationId, UserId};

    use super::*;

    #[test]
    fn user_json_omits_the_password_hash() {
        let user = UserRecord {
            id: UserId::new(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password_hash: "$2b$12$secret".to_string(),
            created_at: Utc::now(),
        };

        let json = user_to_json(&user);
        let keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["id", "name", "email"]);
    }

    #[test]
    fn calculation_json_omits_the_owner() {
        let calculation = CalculationRecord {
            id: CalculationId::new(),
            owner_id: UserId::new(),
            calc_type: "income_tax".to_string(),
            inputs: Map::new(),
            results: Map::new(),
            created_at: Utc::now(),
        };

        let json = calculation_to_json(&calculation);
        let object = json.as_object().unwrap();
        assert!(object.contains_key("created_at"));
        assert!(!object.contains_key("owner_id"));
    }

    #[test]
    fn empty_update_body_becomes_an_empty_patch() {
        let request: UpdateReminderRequest = serde_json::from_str("{}").unwrap();
        assert!(request.into_patch().is_empty());
    }
}
