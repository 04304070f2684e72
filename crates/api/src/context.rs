use taxtally_core::UserId;
use taxtally_infra::UserRecord;

/// Authenticated user for a request.
///
/// Inserted by the auth middleware once the token subject has been resolved
/// against the store, and present on all protected routes.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    user: UserRecord,
}

impl CurrentUser {
    pub fn new(user: UserRecord) -> Self {
        Self { user }
    }

    pub fn id(&self) -> UserId {
        self.user.id
    }

    pub fn user(&self) -> &UserRecord {
        &self.user
    }
}
