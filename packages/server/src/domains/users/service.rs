use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use super::models::admin_user::{AdminUser, ListUsersFilters, NewUser, UserRole, UserUpdate};

#[derive(Debug, Error)]
pub enum UserError {
    #[error("User not found")]
    NotFound,
    #[error("Email already taken")]
    EmailTaken,
    #[error("Username already taken")]
    UsernameTaken,
    #[error("User is already active")]
    AlreadyActive,
    #[error("User is already inactive")]
    AlreadyInactive,
    #[error("{0}")]
    InvalidRequest(String),
    #[error(transparent)]
    Database(#[from] anyhow::Error),
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn list(&self, filters: &ListUsersFilters) -> Result<(Vec<AdminUser>, i64)>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<AdminUser>>;
    async fn find_by_username(&self, username: &str) -> Result<Option<AdminUser>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<AdminUser>>;
    async fn insert(&self, new_user: &NewUser) -> Result<AdminUser>;
    async fn update(
        &self,
        id: Uuid,
        username: &str,
        email: &str,
        role: UserRole,
    ) -> Result<Option<AdminUser>>;
    async fn set_active(&self, id: Uuid, is_active: bool) -> Result<Option<AdminUser>>;
    async fn soft_delete(&self, id: Uuid) -> Result<bool>;
}

#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn list(&self, filters: &ListUsersFilters) -> Result<(Vec<AdminUser>, i64)> {
        AdminUser::list(filters, &self.pool).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<AdminUser>> {
        AdminUser::find_by_id(id, &self.pool).await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<AdminUser>> {
        AdminUser::find_by_username(username, &self.pool).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<AdminUser>> {
        AdminUser::find_by_email(email, &self.pool).await
    }

    async fn insert(&self, new_user: &NewUser) -> Result<AdminUser> {
        AdminUser::insert(new_user, &self.pool).await
    }

    async fn update(
        &self,
        id: Uuid,
        username: &str,
        email: &str,
        role: UserRole,
    ) -> Result<Option<AdminUser>> {
        AdminUser::update(id, username, email, role, &self.pool).await
    }

    async fn set_active(&self, id: Uuid, is_active: bool) -> Result<Option<AdminUser>> {
        AdminUser::set_active(id, is_active, &self.pool).await
    }

    async fn soft_delete(&self, id: Uuid) -> Result<bool> {
        AdminUser::soft_delete(id, &self.pool).await
    }
}

/// Account management for the moderation console. Uniqueness checks run
/// before writes so takeover attempts surface as 409s rather than
/// constraint errors.
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    pub async fn list_users(
        &self,
        filters: &ListUsersFilters,
    ) -> Result<(Vec<AdminUser>, i64), UserError> {
        Ok(self.store.list(filters).await?)
    }

    pub async fn get_user(&self, id: Uuid) -> Result<AdminUser, UserError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or(UserError::NotFound)
    }

    pub async fn create_user(&self, new_user: NewUser) -> Result<AdminUser, UserError> {
        let username = new_user.username.trim();
        if username.is_empty() {
            return Err(UserError::InvalidRequest("Username is required".to_string()));
        }
        let email = new_user.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(UserError::InvalidRequest(
                "A valid email is required".to_string(),
            ));
        }

        if self.store.find_by_username(username).await?.is_some() {
            return Err(UserError::UsernameTaken);
        }
        if self.store.find_by_email(email).await?.is_some() {
            return Err(UserError::EmailTaken);
        }

        let user = self
            .store
            .insert(&NewUser {
                username: username.to_string(),
                email: email.to_string(),
                role: new_user.role,
            })
            .await?;
        Ok(user)
    }

    /// Merge semantics: absent fields keep their stored values
    pub async fn update_user(&self, id: Uuid, update: UserUpdate) -> Result<AdminUser, UserError> {
        let existing = self.get_user(id).await?;

        let username = match &update.username {
            Some(u) => {
                let u = u.trim();
                if u.is_empty() {
                    return Err(UserError::InvalidRequest(
                        "Username must not be empty".to_string(),
                    ));
                }
                u.to_string()
            }
            None => existing.username.clone(),
        };
        let email = match &update.email {
            Some(e) => {
                let e = e.trim();
                if e.is_empty() || !e.contains('@') {
                    return Err(UserError::InvalidRequest(
                        "A valid email is required".to_string(),
                    ));
                }
                e.to_string()
            }
            None => existing.email.clone(),
        };
        let role = match update.role {
            Some(role) => role,
            None => UserRole::parse(&existing.role)
                .ok_or_else(|| anyhow::anyhow!("unknown stored role {}", existing.role))?,
        };

        if username != existing.username {
            if let Some(other) = self.store.find_by_username(&username).await? {
                if other.id != id {
                    return Err(UserError::UsernameTaken);
                }
            }
        }
        if email != existing.email {
            if let Some(other) = self.store.find_by_email(&email).await? {
                if other.id != id {
                    return Err(UserError::EmailTaken);
                }
            }
        }

        self.store
            .update(id, &username, &email, role)
            .await?
            .ok_or(UserError::NotFound)
    }

    pub async fn activate_user(&self, id: Uuid) -> Result<AdminUser, UserError> {
        let user = self.get_user(id).await?;
        if user.is_active {
            return Err(UserError::AlreadyActive);
        }
        self.store
            .set_active(id, true)
            .await?
            .ok_or(UserError::NotFound)
    }

    pub async fn deactivate_user(&self, id: Uuid) -> Result<AdminUser, UserError> {
        let user = self.get_user(id).await?;
        if !user.is_active {
            return Err(UserError::AlreadyInactive);
        }
        self.store
            .set_active(id, false)
            .await?
            .ok_or(UserError::NotFound)
    }

    pub async fn delete_user(&self, id: Uuid) -> Result<(), UserError> {
        if self.store.soft_delete(id).await? {
            Ok(())
        } else {
            Err(UserError::NotFound)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::test_support::MockUserStore;

    fn service_with(store: MockUserStore) -> (UserService, Arc<MockUserStore>) {
        let store = Arc::new(store);
        (UserService::new(store.clone()), store)
    }

    #[tokio::test]
    async fn create_rejects_duplicate_username() {
        let store = MockUserStore::new();
        store.push_user(MockUserStore::user("mira", "mira@example.org", "editor"));
        let (service, _) = service_with(store);

        let err = service
            .create_user(NewUser {
                username: "mira".to_string(),
                email: "other@example.org".to_string(),
                role: UserRole::Viewer,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, UserError::UsernameTaken));
    }

    #[tokio::test]
    async fn create_validates_email_shape() {
        let (service, _) = service_with(MockUserStore::new());
        let err = service
            .create_user(NewUser {
                username: "mira".to_string(),
                email: "not-an-email".to_string(),
                role: UserRole::Viewer,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, UserError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn update_merges_absent_fields() {
        let store = MockUserStore::new();
        let user = MockUserStore::user("mira", "mira@example.org", "editor");
        let id = user.id;
        store.push_user(user);
        let (service, _) = service_with(store);

        let updated = service
            .update_user(
                id,
                UserUpdate {
                    role: Some(UserRole::Admin),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.username, "mira");
        assert_eq!(updated.email, "mira@example.org");
        assert_eq!(updated.role, "admin");
    }

    #[tokio::test]
    async fn activate_rejects_active_user() {
        let store = MockUserStore::new();
        let mut user = MockUserStore::user("mira", "mira@example.org", "editor");
        user.is_active = true;
        let id = user.id;
        store.push_user(user);
        let (service, _) = service_with(store);

        let err = service.activate_user(id).await.unwrap_err();
        assert!(matches!(err, UserError::AlreadyActive));
    }

    #[tokio::test]
    async fn delete_missing_user_is_not_found() {
        let (service, _) = service_with(MockUserStore::new());
        let err = service.delete_user(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, UserError::NotFound));
    }
}
