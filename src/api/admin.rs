//! Admin endpoints (`/api/admin/*`)

use uuid::Uuid;

use crate::api::client::ApiClient;
use crate::api::error::ApiError;
use crate::api::models::{AdminDashboard, CreatedUser, MessageResponse, UserList, UserUpdate};
use crate::auth::models::{RegisterRequest, Role};

pub struct AdminApi<'a> {
    client: &'a ApiClient,
}

impl<'a> AdminApi<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn dashboard(&self) -> Result<AdminDashboard, ApiError> {
        self.client.get("/api/admin/dashboard").await
    }

    /// All profiles, optionally narrowed to one role
    pub async fn list_users(&self, role: Option<Role>) -> Result<UserList, ApiError> {
        match role {
            Some(role) => {
                self.client
                    .get_with_query("/api/admin/users", &[("role", role.as_str())])
                    .await
            }
            None => self.client.get("/api/admin/users").await,
        }
    }

    pub async fn create_user(&self, user: &RegisterRequest) -> Result<CreatedUser, ApiError> {
        self.client.post("/api/admin/users", user).await
    }

    pub async fn update_user(&self, user_id: Uuid, update: &UserUpdate) -> Result<MessageResponse, ApiError> {
        self.client.put(&format!("/api/admin/users/{}", user_id), update).await
    }

    pub async fn delete_user(&self, user_id: Uuid) -> Result<MessageResponse, ApiError> {
        self.client.delete(&format!("/api/admin/users/{}", user_id)).await
    }
}
