//! # API Module
//!
//! HTTP access to the ExamConnect backend: the signing client, its
//! authorization-failure handling, and typed call-throughs for the
//! role-scoped endpoints.

pub mod admin;
pub mod client;
pub mod error;
pub mod interceptor;
pub mod models;
pub mod student;
pub mod teacher;

pub use admin::AdminApi;
pub use client::ApiClient;
pub use error::ApiError;
pub use interceptor::{LOGIN_PATH, Navigator, SessionTerminator, TracingNavigator};
pub use student::StudentApi;
pub use teacher::TeacherApi;

impl ApiClient {
    pub fn admin(&self) -> AdminApi<'_> {
        AdminApi::new(self)
    }

    pub fn teacher(&self) -> TeacherApi<'_> {
        TeacherApi::new(self)
    }

    pub fn student(&self) -> StudentApi<'_> {
        StudentApi::new(self)
    }
}
