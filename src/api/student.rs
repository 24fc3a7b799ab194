//! Student endpoints (`/api/student/*`)

use crate::api::client::ApiClient;
use crate::api::error::ApiError;
use crate::api::models::{Exam, ExamResult, StudentDashboard};

pub struct StudentApi<'a> {
    client: &'a ApiClient,
}

impl<'a> StudentApi<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn dashboard(&self) -> Result<StudentDashboard, ApiError> {
        self.client.get("/api/student/dashboard").await
    }

    /// Published exams, flagged with whether this student already submitted
    pub async fn list_exams(&self) -> Result<Vec<Exam>, ApiError> {
        self.client.get("/api/student/exams").await
    }

    /// Published results only
    pub async fn list_results(&self) -> Result<Vec<ExamResult>, ApiError> {
        self.client.get("/api/student/results").await
    }
}
