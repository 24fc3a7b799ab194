//! Resource models for the role-scoped endpoints.
//!
//! Shapes follow the backend's JSON. Fields the backend may omit are
//! optional or defaulted so a sparse row still deserializes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::models::{Profile, Role};

#[derive(Debug, Clone, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExamStatus {
    Draft,
    Scheduled,
    Active,
    Completed,
    ResultsPublished,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Exam {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,
    pub duration_minutes: u32,
    pub total_marks: u32,
    pub status: ExamStatus,
    #[serde(default)]
    pub teacher_id: Option<Uuid>,
    #[serde(default)]
    pub teacher_name: Option<String>,
    /// Student listings only
    #[serde(default)]
    pub already_submitted: Option<bool>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewExam {
    pub title: String,
    pub subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<DateTime<Utc>>,
    pub duration_minutes: u32,
    pub total_marks: u32,
}

impl NewExam {
    /// 60 minutes, 100 marks
    pub fn new(title: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            subject: subject.into(),
            description: None,
            scheduled_at: None,
            duration_minutes: 60,
            total_marks: 100,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExamCreated {
    pub message: String,
    /// Inserted row; the backend sends `{}` when the insert returned nothing
    #[serde(default)]
    pub exam: Option<serde_json::Value>,
}

impl ExamCreated {
    pub fn exam(&self) -> Option<Exam> {
        self.exam
            .as_ref()
            .and_then(|exam| serde_json::from_value(exam.clone()).ok())
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ExamUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_marks: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Mcq,
    Text,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Question {
    pub id: Uuid,
    pub exam_id: Uuid,
    pub question_text: String,
    pub question_type: QuestionType,
    #[serde(default)]
    pub options: Option<Vec<String>>,
    #[serde(default)]
    pub correct_answer: Option<String>,
    pub marks: u32,
    pub order_num: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewQuestion {
    pub question_text: String,
    pub question_type: QuestionType,
    pub options: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
    pub marks: u32,
    pub order_num: u32,
}

impl NewQuestion {
    pub fn text(question_text: impl Into<String>, marks: u32, order_num: u32) -> Self {
        Self {
            question_text: question_text.into(),
            question_type: QuestionType::Text,
            options: None,
            correct_answer: None,
            marks,
            order_num,
        }
    }

    /// Blank options are dropped
    pub fn mcq<I, S>(
        question_text: impl Into<String>,
        options: I,
        correct_answer: impl Into<String>,
        marks: u32,
        order_num: u32,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let options = options
            .into_iter()
            .map(Into::into)
            .map(|o: String| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();

        Self {
            question_text: question_text.into(),
            question_type: QuestionType::Mcq,
            options: Some(options),
            correct_answer: Some(correct_answer.into()),
            marks,
            order_num,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuestionsAdded {
    pub message: String,
    #[serde(default)]
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    InProgress,
    Submitted,
    Evaluated,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StudentSummary {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub reg_number: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Submission {
    pub id: Uuid,
    pub exam_id: Uuid,
    pub student_id: Uuid,
    pub status: SubmissionStatus,
    #[serde(default)]
    pub answers: Option<serde_json::Value>,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub student: Option<StudentSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    pub marks_obtained: f64,
    pub remarks: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EvaluationOutcome {
    pub message: String,
    pub grade: String,
    pub percentage: f64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ExamSummary {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExamResult {
    pub id: Uuid,
    pub exam_id: Uuid,
    pub marks_obtained: f64,
    pub total_marks: f64,
    pub percentage: f64,
    pub grade: String,
    #[serde(default)]
    pub remarks: Option<String>,
    #[serde(default)]
    pub published: Option<bool>,
    #[serde(default)]
    pub exam: Option<ExamSummary>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AdminDashboard {
    pub total_users: u64,
    pub total_teachers: u64,
    pub total_students: u64,
    pub total_exams: u64,
    pub total_submissions: u64,
    #[serde(default)]
    pub recent_exams: Vec<Exam>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TeacherDashboard {
    pub total_exams: u64,
    pub active_exams: u64,
    pub total_submissions: u64,
    pub pending_evaluations: u64,
    #[serde(default)]
    pub recent_exams: Vec<Exam>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StudentDashboard {
    #[serde(default)]
    pub upcoming_exams: Vec<Exam>,
    #[serde(default)]
    pub completed_exams: u64,
    #[serde(default)]
    pub total_submissions: u64,
    #[serde(default)]
    pub average_percentage: Option<f64>,
    #[serde(default)]
    pub recent_results: Vec<ExamResult>,
}

/// Admin-side profile edit; unset fields are left alone
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reg_number: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatedUser {
    pub message: String,
    pub user_id: Uuid,
}

/// Rows returned by the admin user listing
pub type UserList = Vec<Profile>;
