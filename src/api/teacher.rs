//! Teacher endpoints (`/api/teacher/*`): exam CRUD, question authoring,
//! submission review and result publishing.

use uuid::Uuid;

use crate::api::client::ApiClient;
use crate::api::error::ApiError;
use crate::api::models::{
    Evaluation, EvaluationOutcome, Exam, ExamCreated, ExamUpdate, MessageResponse, NewExam, NewQuestion,
    Question, QuestionsAdded, Submission, TeacherDashboard,
};

pub struct TeacherApi<'a> {
    client: &'a ApiClient,
}

impl<'a> TeacherApi<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn dashboard(&self) -> Result<TeacherDashboard, ApiError> {
        self.client.get("/api/teacher/dashboard").await
    }

    pub async fn list_exams(&self) -> Result<Vec<Exam>, ApiError> {
        self.client.get("/api/teacher/exams").await
    }

    /// New exams start out as drafts
    pub async fn create_exam(&self, exam: &NewExam) -> Result<ExamCreated, ApiError> {
        self.client.post("/api/teacher/exams", exam).await
    }

    pub async fn get_exam(&self, exam_id: Uuid) -> Result<Exam, ApiError> {
        self.client.get(&format!("/api/teacher/exams/{}", exam_id)).await
    }

    pub async fn update_exam(&self, exam_id: Uuid, update: &ExamUpdate) -> Result<MessageResponse, ApiError> {
        self.client.put(&format!("/api/teacher/exams/{}", exam_id), update).await
    }

    pub async fn delete_exam(&self, exam_id: Uuid) -> Result<MessageResponse, ApiError> {
        self.client.delete(&format!("/api/teacher/exams/{}", exam_id)).await
    }

    pub async fn add_questions(&self, exam_id: Uuid, questions: &[NewQuestion]) -> Result<QuestionsAdded, ApiError> {
        self.client
            .post(&format!("/api/teacher/exams/{}/questions", exam_id), questions)
            .await
    }

    pub async fn list_questions(&self, exam_id: Uuid) -> Result<Vec<Question>, ApiError> {
        self.client.get(&format!("/api/teacher/exams/{}/questions", exam_id)).await
    }

    /// Order number for the next question appended to an exam
    pub async fn next_question_order(&self, exam_id: Uuid) -> Result<u32, ApiError> {
        let questions = self.list_questions(exam_id).await?;
        Ok(questions.len() as u32 + 1)
    }

    pub async fn publish_exam(&self, exam_id: Uuid) -> Result<MessageResponse, ApiError> {
        self.client
            .post_empty(&format!("/api/teacher/exams/{}/publish", exam_id))
            .await
    }

    pub async fn list_submissions(&self, exam_id: Uuid) -> Result<Vec<Submission>, ApiError> {
        self.client
            .get(&format!("/api/teacher/exams/{}/submissions", exam_id))
            .await
    }

    pub async fn evaluate_submission(
        &self,
        submission_id: Uuid,
        evaluation: &Evaluation,
    ) -> Result<EvaluationOutcome, ApiError> {
        self.client
            .post(&format!("/api/teacher/submissions/{}/evaluate", submission_id), evaluation)
            .await
    }

    pub async fn publish_results(&self, exam_id: Uuid) -> Result<MessageResponse, ApiError> {
        self.client
            .post_empty(&format!("/api/teacher/exams/{}/publish-results", exam_id))
            .await
    }
}
