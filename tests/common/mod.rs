//! In-process fake of the ExamConnect backend and identity provider.
//!
//! Issues real HS256 tokens and checks them on every protected route, so the
//! client is exercised against the same bearer flow it meets in production.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::{Path, Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use uuid::Uuid;

use exam_connect::api::Navigator;
use exam_connect::auth::jwt::Claims;
use exam_connect::auth::{
    AuthStateEvent, CredentialStore, IdentityProvider, MemoryCredentialStore, Profile, ProviderError,
    ProviderSession, Role, StoreError,
};
use exam_connect::config::Config;

pub const PROVIDER_KEY: &str = "test-public-key";

/// Token issuing and validation, the way the real backend does it
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtService {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::default(),
        }
    }

    pub fn create_token(&self, user_id: Uuid, email: &str) -> String {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            email: Some(email.to_string()),
            iat: Some(now.timestamp()),
            exp: (now + chrono::Duration::hours(24)).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding_key).unwrap()
    }

    pub fn validate_token(&self, token: &str) -> Option<Claims> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .ok()
            .map(|data| data.claims)
    }
}

struct Account {
    password: String,
    profile: Profile,
}

#[derive(Default)]
pub struct Counters {
    pub logins: AtomicUsize,
    pub me: AtomicUsize,
    pub unauthorized: AtomicUsize,
    /// Requests to the bootstrap endpoints that carried an Authorization header
    pub signed_bootstrap_calls: AtomicUsize,
}

pub struct BackendState {
    jwt: JwtService,
    accounts: Mutex<HashMap<String, Account>>,
    /// Reject every bearer token, as if all sessions expired
    reject_all: AtomicBool,
    /// Identity provider stops recognising sessions
    provider_rejects: AtomicBool,
    pub counters: Counters,
    pub seen_auth_headers: Mutex<Vec<Option<String>>>,
}

impl BackendState {
    pub fn expire_all_sessions(&self) {
        self.reject_all.store(true, Ordering::SeqCst);
    }

    pub fn fail_provider_sessions(&self) {
        self.provider_rejects.store(true, Ordering::SeqCst);
    }

    pub fn issue_token(&self, email: &str) -> String {
        let accounts = self.accounts.lock();
        let account = accounts.get(email).expect("unknown test account");
        self.jwt.create_token(account.profile.id, email)
    }
}

pub struct FakeBackend {
    pub base_url: String,
    pub state: Arc<BackendState>,
}

impl FakeBackend {
    pub async fn start() -> Self {
        let state = Arc::new(BackendState {
            jwt: JwtService::new("test_secret"),
            accounts: Mutex::new(HashMap::new()),
            reject_all: AtomicBool::new(false),
            provider_rejects: AtomicBool::new(false),
            counters: Counters::default(),
            seen_auth_headers: Mutex::new(Vec::new()),
        });

        let protected = Router::new()
            .route("/api/auth/me", get(me))
            .route("/api/student/exams", get(student_exams))
            .route("/api/student/results", get(student_results))
            .route("/api/teacher/exams", get(teacher_exams).post(create_exam))
            .route("/api/teacher/exams/{exam_id}/questions", get(list_questions).post(add_questions))
            .route("/api/teacher/submissions/{submission_id}/evaluate", post(evaluate))
            .route("/api/admin/users", get(list_users))
            .layer(ServiceBuilder::new().layer(middleware::from_fn_with_state(state.clone(), require_auth)));

        let app = Router::new()
            .route("/api/auth/login", post(login))
            .route("/api/auth/register", post(register))
            .route("/auth/v1/user", get(provider_user))
            .route("/auth/v1/logout", post(provider_logout))
            .route("/api/test/unauthorized", get(always_unauthorized))
            .route("/api/test/slow-unauthorized", get(slow_unauthorized))
            .merge(protected)
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    pub fn add_account(&self, email: &str, password: &str, role: Role) -> Profile {
        let profile = Profile {
            id: Uuid::new_v4(),
            email: email.to_string(),
            full_name: format!("{} user", role),
            role,
            gender: None,
            department: Some("Physics".to_string()),
            reg_number: None,
        };
        self.state.accounts.lock().insert(
            email.to_string(),
            Account {
                password: password.to_string(),
                profile: profile.clone(),
            },
        );
        profile
    }

    pub fn config(&self) -> Config {
        let mut config = Config::for_backend(&self.base_url).unwrap();
        config.session.lookup_timeout = Duration::from_millis(300);
        config.api.request_timeout = Duration::from_secs(5);
        config
    }

    pub fn config_with_provider(&self) -> Config {
        let mut config = self.config();
        config.provider.url = Some(self.base_url.clone());
        config.provider.public_key = Some(PROVIDER_KEY.to_string());
        config
    }
}

#[derive(Clone)]
struct AuthUser {
    email: String,
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

fn bearer(req: &Request) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_string)
}

async fn require_auth(State(state): State<Arc<BackendState>>, mut req: Request, next: Next) -> Response {
    let token = bearer(&req);
    state.seen_auth_headers.lock().push(token.clone());

    let claims = token
        .filter(|_| !state.reject_all.load(Ordering::SeqCst))
        .and_then(|token| state.jwt.validate_token(&token));
    let Some(claims) = claims else {
        state.counters.unauthorized.fetch_add(1, Ordering::SeqCst);
        return detail(StatusCode::UNAUTHORIZED, "Invalid or expired token");
    };

    req.extensions_mut().insert(AuthUser {
        email: claims.email.unwrap_or_default(),
    });
    next.run(req).await
}

#[derive(Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

async fn login(State(state): State<Arc<BackendState>>, req: Request) -> Response {
    if bearer(&req).is_some() {
        state.counters.signed_bootstrap_calls.fetch_add(1, Ordering::SeqCst);
    }
    state.counters.logins.fetch_add(1, Ordering::SeqCst);

    let body = axum::body::to_bytes(req.into_body(), usize::MAX).await.unwrap();
    let Ok(body) = serde_json::from_slice::<LoginBody>(&body) else {
        return detail(StatusCode::UNPROCESSABLE_ENTITY, "Malformed login");
    };

    let accounts = state.accounts.lock();
    match accounts.get(&body.email) {
        Some(account) if account.password == body.password => {
            let token = state.jwt.create_token(account.profile.id, &body.email);
            Json(json!({
                "access_token": token,
                "token_type": "bearer",
                "user": account.profile,
            }))
            .into_response()
        }
        _ => detail(StatusCode::UNAUTHORIZED, "Invalid credentials"),
    }
}

async fn register(State(state): State<Arc<BackendState>>, req: Request) -> Response {
    if bearer(&req).is_some() {
        state.counters.signed_bootstrap_calls.fetch_add(1, Ordering::SeqCst);
    }
    let body = axum::body::to_bytes(req.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&body).unwrap();

    let email = body["email"].as_str().unwrap_or_default().to_string();
    let mut accounts = state.accounts.lock();
    if accounts.contains_key(&email) {
        return detail(StatusCode::BAD_REQUEST, "Registration failed: User already registered");
    }

    let profile: Profile = serde_json::from_value(json!({
        "id": Uuid::new_v4(),
        "email": email,
        "full_name": body["full_name"],
        "role": body["role"],
        "gender": body["gender"],
        "department": body.get("department"),
        "reg_number": body.get("reg_number"),
    }))
    .unwrap();
    accounts.insert(
        email.clone(),
        Account {
            password: body["password"].as_str().unwrap_or_default().to_string(),
            profile: profile.clone(),
        },
    );

    Json(json!({
        "message": "Registration successful",
        "user": { "id": profile.id, "email": email, "full_name": profile.full_name, "role": profile.role }
    }))
    .into_response()
}

async fn me(State(state): State<Arc<BackendState>>, Extension(user): Extension<AuthUser>) -> Response {
    state.counters.me.fetch_add(1, Ordering::SeqCst);
    match state.accounts.lock().get(&user.email) {
        Some(account) => Json(account.profile.clone()).into_response(),
        None => detail(StatusCode::NOT_FOUND, "User profile not found"),
    }
}

async fn student_exams() -> Json<Value> {
    Json(json!([{
        "id": "0d7c3c2e-8f43-4d0f-a4f5-4d9d8d5a1f10",
        "title": "Classical Mechanics",
        "subject": "Physics",
        "scheduled_at": "2025-03-01T09:00:00+00:00",
        "duration_minutes": 90,
        "total_marks": 100,
        "status": "scheduled",
        "teacher_name": "Dr. Okafor",
        "already_submitted": false
    }]))
}

async fn student_results() -> Json<Value> {
    Json(json!([{
        "id": "6f1e0d55-1a7b-4c7e-9a0e-3b0d9e6e9c21",
        "exam_id": "0d7c3c2e-8f43-4d0f-a4f5-4d9d8d5a1f10",
        "marks_obtained": 72.0,
        "total_marks": 100,
        "percentage": 72.0,
        "grade": "B+",
        "remarks": "Solid work",
        "published": true,
        "exam": { "title": "Classical Mechanics", "subject": "Physics" }
    }]))
}

async fn teacher_exams() -> Json<Value> {
    Json(json!([]))
}

async fn create_exam(Json(body): Json<Value>) -> Json<Value> {
    Json(json!({
        "message": "Exam created",
        "exam": {
            "id": Uuid::new_v4(),
            "title": body["title"],
            "subject": body["subject"],
            "duration_minutes": body["duration_minutes"],
            "total_marks": body["total_marks"],
            "status": "draft"
        }
    }))
}

async fn list_questions(Path(exam_id): Path<Uuid>) -> Json<Value> {
    Json(json!([{
        "id": Uuid::new_v4(),
        "exam_id": exam_id,
        "question_text": "State Newton's second law",
        "question_type": "text",
        "options": null,
        "marks": 10,
        "order_num": 1
    }]))
}

async fn add_questions(Path(exam_id): Path<Uuid>, Json(body): Json<Vec<Value>>) -> Json<Value> {
    let questions: Vec<Value> = body
        .into_iter()
        .map(|mut q| {
            q["id"] = json!(Uuid::new_v4());
            q["exam_id"] = json!(exam_id);
            q
        })
        .collect();
    Json(json!({
        "message": format!("{} questions added", questions.len()),
        "questions": questions
    }))
}

async fn evaluate(Path(_submission_id): Path<Uuid>, Json(body): Json<Value>) -> Response {
    let marks = body["marks_obtained"].as_f64().unwrap_or_default();
    if marks > 100.0 {
        return detail(StatusCode::BAD_REQUEST, "Marks cannot exceed total marks (100)");
    }
    Json(json!({ "message": "Submission evaluated", "grade": "A", "percentage": marks })).into_response()
}

async fn list_users() -> Response {
    detail(StatusCode::FORBIDDEN, "Access denied. Required role: admin")
}

async fn provider_user(State(state): State<Arc<BackendState>>, req: Request) -> Response {
    let apikey_ok = req
        .headers()
        .get("apikey")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == PROVIDER_KEY);
    if !apikey_ok {
        return StatusCode::BAD_REQUEST.into_response();
    }
    if state.provider_rejects.load(Ordering::SeqCst) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    match bearer(&req).and_then(|token| state.jwt.validate_token(&token)) {
        Some(claims) => Json(json!({ "id": claims.sub, "email": claims.email })).into_response(),
        None => StatusCode::UNAUTHORIZED.into_response(),
    }
}

async fn always_unauthorized() -> Response {
    detail(StatusCode::UNAUTHORIZED, "Invalid or expired token")
}

/// A 401 that arrives long after the request went out
async fn slow_unauthorized() -> Response {
    tokio::time::sleep(Duration::from_millis(400)).await;
    detail(StatusCode::UNAUTHORIZED, "Invalid or expired token")
}

async fn provider_logout() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// Counts how often the login redirect fires
#[derive(Default)]
pub struct CountingNavigator(pub AtomicUsize);

impl CountingNavigator {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl Navigator for CountingNavigator {
    fn navigate_to_login(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// Memory store that counts clears
#[derive(Default)]
pub struct CountingStore {
    inner: MemoryCredentialStore,
    pub clears: AtomicUsize,
}

impl CountingStore {
    pub fn clear_count(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }
}

impl CredentialStore for CountingStore {
    fn save(&self, token: &str) -> Result<(), StoreError> {
        self.inner.save(token)
    }

    fn load(&self) -> Option<String> {
        self.inner.load()
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.clears.fetch_add(1, Ordering::SeqCst);
        self.inner.clear()
    }
}

/// Identity provider whose every call hangs, like a filtered network
pub struct BlackholeProvider {
    events: broadcast::Sender<AuthStateEvent>,
}

impl BlackholeProvider {
    pub fn new() -> Self {
        Self {
            events: broadcast::channel(4).0,
        }
    }
}

#[async_trait]
impl IdentityProvider for BlackholeProvider {
    async fn get_session(&self) -> Result<Option<ProviderSession>, ProviderError> {
        futures::future::pending().await
    }

    async fn set_session(&self, _: &str, _: &str) -> Result<(), ProviderError> {
        futures::future::pending().await
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        futures::future::pending().await
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthStateEvent> {
        self.events.subscribe()
    }
}
