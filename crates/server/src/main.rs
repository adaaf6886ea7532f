// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]
#![allow(clippy::multiple_crate_versions)]

mod session;

use axum::{
    Json, Router,
    extract::{Path, Query, State as AxumState},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
};
use chrono_tz::Tz;
use clap::Parser;
use roster::ApplyContext;
use roster_api::{
    ApiError, AuditTimelineResponse, BootstrapStatusResponse, CreateBulkDutiesRequest,
    CreateDutyRequest, CreateFirstAdminRequest, CreateGroupRequest, CreateUserRequest,
    DeleteResponse, DutyResponse, GroupInfo, GroupResponse, GroupScheduleRequest,
    GroupScheduleResponse, ListDutiesResponse, ListGroupsResponse, ListMembersResponse,
    ListUsersResponse, LoginRequest, LoginResponse, RankCatalogResponse, RegisterRequest,
    ToggleMemberRequest, UpdateDutyRequest, UpdateGroupRequest, UpdateProfileRequest,
    UpdateUserRequest, UserResponse, WhoAmIResponse,
};
use roster_audit::Cause;
use roster_domain::parse_timezone;
use roster_persistence::SqlitePersistence;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use time::{Duration, OffsetDateTime};
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::session::{BearerToken, SessionUser};

/// Roster Server - HTTP server for the duty roster
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the `SQLite` database file. If not provided, uses in-memory database.
    #[arg(short, long)]
    database: Option<String>,

    /// `MySQL`/`MariaDB` connection URL, used instead of `SQLite`.
    #[arg(long, conflicts_with = "database")]
    mysql_url: Option<String>,

    /// Port to bind the server to
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// Address to bind the server to
    #[arg(short, long, default_value = "127.0.0.1")]
    bind: String,

    /// IANA timezone of the roster, used for calendar days and times of day
    #[arg(short, long, default_value = "UTC")]
    timezone: String,

    /// Session lifetime in days
    #[arg(long, default_value_t = 7)]
    session_days: u32,
}

/// Application state shared across handlers.
///
/// The persistence layer is wrapped in a Mutex; every handler holds it for
/// the whole read-apply-persist sequence, which serializes writers.
#[derive(Clone)]
struct AppState {
    persistence: Arc<Mutex<SqlitePersistence>>,
    timezone: Tz,
    session_lifetime: Duration,
}

impl AppState {
    fn new(persistence: SqlitePersistence, timezone: Tz, session_lifetime: Duration) -> Self {
        Self {
            persistence: Arc::new(Mutex::new(persistence)),
            timezone,
            session_lifetime,
        }
    }

    /// A context pinned to the current wall-clock time.
    fn context(&self) -> ApplyContext {
        ApplyContext::new(self.timezone, OffsetDateTime::now_utc())
    }
}

/// Builds the audit cause for a request.
fn request_cause(description: &str) -> Cause {
    Cause::new(
        format!("http-{}", OffsetDateTime::now_utc().unix_timestamp_nanos()),
        description.to_string(),
    )
}

/// Query parameters for the audit timeline endpoint.
#[derive(Debug, Deserialize)]
struct AuditTimelineQuery {
    /// Maximum number of events.
    limit: Option<i64>,
}

/// API response for logout.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct LogoutResponse {
    message: String,
}

/// Error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Machine-readable error kind.
    pub error: String,
    /// Human-readable message.
    pub message: String,
}

/// HTTP error wrapper that implements `IntoResponse`.
struct HttpError {
    status: StatusCode,
    kind: &'static str,
    message: String,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let body: Json<ErrorResponse> = Json(ErrorResponse {
            error: self.kind.to_string(),
            message: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<ApiError> for HttpError {
    fn from(err: ApiError) -> Self {
        let (status, kind) = match &err {
            ApiError::AuthenticationFailed { .. } => {
                (StatusCode::UNAUTHORIZED, "authentication_failed")
            }
            ApiError::Unauthorized { .. } => (StatusCode::FORBIDDEN, "unauthorized"),
            ApiError::InvalidInput { .. } => (StatusCode::BAD_REQUEST, "invalid_input"),
            ApiError::PasswordPolicyViolation { .. } => {
                (StatusCode::BAD_REQUEST, "password_policy_violation")
            }
            ApiError::ResourceNotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::DomainRuleViolation { .. } => (StatusCode::CONFLICT, "rule_violation"),
            ApiError::Storage { .. } => {
                error!(error = %err, "Storage error");
                (StatusCode::INTERNAL_SERVER_ERROR, "storage_error")
            }
            ApiError::Internal { .. } => {
                error!(error = %err, "Internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        };
        Self {
            status,
            kind,
            message: err.to_string(),
        }
    }
}

// ========================================================================
// Bootstrap and identity
// ========================================================================

/// Handler for GET `/bootstrap/status`.
async fn handle_bootstrap_status(
    AxumState(app_state): AxumState<AppState>,
) -> Result<Json<BootstrapStatusResponse>, HttpError> {
    info!("Handling bootstrap_status request");

    let mut persistence = app_state.persistence.lock().await;
    let response: BootstrapStatusResponse = roster_api::get_bootstrap_status(&mut persistence)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for POST `/bootstrap/first-admin`.
///
/// Creates the first administrator while the roster has no users.
async fn handle_create_first_admin(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<CreateFirstAdminRequest>,
) -> Result<Json<LoginResponse>, HttpError> {
    info!(email = %req.email, "Handling create_first_admin request");

    let ctx: ApplyContext = app_state.context();
    let mut persistence = app_state.persistence.lock().await;
    let response: LoginResponse = roster_api::create_first_admin(
        &mut persistence,
        &ctx,
        &req,
        app_state.session_lifetime,
        request_cause("Bootstrap first administrator"),
    )?;
    drop(persistence);

    info!(user_id = response.user.user_id, "Created first administrator");
    Ok(Json(response))
}

/// Handler for POST `/auth/register`.
async fn handle_register(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<LoginResponse>, HttpError> {
    info!(email = %req.email, "Handling register request");

    let ctx: ApplyContext = app_state.context();
    let mut persistence = app_state.persistence.lock().await;
    let response: LoginResponse = roster_api::register(
        &mut persistence,
        &ctx,
        &req,
        app_state.session_lifetime,
        request_cause("Self registration"),
    )?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for POST `/auth/login`.
async fn handle_login(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, HttpError> {
    info!(email = %req.email, "Handling login request");

    let mut persistence = app_state.persistence.lock().await;
    let response: LoginResponse = roster_api::login(
        &mut persistence,
        &req,
        OffsetDateTime::now_utc(),
        app_state.session_lifetime,
    )?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for POST `/auth/logout`.
async fn handle_logout(
    AxumState(app_state): AxumState<AppState>,
    BearerToken(token): BearerToken,
) -> Result<Json<LogoutResponse>, HttpError> {
    info!("Handling logout request");

    let mut persistence = app_state.persistence.lock().await;
    roster_api::logout(&mut persistence, &token)?;
    drop(persistence);

    Ok(Json(LogoutResponse {
        message: String::from("Logged out"),
    }))
}

/// Handler for GET `/auth/me`.
async fn handle_whoami(
    AxumState(app_state): AxumState<AppState>,
    SessionUser(actor, user): SessionUser,
) -> Result<Json<WhoAmIResponse>, HttpError> {
    info!(
        user_id = actor.user_id,
        full_name = %user.full_name,
        "Handling whoami request"
    );

    let mut persistence = app_state.persistence.lock().await;
    let response: WhoAmIResponse = roster_api::whoami(&mut persistence, &actor)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for PATCH `/auth/me`.
async fn handle_update_profile(
    AxumState(app_state): AxumState<AppState>,
    SessionUser(actor, _user): SessionUser,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, HttpError> {
    info!(user_id = actor.user_id, "Handling update_profile request");

    let ctx: ApplyContext = app_state.context();
    let mut persistence = app_state.persistence.lock().await;
    let response: UserResponse = roster_api::update_profile(
        &mut persistence,
        &ctx,
        &req,
        &actor,
        request_cause("Profile update"),
    )?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for GET `/ranks`.
#[allow(clippy::unused_async)]
async fn handle_rank_catalog() -> Json<RankCatalogResponse> {
    Json(roster_api::rank_catalog())
}

// ========================================================================
// Users
// ========================================================================

/// Handler for GET `/users`.
async fn handle_list_users(
    AxumState(app_state): AxumState<AppState>,
    SessionUser(actor, _user): SessionUser,
) -> Result<Json<ListUsersResponse>, HttpError> {
    info!(user_id = actor.user_id, "Handling list_users request");

    let mut persistence = app_state.persistence.lock().await;
    let response: ListUsersResponse = roster_api::list_users(&mut persistence, &actor)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for POST `/users`.
async fn handle_create_user(
    AxumState(app_state): AxumState<AppState>,
    SessionUser(actor, _user): SessionUser,
    Json(req): Json<CreateUserRequest>,
) -> Result<Json<UserResponse>, HttpError> {
    info!(
        user_id = actor.user_id,
        full_name = %req.full_name,
        role = %req.role,
        "Handling create_user request"
    );

    let ctx: ApplyContext = app_state.context();
    let mut persistence = app_state.persistence.lock().await;
    let response: UserResponse = roster_api::create_user(
        &mut persistence,
        &ctx,
        &req,
        &actor,
        request_cause("Create user"),
    )?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for PATCH `/users/{user_id}`.
async fn handle_update_user(
    AxumState(app_state): AxumState<AppState>,
    SessionUser(actor, _user): SessionUser,
    Path(user_id): Path<i64>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, HttpError> {
    info!(
        user_id = actor.user_id,
        target_user_id = user_id,
        "Handling update_user request"
    );

    let ctx: ApplyContext = app_state.context();
    let mut persistence = app_state.persistence.lock().await;
    let response: UserResponse = roster_api::update_user(
        &mut persistence,
        &ctx,
        user_id,
        &req,
        &actor,
        request_cause("Update user"),
    )?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for DELETE `/users/{user_id}`.
async fn handle_delete_user(
    AxumState(app_state): AxumState<AppState>,
    SessionUser(actor, _user): SessionUser,
    Path(user_id): Path<i64>,
) -> Result<Json<DeleteResponse>, HttpError> {
    info!(
        user_id = actor.user_id,
        target_user_id = user_id,
        "Handling delete_user request"
    );

    let ctx: ApplyContext = app_state.context();
    let mut persistence = app_state.persistence.lock().await;
    let response: DeleteResponse = roster_api::delete_user(
        &mut persistence,
        &ctx,
        user_id,
        &actor,
        request_cause("Delete user"),
    )?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for GET `/users/{user_id}/duties`.
async fn handle_list_duties_for_user(
    AxumState(app_state): AxumState<AppState>,
    SessionUser(actor, _user): SessionUser,
    Path(user_id): Path<i64>,
) -> Result<Json<ListDutiesResponse>, HttpError> {
    info!(
        user_id = actor.user_id,
        target_user_id = user_id,
        "Handling list_duties_for_user request"
    );

    let mut persistence = app_state.persistence.lock().await;
    let response: ListDutiesResponse = roster_api::list_duties_for_user(
        &mut persistence,
        &actor,
        user_id,
        OffsetDateTime::now_utc(),
    )?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for GET `/users/{user_id}/groups`.
async fn handle_list_groups_for_user(
    AxumState(app_state): AxumState<AppState>,
    SessionUser(actor, _user): SessionUser,
    Path(user_id): Path<i64>,
) -> Result<Json<ListGroupsResponse>, HttpError> {
    info!(
        user_id = actor.user_id,
        target_user_id = user_id,
        "Handling list_groups_for_user request"
    );

    let mut persistence = app_state.persistence.lock().await;
    let response: ListGroupsResponse =
        roster_api::list_groups_for_user(&mut persistence, &actor, user_id)?;
    drop(persistence);

    Ok(Json(response))
}

// ========================================================================
// Duties
// ========================================================================

/// Handler for GET `/duties`.
async fn handle_list_all_duties(
    AxumState(app_state): AxumState<AppState>,
    SessionUser(actor, _user): SessionUser,
) -> Result<Json<ListDutiesResponse>, HttpError> {
    info!(user_id = actor.user_id, "Handling list_all_duties request");

    let mut persistence = app_state.persistence.lock().await;
    let response: ListDutiesResponse =
        roster_api::list_all_duties(&mut persistence, &actor, OffsetDateTime::now_utc())?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for GET `/duties/mine`.
async fn handle_list_my_duties(
    AxumState(app_state): AxumState<AppState>,
    SessionUser(actor, _user): SessionUser,
) -> Result<Json<ListDutiesResponse>, HttpError> {
    info!(user_id = actor.user_id, "Handling list_my_duties request");

    let mut persistence = app_state.persistence.lock().await;
    let response: ListDutiesResponse =
        roster_api::list_my_duties(&mut persistence, &actor, OffsetDateTime::now_utc())?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for POST `/duties`.
async fn handle_create_duty(
    AxumState(app_state): AxumState<AppState>,
    SessionUser(actor, _user): SessionUser,
    Json(req): Json<CreateDutyRequest>,
) -> Result<Json<DutyResponse>, HttpError> {
    info!(
        user_id = actor.user_id,
        owner_id = req.user_id,
        duty_type = %req.duty_type,
        "Handling create_duty request"
    );

    let ctx: ApplyContext = app_state.context();
    let mut persistence = app_state.persistence.lock().await;
    let response: DutyResponse = roster_api::create_duty(
        &mut persistence,
        &ctx,
        &req,
        &actor,
        request_cause("Create duty"),
    )?;
    drop(persistence);

    info!(duty_id = response.duty.duty_id, "Created duty");
    Ok(Json(response))
}

/// Handler for POST `/duties/bulk`.
async fn handle_create_bulk_duties(
    AxumState(app_state): AxumState<AppState>,
    SessionUser(actor, _user): SessionUser,
    Json(req): Json<CreateBulkDutiesRequest>,
) -> Result<Json<ListDutiesResponse>, HttpError> {
    info!(
        user_id = actor.user_id,
        owner_id = req.user_id,
        count = req.dates.len(),
        "Handling create_bulk_duties request"
    );

    let ctx: ApplyContext = app_state.context();
    let mut persistence = app_state.persistence.lock().await;
    let response: ListDutiesResponse = roster_api::create_bulk_duties(
        &mut persistence,
        &ctx,
        &req,
        &actor,
        request_cause("Create duties in bulk"),
    )?;
    drop(persistence);

    info!(count = response.duties.len(), "Created duties");
    Ok(Json(response))
}

/// Handler for PATCH `/duties/{duty_id}`.
async fn handle_update_duty(
    AxumState(app_state): AxumState<AppState>,
    SessionUser(actor, _user): SessionUser,
    Path(duty_id): Path<i64>,
    Json(req): Json<UpdateDutyRequest>,
) -> Result<Json<DutyResponse>, HttpError> {
    info!(
        user_id = actor.user_id,
        duty_id = duty_id,
        "Handling update_duty request"
    );

    let ctx: ApplyContext = app_state.context();
    let mut persistence = app_state.persistence.lock().await;
    let response: DutyResponse = roster_api::update_duty(
        &mut persistence,
        &ctx,
        duty_id,
        &req,
        &actor,
        request_cause("Update duty"),
    )?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for DELETE `/duties/{duty_id}`.
async fn handle_delete_duty(
    AxumState(app_state): AxumState<AppState>,
    SessionUser(actor, _user): SessionUser,
    Path(duty_id): Path<i64>,
) -> Result<Json<DeleteResponse>, HttpError> {
    info!(
        user_id = actor.user_id,
        duty_id = duty_id,
        "Handling delete_duty request"
    );

    let ctx: ApplyContext = app_state.context();
    let mut persistence = app_state.persistence.lock().await;
    let response: DeleteResponse = roster_api::delete_duty(
        &mut persistence,
        &ctx,
        duty_id,
        &actor,
        request_cause("Delete duty"),
    )?;
    drop(persistence);

    Ok(Json(response))
}

// ========================================================================
// Groups
// ========================================================================

/// Handler for GET `/groups`.
async fn handle_list_groups(
    AxumState(app_state): AxumState<AppState>,
    SessionUser(actor, _user): SessionUser,
) -> Result<Json<ListGroupsResponse>, HttpError> {
    info!(user_id = actor.user_id, "Handling list_groups request");

    let mut persistence = app_state.persistence.lock().await;
    let response: ListGroupsResponse = roster_api::list_groups(&mut persistence, &actor)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for POST `/groups`.
async fn handle_create_group(
    AxumState(app_state): AxumState<AppState>,
    SessionUser(actor, _user): SessionUser,
    Json(req): Json<CreateGroupRequest>,
) -> Result<Json<GroupResponse>, HttpError> {
    info!(
        user_id = actor.user_id,
        name = %req.name,
        "Handling create_group request"
    );

    let ctx: ApplyContext = app_state.context();
    let mut persistence = app_state.persistence.lock().await;
    let response: GroupResponse = roster_api::create_group(
        &mut persistence,
        &ctx,
        &req,
        &actor,
        request_cause("Create group"),
    )?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for GET `/groups/{group_id}`.
async fn handle_get_group(
    AxumState(app_state): AxumState<AppState>,
    SessionUser(actor, _user): SessionUser,
    Path(group_id): Path<i64>,
) -> Result<Json<GroupInfo>, HttpError> {
    info!(
        user_id = actor.user_id,
        group_id = group_id,
        "Handling get_group request"
    );

    let mut persistence = app_state.persistence.lock().await;
    let response: GroupInfo = roster_api::get_group(&mut persistence, &actor, group_id)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for PUT `/groups/{group_id}`.
///
/// Replaces the name, description, and complete member list.
async fn handle_update_group(
    AxumState(app_state): AxumState<AppState>,
    SessionUser(actor, _user): SessionUser,
    Path(group_id): Path<i64>,
    Json(req): Json<UpdateGroupRequest>,
) -> Result<Json<GroupResponse>, HttpError> {
    info!(
        user_id = actor.user_id,
        group_id = group_id,
        members = req.member_ids.len(),
        "Handling update_group request"
    );

    let ctx: ApplyContext = app_state.context();
    let mut persistence = app_state.persistence.lock().await;
    let response: GroupResponse = roster_api::update_group(
        &mut persistence,
        &ctx,
        group_id,
        &req,
        &actor,
        request_cause("Update group"),
    )?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for DELETE `/groups/{group_id}`.
async fn handle_delete_group(
    AxumState(app_state): AxumState<AppState>,
    SessionUser(actor, _user): SessionUser,
    Path(group_id): Path<i64>,
) -> Result<Json<DeleteResponse>, HttpError> {
    info!(
        user_id = actor.user_id,
        group_id = group_id,
        "Handling delete_group request"
    );

    let ctx: ApplyContext = app_state.context();
    let mut persistence = app_state.persistence.lock().await;
    let response: DeleteResponse = roster_api::delete_group(
        &mut persistence,
        &ctx,
        group_id,
        &actor,
        request_cause("Delete group"),
    )?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for POST `/groups/{group_id}/toggle`.
async fn handle_toggle_member(
    AxumState(app_state): AxumState<AppState>,
    SessionUser(actor, _user): SessionUser,
    Path(group_id): Path<i64>,
    Json(req): Json<ToggleMemberRequest>,
) -> Result<Json<GroupResponse>, HttpError> {
    info!(
        user_id = actor.user_id,
        group_id = group_id,
        member_id = req.user_id,
        "Handling toggle_member request"
    );

    let ctx: ApplyContext = app_state.context();
    let mut persistence = app_state.persistence.lock().await;
    let response: GroupResponse = roster_api::toggle_member(
        &mut persistence,
        &ctx,
        group_id,
        &req,
        &actor,
        request_cause("Toggle group member"),
    )?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for GET `/groups/{group_id}/members`.
async fn handle_list_members(
    AxumState(app_state): AxumState<AppState>,
    SessionUser(actor, _user): SessionUser,
    Path(group_id): Path<i64>,
) -> Result<Json<ListMembersResponse>, HttpError> {
    info!(
        user_id = actor.user_id,
        group_id = group_id,
        "Handling list_members request"
    );

    let mut persistence = app_state.persistence.lock().await;
    let response: ListMembersResponse =
        roster_api::list_members(&mut persistence, &actor, group_id)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for POST `/schedule`.
///
/// Builds the member-by-date matrix for one or more groups.
async fn handle_group_schedule(
    AxumState(app_state): AxumState<AppState>,
    SessionUser(actor, _user): SessionUser,
    Json(req): Json<GroupScheduleRequest>,
) -> Result<Json<GroupScheduleResponse>, HttpError> {
    info!(
        user_id = actor.user_id,
        groups = ?req.group_ids,
        "Handling group_schedule request"
    );

    let ctx: ApplyContext = app_state.context();
    let mut persistence = app_state.persistence.lock().await;
    let response: GroupScheduleResponse =
        roster_api::group_schedule(&mut persistence, &ctx, &req, &actor)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for GET `/audit/timeline`.
async fn handle_audit_timeline(
    AxumState(app_state): AxumState<AppState>,
    SessionUser(actor, _user): SessionUser,
    Query(params): Query<AuditTimelineQuery>,
) -> Result<Json<AuditTimelineResponse>, HttpError> {
    info!(
        user_id = actor.user_id,
        limit = ?params.limit,
        "Handling audit_timeline request"
    );

    let mut persistence = app_state.persistence.lock().await;
    let response: AuditTimelineResponse =
        roster_api::audit_timeline(&mut persistence, &actor, params.limit)?;
    drop(persistence);

    Ok(Json(response))
}

/// Builds the application router with all endpoints.
fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/bootstrap/status", get(handle_bootstrap_status))
        .route("/bootstrap/first-admin", post(handle_create_first_admin))
        .route("/auth/register", post(handle_register))
        .route("/auth/login", post(handle_login))
        .route("/auth/logout", post(handle_logout))
        .route("/auth/me", get(handle_whoami).patch(handle_update_profile))
        .route("/ranks", get(handle_rank_catalog))
        .route("/users", get(handle_list_users).post(handle_create_user))
        .route(
            "/users/{user_id}",
            patch(handle_update_user).delete(handle_delete_user),
        )
        .route("/users/{user_id}/duties", get(handle_list_duties_for_user))
        .route("/users/{user_id}/groups", get(handle_list_groups_for_user))
        .route("/duties", get(handle_list_all_duties).post(handle_create_duty))
        .route("/duties/mine", get(handle_list_my_duties))
        .route("/duties/bulk", post(handle_create_bulk_duties))
        .route(
            "/duties/{duty_id}",
            patch(handle_update_duty).delete(handle_delete_duty),
        )
        .route("/groups", get(handle_list_groups).post(handle_create_group))
        .route(
            "/groups/{group_id}",
            get(handle_get_group)
                .put(handle_update_group)
                .delete(handle_delete_group),
        )
        .route("/groups/{group_id}/toggle", post(handle_toggle_member))
        .route("/groups/{group_id}/members", get(handle_list_members))
        .route("/schedule", post(handle_group_schedule))
        .route("/audit/timeline", get(handle_audit_timeline))
        .with_state(app_state)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command-line arguments
    let args: Args = Args::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Initializing Roster Server");

    let timezone: Tz = parse_timezone(&args.timezone)?;
    info!(timezone = %timezone, "Using roster timezone");

    let persistence: SqlitePersistence = if let Some(url) = &args.mysql_url {
        info!("Using MySQL/MariaDB database");
        SqlitePersistence::new_with_mysql(url)?
    } else if let Some(db_path) = &args.database {
        info!("Using file-based database at: {db_path}");
        SqlitePersistence::new_with_file(db_path)?
    } else {
        info!("Using in-memory database");
        SqlitePersistence::new_in_memory()?
    };

    let app_state: AppState = AppState::new(
        persistence,
        timezone,
        Duration::days(i64::from(args.session_days)),
    );

    let app: Router = build_router(app_state);

    let addr: std::net::SocketAddr = format!("{}:{}", args.bind, args.port).parse()?;
    info!("Server listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode as HttpStatusCode},
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;

    const PASSWORD: &str = "Correct-Horse-42";

    /// Helper to create test app state with in-memory persistence.
    fn create_test_app_state() -> AppState {
        let persistence: SqlitePersistence =
            SqlitePersistence::new_in_memory().expect("Failed to create in-memory persistence");
        AppState::new(persistence, chrono_tz::UTC, Duration::days(7))
    }

    /// Sends one request and returns the status and decoded JSON body.
    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (HttpStatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap()
        };
        (status, value)
    }

    async fn bootstrap_admin(app: &Router) -> String {
        let (status, body) = send(
            app,
            "POST",
            "/bootstrap/first-admin",
            None,
            Some(json!({
                "full_name": "Olena Admin",
                "email": "olena@example.com",
                "password": PASSWORD,
                "password_confirmation": PASSWORD,
            })),
        )
        .await;
        assert_eq!(status, HttpStatusCode::OK);
        body["session_token"].as_str().unwrap().to_string()
    }

    async fn register(app: &Router, full_name: &str, email: &str) -> (String, i64) {
        let (status, body) = send(
            app,
            "POST",
            "/auth/register",
            None,
            Some(json!({
                "full_name": full_name,
                "email": email,
                "password": PASSWORD,
                "password_confirmation": PASSWORD,
            })),
        )
        .await;
        assert_eq!(status, HttpStatusCode::OK);
        (
            body["session_token"].as_str().unwrap().to_string(),
            body["user"]["user_id"].as_i64().unwrap(),
        )
    }

    #[tokio::test]
    async fn test_bootstrap_only_once() {
        let app: Router = build_router(create_test_app_state());

        let (status, body) = send(&app, "GET", "/bootstrap/status", None, None).await;
        assert_eq!(status, HttpStatusCode::OK);
        assert_eq!(body["needs_bootstrap"], json!(true));

        bootstrap_admin(&app).await;

        let (_, body) = send(&app, "GET", "/bootstrap/status", None, None).await;
        assert_eq!(body["needs_bootstrap"], json!(false));

        let (status, body) = send(
            &app,
            "POST",
            "/bootstrap/first-admin",
            None,
            Some(json!({
                "full_name": "Second Admin",
                "email": "second@example.com",
                "password": PASSWORD,
                "password_confirmation": PASSWORD,
            })),
        )
        .await;
        assert_eq!(status, HttpStatusCode::CONFLICT);
        assert_eq!(body["error"], json!("rule_violation"));
    }

    #[tokio::test]
    async fn test_session_required() {
        let app: Router = build_router(create_test_app_state());

        let (status, body) = send(&app, "GET", "/auth/me", None, None).await;
        assert_eq!(status, HttpStatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], json!("authentication_failed"));

        let (status, _) = send(&app, "GET", "/auth/me", Some("not-a-token"), None).await;
        assert_eq!(status, HttpStatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_register_whoami_logout() {
        let app: Router = build_router(create_test_app_state());
        bootstrap_admin(&app).await;
        let (token, user_id) = register(&app, "Andrii Bondar", "andrii@example.com").await;

        let (status, body) = send(&app, "GET", "/auth/me", Some(&token), None).await;
        assert_eq!(status, HttpStatusCode::OK);
        assert_eq!(body["user"]["user_id"], json!(user_id));
        assert_eq!(body["user"]["role"], json!("user"));
        assert_eq!(body["capabilities"]["can_manage_duties"], json!(false));

        let (status, _) = send(&app, "POST", "/auth/logout", Some(&token), None).await;
        assert_eq!(status, HttpStatusCode::OK);

        let (status, _) = send(&app, "GET", "/auth/me", Some(&token), None).await;
        assert_eq!(status, HttpStatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_wrong_password_is_unauthorized() {
        let app: Router = build_router(create_test_app_state());
        bootstrap_admin(&app).await;

        let (status, body) = send(
            &app,
            "POST",
            "/auth/login",
            None,
            Some(json!({ "email": "olena@example.com", "password": "Wrong-Horse-42" })),
        )
        .await;
        assert_eq!(status, HttpStatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], json!("authentication_failed"));

        let (status, body) = send(
            &app,
            "POST",
            "/auth/login",
            None,
            Some(json!({ "email": "OLENA@example.com", "password": PASSWORD })),
        )
        .await;
        assert_eq!(status, HttpStatusCode::OK);
        assert!(body["session_token"].as_str().is_some());
    }

    #[tokio::test]
    async fn test_non_admin_cannot_create_duty() {
        let app: Router = build_router(create_test_app_state());
        bootstrap_admin(&app).await;
        let (token, user_id) = register(&app, "Andrii Bondar", "andrii@example.com").await;

        let (status, body) = send(
            &app,
            "POST",
            "/duties",
            Some(&token),
            Some(json!({
                "user_id": user_id,
                "duty_type": "Patrol",
                "position": "Post-1",
                "shift_start": "2024-03-04T08:00",
                "shift_end": "2024-03-04T16:00",
                "rotation_cycle": "daily",
            })),
        )
        .await;
        assert_eq!(status, HttpStatusCode::FORBIDDEN);
        assert_eq!(body["error"], json!("unauthorized"));

        let (status, body) = send(&app, "GET", "/duties/mine", Some(&token), None).await;
        assert_eq!(status, HttpStatusCode::OK);
        assert_eq!(body["duties"], json!([]));
    }

    #[tokio::test]
    async fn test_invalid_window_is_bad_request() {
        let app: Router = build_router(create_test_app_state());
        let admin = bootstrap_admin(&app).await;
        let (_, user_id) = register(&app, "Andrii Bondar", "andrii@example.com").await;

        let (status, body) = send(
            &app,
            "POST",
            "/duties",
            Some(&admin),
            Some(json!({
                "user_id": user_id,
                "duty_type": "Patrol",
                "position": "Post-1",
                "shift_start": "2024-03-04T16:00",
                "shift_end": "2024-03-04T08:00",
                "rotation_cycle": "daily",
            })),
        )
        .await;
        assert_eq!(status, HttpStatusCode::BAD_REQUEST);
        assert_eq!(body["error"], json!("invalid_input"));

        let (_, body) = send(&app, "GET", "/duties", Some(&admin), None).await;
        assert_eq!(body["duties"], json!([]));
    }

    #[tokio::test]
    async fn test_unknown_group_is_not_found() {
        let app: Router = build_router(create_test_app_state());
        let admin = bootstrap_admin(&app).await;

        let (status, body) = send(&app, "GET", "/groups/4242", Some(&admin), None).await;
        assert_eq!(status, HttpStatusCode::NOT_FOUND);
        assert_eq!(body["error"], json!("not_found"));
    }

    #[tokio::test]
    async fn test_rank_catalog() {
        let app: Router = build_router(create_test_app_state());

        let (status, body) = send(&app, "GET", "/ranks", None, None).await;
        assert_eq!(status, HttpStatusCode::OK);
        assert_eq!(body["categories"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_bulk_duties_and_group_schedule() {
        let app: Router = build_router(create_test_app_state());
        let admin = bootstrap_admin(&app).await;
        let (member_token, member_id) =
            register(&app, "Andrii Bondar", "andrii@example.com").await;
        let (outsider_token, _) = register(&app, "Bohdan Savchuk", "bohdan@example.com").await;

        let (status, body) = send(
            &app,
            "POST",
            "/groups",
            Some(&admin),
            Some(json!({ "name": "Alpha" })),
        )
        .await;
        assert_eq!(status, HttpStatusCode::OK);
        let group_id = body["group"]["group_id"].as_i64().unwrap();

        let (status, body) = send(
            &app,
            "POST",
            &format!("/groups/{group_id}/toggle"),
            Some(&admin),
            Some(json!({ "user_id": member_id })),
        )
        .await;
        assert_eq!(status, HttpStatusCode::OK);
        assert_eq!(body["group"]["member_ids"], json!([member_id]));

        let (status, body) = send(
            &app,
            "POST",
            "/duties/bulk",
            Some(&admin),
            Some(json!({
                "user_id": member_id,
                "duty_type": "Patrol",
                "position": "Post-1",
                "dates": ["2024-04-01", "2024-04-02", "2024-04-03"],
                "start_time": "06:00",
                "end_time": "18:00",
                "rotation_cycle": "daily",
            })),
        )
        .await;
        assert_eq!(status, HttpStatusCode::OK);
        assert_eq!(body["duties"].as_array().unwrap().len(), 3);

        let schedule_request = json!({
            "group_ids": [group_id],
            "week_of": "2024-04-03",
        });

        let (status, body) = send(
            &app,
            "POST",
            "/schedule",
            Some(&member_token),
            Some(schedule_request.clone()),
        )
        .await;
        assert_eq!(status, HttpStatusCode::OK);
        assert_eq!(body["dates"].as_array().unwrap().len(), 7);
        assert_eq!(body["rows"].as_array().unwrap().len(), 1);
        assert_eq!(body["duties"].as_array().unwrap().len(), 3);
        assert_eq!(
            body["uncovered_dates"],
            json!(["2024-04-04", "2024-04-05", "2024-04-06", "2024-04-07"])
        );

        let (status, _) = send(
            &app,
            "POST",
            "/schedule",
            Some(&outsider_token),
            Some(schedule_request),
        )
        .await;
        assert_eq!(status, HttpStatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_audit_timeline_lists_http_causes() {
        let app: Router = build_router(create_test_app_state());
        let admin = bootstrap_admin(&app).await;

        send(
            &app,
            "POST",
            "/groups",
            Some(&admin),
            Some(json!({ "name": "Alpha" })),
        )
        .await;

        let (status, body) = send(&app, "GET", "/audit/timeline?limit=1", Some(&admin), None).await;
        assert_eq!(status, HttpStatusCode::OK);
        let events = body["events"].as_array().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["action"], json!("CreateGroup"));
        assert_eq!(events[0]["cause_description"], json!("Create group"));
    }
}
