use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::db::queries;
use crate::errors::AppError;
use crate::handlers::auth::AdminUser;
use crate::models::{Role, UserStatus};
use crate::services::{facilities, users};
use crate::state::AppState;

// GET /admin/users
#[derive(Deserialize)]
pub struct UsersQuery {
    pub role: Option<Role>,
    pub status: Option<UserStatus>,
}

pub async fn list_users(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    query: Result<Query<UsersQuery>, QueryRejection>,
) -> Result<Json<Value>, AppError> {
    let Query(query) = query?;
    let users = {
        let db = state.conn()?;
        queries::list_users(&db, query.role, query.status)?
    };

    Ok(Json(json!({ "success": true, "users": users })))
}

// PATCH /admin/users/:id/status
#[derive(Deserialize)]
pub struct StatusRequest {
    pub status: UserStatus,
}

pub async fn set_user_status(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    body: Result<Json<StatusRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(body) = body?;
    let user = {
        let db = state.conn()?;
        users::set_status(&db, &admin, &id, body.status)?
    };

    Ok(Json(json!({ "success": true, "user": user })))
}

// PATCH /admin/facilities/:id/approval
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalRequest {
    pub is_approved: bool,
}

pub async fn set_facility_approval(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
    body: Result<Json<ApprovalRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(body) = body?;
    let facility = {
        let db = state.conn()?;
        facilities::set_approval(&db, &id, body.is_approved, Utc::now())?
    };

    Ok(Json(json!({ "success": true, "facility": facility })))
}
