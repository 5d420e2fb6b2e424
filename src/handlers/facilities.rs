use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};

use crate::db::queries;
use crate::errors::AppError;
use crate::handlers::auth::AuthUser;
use crate::models::{FacilityInput, FacilitySearch};
use crate::services::facilities;
use crate::state::AppState;

// GET /facilities
pub async fn search(
    State(state): State<Arc<AppState>>,
    query: Result<Query<FacilitySearch>, QueryRejection>,
) -> Result<Json<Value>, AppError> {
    let Query(search) = query?;
    let facilities = {
        let db = state.conn()?;
        queries::search_facilities(&db, &search)?
    };

    Ok(Json(json!({ "success": true, "facilities": facilities })))
}

// POST /facilities
pub async fn create(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    body: Result<Json<FacilityInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let Json(input) = body?;
    let facility = {
        let db = state.conn()?;
        facilities::create_facility(&db, &user, input, Utc::now())?
    };

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "facility": facility })),
    ))
}

// PUT /facilities/:id
pub async fn update(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    body: Result<Json<FacilityInput>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(input) = body?;
    let facility = {
        let db = state.conn()?;
        facilities::update_facility(&db, &user, &id, input, Utc::now())?
    };

    Ok(Json(json!({ "success": true, "facility": facility })))
}

// GET /facilities/mine
pub async fn mine(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<Json<Value>, AppError> {
    let facilities = {
        let db = state.conn()?;
        facilities::list_owned(&db, &user)?
    };

    Ok(Json(json!({ "success": true, "facilities": facilities })))
}

// GET /facilities/:id
pub async fn get_one(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let facility = {
        let db = state.conn()?;
        facilities::find_bookable(&db, &id)?
    };

    Ok(Json(json!({ "success": true, "facility": facility })))
}
