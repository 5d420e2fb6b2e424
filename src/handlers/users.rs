use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};

use crate::db::queries;
use crate::errors::AppError;
use crate::handlers::auth::AuthUser;
use crate::services::facilities;
use crate::state::AppState;

// GET /users/me
pub async fn me(AuthUser(user): AuthUser) -> Json<Value> {
    Json(json!({ "success": true, "user": user }))
}

// GET /users/favorites
pub async fn favorites(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<Json<Value>, AppError> {
    let favorites = {
        let db = state.conn()?;
        queries::list_favorites(&db, &user.id)?
    };

    Ok(Json(json!({ "success": true, "favorites": favorites })))
}

// POST /users/favorites/:facilityId
pub async fn add_favorite(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(facility_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let added = {
        let db = state.conn()?;
        let facility = facilities::find_bookable(&db, &facility_id)?;
        queries::add_favorite(&db, &user.id, &facility.id)?
    };

    Ok(Json(json!({ "success": true, "added": added })))
}

// DELETE /users/favorites/:facilityId
pub async fn remove_favorite(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(facility_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let removed = {
        let db = state.conn()?;
        queries::remove_favorite(&db, &user.id, &facility_id)?
    };

    if removed {
        Ok(Json(json!({ "success": true })))
    } else {
        Err(AppError::NotFound("facility is not in favorites".to_string()))
    }
}
