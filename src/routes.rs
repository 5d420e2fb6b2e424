use std::sync::Arc;

use axum::routing::{get, patch, post};
use axum::Router;

use crate::handlers;
use crate::state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route(
            "/facilities",
            get(handlers::facilities::search).post(handlers::facilities::create),
        )
        .route("/facilities/mine", get(handlers::facilities::mine))
        .route(
            "/facilities/:id",
            get(handlers::facilities::get_one).put(handlers::facilities::update),
        )
        .route("/bookings", post(handlers::bookings::create_booking))
        .route("/bookings/mine", get(handlers::bookings::my_bookings))
        .route("/bookings/owner", get(handlers::bookings::owner_bookings))
        .route(
            "/bookings/availability",
            get(handlers::bookings::availability),
        )
        .route(
            "/bookings/:id/cancel",
            patch(handlers::bookings::cancel_booking),
        )
        .route(
            "/bookings/:id/review",
            patch(handlers::bookings::review_booking),
        )
        .route(
            "/bookings/facility/:facility_id/reviews",
            get(handlers::bookings::facility_reviews),
        )
        .route("/users/me", get(handlers::users::me))
        .route("/users/favorites", get(handlers::users::favorites))
        .route(
            "/users/favorites/:facility_id",
            post(handlers::users::add_favorite).delete(handlers::users::remove_favorite),
        )
        .route("/admin/users", get(handlers::admin::list_users))
        .route(
            "/admin/users/:id/status",
            patch(handlers::admin::set_user_status),
        )
        .route(
            "/admin/facilities/:id/approval",
            patch(handlers::admin::set_facility_approval),
        )
        .with_state(state)
}
