pub mod adoption;
pub mod auth;
pub mod chats;
pub mod convert;
pub mod error;
pub mod extract;
pub mod geo;
pub mod leaderboard;
pub mod lost_found;
pub mod middleware;
pub mod notifications;
pub mod pets;
pub mod recommend;
pub mod rescue;
pub mod state;
pub mod stats;
pub mod store;
pub mod stray_map;
pub mod users;
pub mod verification;

use axum::{
    Json, Router,
    routing::{get, patch, post, put},
};
use serde_json::{Value, json};
use tracing::error;

use pawhaven_db::Database;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Run blocking DB work off the async runtime.
pub(crate) async fn run_blocking<F, T>(state: &AppState, f: F) -> ApiResult<T>
where
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(anyhow::anyhow!("blocking task failed"))
        })?
        .map_err(ApiError::from)
}

/// Run CPU-heavy work such as password hashing off the async runtime.
pub(crate) async fn run_cpu_bound<F, T>(f: F) -> ApiResult<T>
where
    F: FnOnce() -> ApiResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::Internal(anyhow::anyhow!("blocking task failed"))
    })?
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Every route of the service. Routes in the second group require a bearer
/// token.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/auth/register", post(auth::register))
        .route("/auth/token", post(auth::token))
        .route("/auth/verify-email", post(auth::verify_email))
        .route("/auth/resend-code", post(auth::resend_code))
        .route("/stray-map", get(stray_map::list_entries))
        .route("/stray-map/{id}", get(stray_map::get_entry))
        .route("/leaderboard", get(leaderboard::list_entries))
        .route("/leaderboard/{user_id}", get(leaderboard::get_entry))
        .route("/products", get(store::list_products))
        .route("/products/{id}", get(store::get_product))
        .route("/cart/checkout", post(store::checkout))
        .route("/api/stats", get(stats::get_stats))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/auth/verify", post(auth::verify_token))
        // Users
        .route("/users", get(users::list_users))
        .route("/users/me", get(users::get_me))
        .route("/users/change-password", put(users::change_password))
        .route("/users/preferences", put(users::update_preferences))
        .route("/users/{id}", axum::routing::delete(users::delete_user))
        // Pets
        .route("/pets", post(pets::create_pet).get(pets::list_pets))
        .route(
            "/pets/{id}",
            get(pets::get_pet).put(pets::update_pet).delete(pets::delete_pet),
        )
        .route("/pets/{id}/adopt", put(pets::adopt_pet))
        // Adoption requests
        .route(
            "/adoption_reqs",
            post(adoption::create_request).get(adoption::list_mine),
        )
        .route("/adoption_reqs/mine", get(adoption::list_mine))
        .route("/adoption_reqs/all", get(adoption::list_open))
        .route("/adoption_reqs/by-chat/{chat_id}", get(adoption::get_by_chat))
        .route(
            "/adoption_reqs/{id}",
            get(adoption::get_request)
                .put(adoption::update_request)
                .delete(adoption::delete_request),
        )
        // Rescue reports
        .route(
            "/rescue-rep",
            post(rescue::create_report).get(rescue::list_reports),
        )
        .route("/rescue-rep/nearby", get(rescue::nearby_reports))
        .route("/rescue-rep/by-chat/{chat_id}", get(rescue::get_by_chat))
        .route(
            "/rescue-rep/{id}",
            get(rescue::get_report)
                .put(rescue::update_report)
                .delete(rescue::delete_report),
        )
        // Lost & found
        .route(
            "/lost-found",
            post(lost_found::create_report).get(lost_found::list_reports),
        )
        .route("/lost-found/nearby", get(lost_found::nearby_reports))
        .route("/lost-found/by-chat/{chat_id}", get(lost_found::get_by_chat))
        .route(
            "/lost-found/{id}",
            get(lost_found::get_report)
                .put(lost_found::update_report)
                .delete(lost_found::delete_report),
        )
        // Stray map
        .route("/stray-map", post(stray_map::create_entry))
        .route("/stray-map/{id}", axum::routing::delete(stray_map::delete_entry))
        // Chats
        .route("/chats", post(chats::create_chat).get(chats::list_chats))
        .route("/chats/{id}", get(chats::get_chat))
        .route("/chats/{id}/join", post(chats::join_chat))
        .route(
            "/chats/{id}/messages",
            get(chats::list_messages).post(chats::send_message),
        )
        // Leaderboard
        .route("/leaderboard", post(leaderboard::create_entry))
        .route(
            "/leaderboard/{user_id}",
            axum::routing::delete(leaderboard::delete_entry),
        )
        // Notifications
        .route(
            "/notifications",
            post(notifications::create_notification).get(notifications::list_notifications),
        )
        .route("/notifications/nearby", post(notifications::nearby))
        .route("/notifications/{id}", get(notifications::get_notification))
        .route("/notifications/{id}/viewed", patch(notifications::mark_viewed))
        // Store
        .route("/products", post(store::create_product))
        .route("/cart/recent", get(store::recent_orders))
        // Recommendations
        .route("/recommend", get(recommend::recommend))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ))
        .with_state(state);

    Router::new().merge(public_routes).merge(protected_routes)
}
