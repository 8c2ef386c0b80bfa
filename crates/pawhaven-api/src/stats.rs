use axum::extract::State;

use pawhaven_types::api::StatsResponse;

use crate::error::ApiResult;
use crate::extract::Json;
use crate::run_blocking;
use crate::state::AppState;

/// Headline counters for the landing page.
pub async fn get_stats(State(state): State<AppState>) -> ApiResult<Json<StatsResponse>> {
    let stats = run_blocking(&state, |db| db.platform_stats()).await?;
    Ok(Json(StatsResponse {
        rescues: stats.resolved_rescues,
        adoptions: stats.completed_adoptions,
        located: stats.located_strays,
    }))
}
