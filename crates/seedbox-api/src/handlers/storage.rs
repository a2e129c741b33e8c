//! Storage usage handler.

use axum::Json;
use axum::extract::State;

use seedbox_core::error::AppError;
use seedbox_core::types::format_bytes;

use crate::dto::response::UsageResponse;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /storage/usage
pub async fn usage(State(state): State<AppState>, auth: AuthUser) -> Result<Json<UsageResponse>, AppError> {
    let snapshot = state.quota.usage(auth.user_id).await?;
    let available = snapshot.available();

    Ok(Json(UsageResponse {
        used_bytes: snapshot.used_bytes,
        quota_bytes: snapshot.quota_bytes,
        available_bytes: available,
        used: format_bytes(snapshot.used_bytes),
        quota: format_bytes(snapshot.quota_bytes),
        available: format_bytes(available),
        computed_at: snapshot.computed_at,
    }))
}
