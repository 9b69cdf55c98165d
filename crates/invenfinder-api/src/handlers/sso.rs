//! SSO provider listing.

use axum::Json;
use axum::extract::State;

use invenfinder_auth::sso::ProviderSummary;

use crate::state::AppState;

/// GET /api/sso/providers
pub async fn list_providers(State(state): State<AppState>) -> Json<Vec<ProviderSummary>> {
    Json(state.sso.discovered_providers().await)
}
