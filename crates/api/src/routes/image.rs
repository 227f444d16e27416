use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};

use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

#[derive(Debug, Deserialize)]
pub struct HdUrlQuery {
    pub logo_id: String,
}

#[derive(Debug, Serialize)]
pub struct HdUrlResponse {
    pub logo_id: String,
    pub hd_url: String,
    pub expires_at: String,
}

pub async fn hd_url(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<HdUrlQuery>,
) -> Result<Json<HdUrlResponse>, ApiError> {
    let hd = state.logos.hd_url(&auth.owner_id, &query.logo_id).await?;

    Ok(Json(HdUrlResponse {
        logo_id: query.logo_id,
        hd_url: hd.url,
        expires_at: hd.expires_at.to_rfc3339(),
    }))
}
