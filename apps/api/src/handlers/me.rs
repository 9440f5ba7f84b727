use axum::Json;
use axum::extract::{Extension, State};
use rolegrid_core::UserIdentity;

use crate::dto::UserIdentityResponse;
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn me_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<UserIdentityResponse>> {
    let permissions = state
        .authorization_service
        .effective_permission_codes(user.subject())
        .await?
        .into_iter()
        .map(String::from)
        .collect();

    Ok(Json(UserIdentityResponse::new(&user, permissions)))
}
