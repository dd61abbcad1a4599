use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{instrument, warn};

use super::{
    dto::{
        CredentialsRequest, ProfileResponse, PublicProfile, TokenResponse,
        UpdateInformationRequest, UpdatePasswordRequest,
    },
    errors::{ApiError, ApiResult},
    extractors::CallerId,
    repo_types::UserId,
    services,
};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(get_me).delete(delete_me))
        .route("/update/information", post(update_information))
        .route("/update/password", post(update_password))
        .route("/:id", get(get_user))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<CredentialsRequest>,
) -> ApiResult<(StatusCode, Json<TokenResponse>)> {
    let token = services::register(&state, &payload.email, &payload.password).await?;
    Ok((StatusCode::CREATED, Json(TokenResponse { token })))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<CredentialsRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let token = services::login(&state, &payload.email, &payload.password).await?;
    Ok(Json(TokenResponse { token }))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<PublicProfile>> {
    let id: UserId = raw_id.parse().map_err(|_| {
        warn!(id = %raw_id, "unparsable user id");
        ApiError::BadRequest("invalid id has been given".into())
    })?;
    let user = services::profile(&state, id).await?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, caller), fields(user_id = caller.0))]
pub async fn get_me(
    State(state): State<AppState>,
    caller: CallerId,
) -> ApiResult<Json<ProfileResponse>> {
    let user = services::profile(&state, caller.0).await?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, caller, payload), fields(user_id = caller.0))]
pub async fn update_information(
    State(state): State<AppState>,
    caller: CallerId,
    Json(payload): Json<UpdateInformationRequest>,
) -> ApiResult<StatusCode> {
    services::update_information(&state, caller.0, &payload.first_name, &payload.last_name)
        .await?;
    Ok(StatusCode::OK)
}

#[instrument(skip(state, caller, payload), fields(user_id = caller.0))]
pub async fn update_password(
    State(state): State<AppState>,
    caller: CallerId,
    Json(payload): Json<UpdatePasswordRequest>,
) -> ApiResult<StatusCode> {
    services::update_password(
        &state,
        caller.0,
        &payload.old_password,
        &payload.new_password,
    )
    .await?;
    Ok(StatusCode::OK)
}

#[instrument(skip(state, caller), fields(user_id = caller.0))]
pub async fn delete_me(State(state): State<AppState>, caller: CallerId) -> ApiResult<StatusCode> {
    services::delete_account(&state, caller.0).await?;
    Ok(StatusCode::OK)
}
