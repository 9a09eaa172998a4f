use axum::{
    Extension,
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
};
use pdpac::{
    Platform,
    platform::State,
};
use pdpcore::policy::{
    Decision,
    Policy,
    Request,
    StoredPolicy,
};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Reloaded {
    pub policies: usize,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Health {
    pub state: State,
}

fn decode<T>(
    payload: Result<Json<T>, JsonRejection>,
    what: &str,
) -> Result<T, AppError> {
    payload
        .map(|Json(inner)| inner)
        .map_err(|e| {
            log::debug!("failed to decode {what}: {e}");
            AppError::BadRequest(format!("failed to decode {what}"))
        })
}

pub async fn create_policy(
    Extension(platform): Extension<Platform>,
    payload: Result<Json<Policy>, JsonRejection>,
) -> Result<(StatusCode, Json<StoredPolicy>), AppError> {
    let policy = decode(payload, "policy")?;
    let stored = platform.add_policy(policy).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

pub async fn check(
    Extension(platform): Extension<Platform>,
    payload: Result<Json<Request>, JsonRejection>,
) -> Result<Json<Decision>, AppError> {
    let request = decode(payload, "request")?;
    let allowed = platform.check(&request).await?;
    Ok(Json(allowed.into()))
}

pub async fn reload(
    Extension(platform): Extension<Platform>,
) -> Result<Json<Reloaded>, AppError> {
    let policies = platform.reload().await?;
    Ok(Json(Reloaded { policies }))
}

pub async fn health(
    Extension(platform): Extension<Platform>,
) -> (StatusCode, Json<Health>) {
    let state = platform.state();
    let status = match state {
        State::Ready => StatusCode::OK,
        _ => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status, Json(Health { state }))
}
