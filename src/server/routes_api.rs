use crate::pipeline::DubRequest;
use crate::server::AppContext;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

pub fn api_routes() -> Router<AppContext> {
    Router::new()
        .route("/dub", post(submit_dub))
        .route("/info", get(source_info))
        .route("/sessions", get(list_sessions))
        .route("/sessions/:id/cancel", post(cancel_session))
}

#[derive(Serialize)]
struct SubmitDubResponse {
    session_id: String,
}

async fn submit_dub(
    State(ctx): State<AppContext>,
    Json(payload): Json<DubRequest>,
) -> Result<(StatusCode, Json<SubmitDubResponse>), (StatusCode, String)> {
    if payload.url.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "URL cannot be empty".to_string()));
    }

    let session_id = ctx.orchestrator.spawn(payload);
    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitDubResponse { session_id }),
    ))
}

#[derive(Deserialize)]
struct InfoQuery {
    url: String,
}

async fn source_info(
    State(ctx): State<AppContext>,
    Query(params): Query<InfoQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if params.url.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "URL cannot be empty".to_string()));
    }

    match ctx.orchestrator.fetch_info(&params.url).await {
        Ok(info) => Ok(Json(info)),
        Err(e) => Err((StatusCode::BAD_GATEWAY, format!("{:#}", e))),
    }
}

async fn list_sessions(State(ctx): State<AppContext>) -> impl IntoResponse {
    Json(ctx.state.sessions.list_active())
}

#[derive(Serialize)]
struct CancelResponse {
    session_id: String,
    accepted: bool,
}

async fn cancel_session(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<CancelResponse>, (StatusCode, String)> {
    let accepted = ctx.orchestrator.request_cancel(&id);
    if !accepted && !ctx.state.sessions.is_cancelled(&id) {
        return Err((StatusCode::NOT_FOUND, format!("Unknown session: {}", id)));
    }

    Ok(Json(CancelResponse {
        session_id: id,
        accepted,
    }))
}
