use axum::{Json, Router, extract::State, routing::get, routing::post};
use validator::Validate;

use crate::{
    dto::session::{ActionResponse, SelectAnswerRequest, SessionSnapshot, StartSessionRequest},
    error::AppError,
    services::session_service,
    state::SharedState,
};

/// Routes driving the quiz session lifecycle and gameplay.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/session", get(get_session))
        .route("/session/start", post(start_session))
        .route("/session/pause", post(toggle_pause))
        .route("/session/answer", post(select_answer))
        .route("/session/next", post(next_question))
        .route("/session/restart", post(restart))
        .route("/session/play-again", post(play_again))
        .route("/session/quit", post(quit))
}

/// Start a new quiz session for the given category and difficulty.
#[utoipa::path(
    post,
    path = "/session/start",
    tag = "session",
    request_body = StartSessionRequest,
    responses(
        (status = 200, description = "Session started", body = SessionSnapshot),
        (status = 400, description = "Invalid category or difficulty"),
        (status = 409, description = "A session is already running"),
        (status = 503, description = "Question provider unavailable")
    )
)]
pub async fn start_session(
    State(state): State<SharedState>,
    Json(payload): Json<StartSessionRequest>,
) -> Result<Json<SessionSnapshot>, AppError> {
    payload.validate()?;
    let snapshot = session_service::start_session(&state, payload).await?;
    Ok(Json(snapshot))
}

/// Toggle between playing and paused.
#[utoipa::path(
    post,
    path = "/session/pause",
    tag = "session",
    responses(
        (status = 200, description = "Pause state toggled", body = SessionSnapshot)
    )
)]
pub async fn toggle_pause(
    State(state): State<SharedState>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let snapshot = session_service::toggle_pause(&state).await?;
    Ok(Json(snapshot))
}

/// Submit an answer for the current question.
#[utoipa::path(
    post,
    path = "/session/answer",
    tag = "session",
    request_body = SelectAnswerRequest,
    responses(
        (status = 200, description = "Answer recorded", body = SessionSnapshot),
        (status = 400, description = "Answer index out of range"),
        (status = 409, description = "Question already answered")
    )
)]
pub async fn select_answer(
    State(state): State<SharedState>,
    Json(payload): Json<SelectAnswerRequest>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let snapshot = session_service::select_answer(&state, payload).await?;
    Ok(Json(snapshot))
}

/// Advance to the next question.
#[utoipa::path(
    post,
    path = "/session/next",
    tag = "session",
    responses(
        (status = 200, description = "Advanced to the next question", body = SessionSnapshot),
        (status = 409, description = "Current question not answered yet")
    )
)]
pub async fn next_question(
    State(state): State<SharedState>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let snapshot = session_service::next_question(&state).await?;
    Ok(Json(snapshot))
}

/// Replay the same questions with a fresh shuffle, score and countdown.
#[utoipa::path(
    post,
    path = "/session/restart",
    tag = "session",
    responses(
        (status = 200, description = "Session restarted", body = SessionSnapshot),
        (status = 409, description = "Session has not ended")
    )
)]
pub async fn restart(State(state): State<SharedState>) -> Result<Json<SessionSnapshot>, AppError> {
    let snapshot = session_service::restart(&state).await?;
    Ok(Json(snapshot))
}

/// Drop the ended session and return to the selection screen.
#[utoipa::path(
    post,
    path = "/session/play-again",
    tag = "session",
    responses(
        (status = 200, description = "Back to selection", body = SessionSnapshot),
        (status = 409, description = "Session has not ended")
    )
)]
pub async fn play_again(
    State(state): State<SharedState>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let snapshot = session_service::play_again(&state).await?;
    Ok(Json(snapshot))
}

/// Abandon the running session, keeping the score accumulated so far.
#[utoipa::path(
    post,
    path = "/session/quit",
    tag = "session",
    responses(
        (status = 200, description = "Session abandoned", body = ActionResponse),
        (status = 409, description = "No session is running")
    )
)]
pub async fn quit(State(state): State<SharedState>) -> Result<Json<ActionResponse>, AppError> {
    let response = session_service::quit(&state).await?;
    Ok(Json(response))
}

/// Read the current session snapshot without changing anything.
#[utoipa::path(
    get,
    path = "/session",
    tag = "session",
    responses(
        (status = 200, description = "Current session snapshot", body = SessionSnapshot)
    )
)]
pub async fn get_session(State(state): State<SharedState>) -> Json<SessionSnapshot> {
    Json(session_service::build_snapshot(&state).await)
}
