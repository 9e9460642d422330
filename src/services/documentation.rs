use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Trivia Rush Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::public_stream,
        crate::routes::session::start_session,
        crate::routes::session::toggle_pause,
        crate::routes::session::select_answer,
        crate::routes::session::next_question,
        crate::routes::session::restart,
        crate::routes::session::play_again,
        crate::routes::session::quit,
        crate::routes::session::get_session,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::phase::VisiblePhase,
            crate::dto::session::StartSessionRequest,
            crate::dto::session::DifficultyDto,
            crate::dto::session::SelectAnswerRequest,
            crate::dto::session::AnswerStatus,
            crate::dto::session::AnswerOptionView,
            crate::dto::session::QuestionView,
            crate::dto::session::SessionSnapshot,
            crate::dto::session::ActionResponse,
            crate::dto::sse::PhaseChangedEvent,
            crate::dto::sse::TimerTickEvent,
            crate::dto::sse::TimerWarningEvent,
            crate::dto::sse::ScoreChangedEvent,
            crate::dto::sse::QuestionAdvancedEvent,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "session", description = "Quiz session lifecycle and gameplay"),
        (name = "sse", description = "Server-sent events streams"),
    )
)]
pub struct ApiDoc;
