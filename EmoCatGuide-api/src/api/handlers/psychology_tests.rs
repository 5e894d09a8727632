use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use tracing::instrument;

use emo_cat_guide_domain::auth::UserInfo;
use emo_cat_guide_domain::entities::{PsychologyTest, SubmitPsychologyTestRequest};
use emo_cat_guide_domain::services::AppServices;

use crate::entities::responses::{PsychologyTestResponse, NEXT_GENERATE_CARD};
use crate::entities::ErrorResponse;

/// Submit the Emo Guide questionnaire
#[utoipa::path(
    post,
    path = "/api/v1/psychology-tests",
    request_body = SubmitPsychologyTestRequest,
    responses(
        (status = 201, description = "Questionnaire stored", body = PsychologyTestResponse),
        (status = 400, description = "An answer is missing", body = ErrorResponse),
        (status = 401, description = "Not authenticated"),
    ),
    security(
        ("bearer" = [])
    ),
    tag = "psychology_tests"
)]
#[instrument(skip(services, request), fields(user_id = %user.user_id))]
pub async fn submit_psychology_test(
    State(services): State<AppServices>,
    Extension(user): Extension<UserInfo>,
    Json(request): Json<SubmitPsychologyTestRequest>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let test = services.psychology_tests.submit(&user.user_id, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(PsychologyTestResponse {
            message: "Psychology test submitted".to_string(),
            test,
            next_step: NEXT_GENERATE_CARD.to_string(),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/psychology-tests",
    responses(
        (status = 200, description = "Questionnaires, newest first", body = [PsychologyTest]),
        (status = 401, description = "Not authenticated"),
    ),
    security(
        ("bearer" = [])
    ),
    tag = "psychology_tests"
)]
#[instrument(skip(services), fields(user_id = %user.user_id))]
pub async fn list_psychology_tests(
    State(services): State<AppServices>,
    Extension(user): Extension<UserInfo>,
) -> Result<Json<Vec<PsychologyTest>>, ErrorResponse> {
    Ok(Json(services.psychology_tests.list(&user.user_id).await?))
}
