use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use tracing::{info, instrument};

use emo_cat_guide_domain::auth::UserInfo;
use emo_cat_guide_domain::entities::{CatCard, FeaturedCat};
use emo_cat_guide_domain::services::{featured_cats, AppServices};

use crate::entities::responses::CatCardResponse;
use crate::entities::ErrorResponse;

/// Generate a cat companion card from the latest report and questionnaire
#[utoipa::path(
    post,
    path = "/api/v1/cards",
    responses(
        (status = 201, description = "Card generated", body = CatCardResponse),
        (status = 401, description = "Not authenticated"),
        (status = 409, description = "Report or questionnaire missing", body = ErrorResponse),
    ),
    security(
        ("bearer" = [])
    ),
    tag = "cards"
)]
#[instrument(skip(services), fields(user_id = %user.user_id))]
pub async fn generate_card(
    State(services): State<AppServices>,
    Extension(user): Extension<UserInfo>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let card = services.cat_cards.generate(&user.user_id).await?;
    info!("Generated card {} with {}", card.id, card.cat);

    Ok((
        StatusCode::CREATED,
        Json(CatCardResponse {
            message: "Cat card generated".to_string(),
            card,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/cards",
    responses(
        (status = 200, description = "Cards, newest first", body = [CatCard]),
        (status = 401, description = "Not authenticated"),
    ),
    security(
        ("bearer" = [])
    ),
    tag = "cards"
)]
#[instrument(skip(services), fields(user_id = %user.user_id))]
pub async fn list_cards(
    State(services): State<AppServices>,
    Extension(user): Extension<UserInfo>,
) -> Result<Json<Vec<CatCard>>, ErrorResponse> {
    Ok(Json(services.cat_cards.list(&user.user_id).await?))
}

/// The nine-grid of cat companions shown on the landing page
#[utoipa::path(
    get,
    path = "/cats/featured",
    responses(
        (status = 200, description = "Featured cats", body = [FeaturedCat]),
    ),
    tag = "cards"
)]
pub async fn get_featured_cats() -> Json<Vec<FeaturedCat>> {
    Json(featured_cats())
}
