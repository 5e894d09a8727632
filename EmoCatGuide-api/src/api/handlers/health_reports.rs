use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use tracing::{info, instrument, warn};

use emo_cat_guide_domain::auth::UserInfo;
use emo_cat_guide_domain::entities::HealthReport;
use emo_cat_guide_domain::services::health_reports::ALREADY_UPLOADED;
use emo_cat_guide_domain::services::{AppServices, ServiceError};

use crate::entities::responses::{ReportUploadResponse, NEXT_PSYCHOLOGY_TEST};
use crate::entities::ErrorResponse;

/// Multipart field carrying the report file
pub const UPLOAD_FIELD: &str = "health_report";

fn multipart_error(err: MultipartError) -> ErrorResponse {
    warn!("Rejected multipart upload: {}", err);
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ErrorResponse::payload_too_large("File exceeds the upload size limit")
    } else {
        ErrorResponse::bad_request("Malformed multipart upload")
    }
}

/// Upload a health report (PDF, JPG or PNG)
#[utoipa::path(
    post,
    path = "/api/v1/health-reports",
    request_body(content = String, content_type = "multipart/form-data", description = "File in the `health_report` field"),
    responses(
        (status = 201, description = "Report stored and analyzed", body = ReportUploadResponse),
        (status = 400, description = "Missing or unsupported file", body = ErrorResponse),
        (status = 401, description = "Not authenticated"),
        (status = 409, description = "A report was already uploaded", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
    ),
    security(
        ("bearer" = [])
    ),
    tag = "health_reports"
)]
#[instrument(skip(services, multipart), fields(user_id = %user.user_id))]
pub async fn upload_health_report(
    State(services): State<AppServices>,
    Extension(user): Extension<UserInfo>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ErrorResponse> {
    // Answer a repeat upload before buffering its body
    if !services.health_reports.list(&user.user_id).await?.is_empty() {
        info!("User {} already has a health report", user.user_id);
        return Err(ServiceError::Conflict(ALREADY_UPLOADED.to_string()).into());
    }

    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(multipart_error)?;
        upload = Some((filename, bytes.to_vec()));
        break;
    }

    let (filename, bytes) = upload.unwrap_or_default();
    info!("Health report upload: {:?} ({} bytes)", filename, bytes.len());

    let report = services.health_reports.upload(&user.user_id, &filename, bytes).await?;

    Ok((
        StatusCode::CREATED,
        Json(ReportUploadResponse {
            message: "Health report uploaded".to_string(),
            report,
            next_step: NEXT_PSYCHOLOGY_TEST.to_string(),
        }),
    ))
}

/// List the reports of the current user
#[utoipa::path(
    get,
    path = "/api/v1/health-reports",
    responses(
        (status = 200, description = "Reports, newest first", body = [HealthReport]),
        (status = 401, description = "Not authenticated"),
    ),
    security(
        ("bearer" = [])
    ),
    tag = "health_reports"
)]
#[instrument(skip(services), fields(user_id = %user.user_id))]
pub async fn list_health_reports(
    State(services): State<AppServices>,
    Extension(user): Extension<UserInfo>,
) -> Result<Json<Vec<HealthReport>>, ErrorResponse> {
    Ok(Json(services.health_reports.list(&user.user_id).await?))
}

/// Get one report of the current user
#[utoipa::path(
    get,
    path = "/api/v1/health-reports/{id}",
    params(
        ("id" = String, Path, description = "Health report ID")
    ),
    responses(
        (status = 200, description = "Report found", body = HealthReport),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Report not found", body = ErrorResponse),
    ),
    security(
        ("bearer" = [])
    ),
    tag = "health_reports"
)]
#[instrument(skip(services), fields(user_id = %user.user_id))]
pub async fn get_health_report(
    State(services): State<AppServices>,
    Extension(user): Extension<UserInfo>,
    Path(id): Path<String>,
) -> Result<Json<HealthReport>, ErrorResponse> {
    Ok(Json(services.health_reports.get(&user.user_id, &id).await?))
}

/// Download the stored file of a report
#[utoipa::path(
    get,
    path = "/api/v1/health-reports/{id}/file",
    params(
        ("id" = String, Path, description = "Health report ID")
    ),
    responses(
        (status = 200, description = "Stored report file"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Report not found", body = ErrorResponse),
    ),
    security(
        ("bearer" = [])
    ),
    tag = "health_reports"
)]
#[instrument(skip(services), fields(user_id = %user.user_id))]
pub async fn get_health_report_file(
    State(services): State<AppServices>,
    Extension(user): Extension<UserInfo>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let file = services.health_reports.file(&user.user_id, &id).await?;

    // Quotes would break the header value
    let disposition = format!("inline; filename=\"{}\"", file.filename.replace('"', ""));

    Ok((
        [
            (header::CONTENT_TYPE, file.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        file.bytes,
    ))
}
