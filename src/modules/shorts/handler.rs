use axum::{
    Form, Json,
    extract::{FromRequest, Multipart, Query, Request, State},
    http::{StatusCode, header},
};
use tracing::{info, warn};
use uuid::Uuid;

use super::acquisition::{JobInputs, PayloadShape};
use super::dto::{RunForm, RunResponse};
use super::service::ShortsService;
use super::workspace::JobWorkspace;
use crate::common::error::{AppError, AppResult, ErrorBody};
use crate::common::response::{ApiResponse, ApiSuccess};
use crate::common::upload::{AUDIO_EXTENSIONS, VIDEO_EXTENSIONS, allowed_file, stream_to_file};
use crate::state::AppState;

pub const RUN_SUCCESS_MESSAGE: &str = "YouTube Short processed and uploaded successfully";

/// Process a video and publish it as a YouTube Short
///
/// Accepts JSON, form-encoded, multipart (`video_file`, `audio_file`) or a raw
/// `video/*` / `audio/*` body with metadata in the query string.
#[utoipa::path(
    post,
    path = "/run",
    request_body(content = RunForm, content_type = "application/json"),
    responses(
        (status = 200, description = "Video processed and uploaded", body = ApiResponse<RunResponse>),
        (status = 400, description = "Invalid input", body = ErrorBody),
        (status = 500, description = "Transcoding failed", body = ErrorBody),
        (status = 502, description = "Download, authentication or upload failed", body = ErrorBody)
    ),
    tag = "Shorts"
)]
pub async fn run(
    State(state): State<AppState>,
    request: Request,
) -> AppResult<ApiSuccess<ApiResponse<RunResponse>>> {
    let id = Uuid::new_v4();
    let workspace = JobWorkspace::create(&state.config.work_dir, id).await?;

    let job = match read_request(&state, request, &workspace).await {
        Ok((form, inputs)) => form.into_job(id, inputs),
        Err(e) => Err(e),
    };
    let job = match job {
        Ok(job) => job,
        Err(e) => {
            warn!(job_id = %id, "Rejected request: {}", e);
            workspace.cleanup().await;
            return Err(e);
        }
    };

    let response = ShortsService::run(&state, job, workspace).await?;

    Ok(ApiSuccess(
        ApiResponse::success(response, RUN_SUCCESS_MESSAGE),
        StatusCode::OK,
    ))
}

async fn read_request(
    state: &AppState,
    request: Request,
    workspace: &JobWorkspace,
) -> AppResult<(RunForm, JobInputs)> {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let shape = PayloadShape::classify(content_type.as_deref());
    info!(job_id = %workspace.id(), "Received {:?} request", shape);

    let mut inputs = JobInputs::default();

    let form = match shape {
        PayloadShape::RawVideo | PayloadShape::RawAudio => {
            let form = query_form(&request)?;
            let body = axum::body::to_bytes(request.into_body(), state.config.max_body_bytes)
                .await
                .map_err(|e| AppError::client_input(format!("Failed to read request body: {}", e)))?;

            if shape == PayloadShape::RawVideo {
                inputs.raw_video = Some(body);
            } else {
                inputs.raw_audio = Some(body);
            }
            form
        }
        PayloadShape::Json => {
            let Json(form) = Json::<RunForm>::from_request(request, state)
                .await
                .map_err(|e| AppError::client_input(e.body_text()))?;
            form
        }
        PayloadShape::Form => {
            let Form(form) = Form::<RunForm>::from_request(request, state)
                .await
                .map_err(|e| AppError::client_input(e.body_text()))?;
            form
        }
        PayloadShape::Multipart => {
            let multipart = Multipart::from_request(request, state)
                .await
                .map_err(|e| AppError::client_input(e.body_text()))?;
            read_multipart(multipart, workspace, &mut inputs).await?
        }
        PayloadShape::Empty => query_form(&request)?,
    };

    Ok((form, inputs))
}

fn query_form(request: &Request) -> AppResult<RunForm> {
    let Query(form) = Query::<RunForm>::try_from_uri(request.uri())
        .map_err(|e| AppError::client_input(e.body_text()))?;
    Ok(form)
}

/// Streams file fields into the workspace and collects the text fields.
/// Files with a missing name or a disallowed extension are skipped.
async fn read_multipart(
    mut multipart: Multipart,
    workspace: &JobWorkspace,
    inputs: &mut JobInputs,
) -> AppResult<RunForm> {
    let mut form = RunForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::client_input(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        let file_name = field.file_name().unwrap_or("").to_string();

        let (allowed, dest) = match name.as_str() {
            "video_file" => (VIDEO_EXTENSIONS, workspace.input_video()),
            "audio_file" => (AUDIO_EXTENSIONS, workspace.input_audio()),
            _ => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::client_input(format!("Unreadable field {}: {}", name, e)))?;
                form.set_field(&name, value)?;
                continue;
            }
        };

        if file_name.is_empty() || !allowed_file(&file_name, allowed) {
            warn!(job_id = %workspace.id(), "Ignoring {} upload {:?}", name, file_name);
            continue;
        }

        stream_to_file(field, &dest)
            .await
            .map_err(|e| AppError::client_input(format!("Failed to save {}: {}", name, e)))?;

        if name == "video_file" {
            inputs.stored_video = Some(dest);
        } else {
            inputs.stored_audio = Some(dest);
        }
    }

    Ok(form)
}
