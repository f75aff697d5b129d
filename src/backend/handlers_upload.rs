//! `POST /upload`: token check, file extraction, size and type checks, storage.
//!
//! Each check is a gate; the first one that fails decides the response.

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{Multipart, State};
use axum::Json;
use http::{header, HeaderMap, StatusCode};
use log::{error, info, warn};

use super::error::{UploadError, UploadResponse};
use super::AppState;
use crate::config::Config;
use crate::consts;
use crate::utils::input;
use crate::utils::storage::SpoolFile;

/// Upload part as read from the form.
///
/// `spool` is `None` when the extension is not allowed, so nothing touches the disk.
struct ReceivedFile {
    name: String,
    stored_name: String,
    size: u64,
    spool: Option<SpoolFile>,
}

pub async fn upload(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, UploadError> {
    match process_upload(&state, &headers, multipart).await {
        Ok(url) => Ok(Json(UploadResponse::ok(url))),
        Err(err) => {
            log_rejection(&err);
            Err(err)
        }
    }
}

async fn process_upload(
    state: &AppState,
    headers: &HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<String, UploadError> {
    let config = state
        .config
        .current()
        .await
        .map_err(UploadError::ConfigLoad)?;

    let presented = headers
        .get(header::AUTHORIZATION)
        .map(|value| value.as_bytes())
        .unwrap_or_default();
    if !input::token_matches(presented, config.token.as_bytes()) {
        return Err(UploadError::InvalidToken);
    }

    let mut multipart = multipart.map_err(|rejection| {
        warn!("upload is not a multipart form: {}", rejection.body_text());
        UploadError::MissingFile
    })?;
    let file = receive_file(&mut multipart, &config).await?;

    let spool = file.spool.ok_or(UploadError::InvalidFileType)?;
    let path = spool.commit().await?;
    info!(
        "stored {:?} ({} bytes) at {}",
        file.name,
        file.size,
        path.display()
    );

    Ok(format!("{}{}", config.public_url_prefix, file.stored_name))
}

/// Reads form fields until the first upload part with a file name and streams
/// it into a spool file in the upload directory.
///
/// The byte count is enforced while reading, so a client cannot slip past the
/// limit by misreporting the part size. Other fields are drained and never
/// count against the limit.
async fn receive_file(
    multipart: &mut Multipart,
    config: &Config,
) -> Result<ReceivedFile, UploadError> {
    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|err| read_error(err, false))?
    {
        let is_upload = field.name() == Some(consts::UPLOAD_FIELD);
        let name = field.file_name().unwrap_or_default().to_string();

        if !is_upload || name.is_empty() {
            while field
                .chunk()
                .await
                .map_err(|err| read_error(err, false))?
                .is_some()
            {}
            continue;
        }

        let stored_name = input::hashed_file_name(&name);
        let mut spool = if input::is_extension_allowed(&name, &config.allowed_exts) {
            Some(SpoolFile::create(&config.upload_path, &stored_name).await)
        } else {
            None
        };

        let mut size: u64 = 0;
        while let Some(chunk) = field.chunk().await.map_err(|err| read_error(err, true))? {
            size = size.saturating_add(chunk.len() as u64);
            if size > config.max_file_size {
                return Err(UploadError::FileTooLarge);
            }
            if let Some(spool) = spool.as_mut() {
                spool.write(&chunk).await;
            }
        }

        return Ok(ReceivedFile {
            name,
            stored_name,
            size,
            spool,
        });
    }

    Err(UploadError::MissingFile)
}

/// A body-limit hit only means "too large" while the upload part itself is being read.
fn read_error(err: MultipartError, in_upload: bool) -> UploadError {
    if in_upload && err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        UploadError::FileTooLarge
    } else {
        warn!("malformed multipart body: {}", err.body_text());
        UploadError::MissingFile
    }
}

fn log_rejection(err: &UploadError) {
    match err {
        UploadError::ConfigLoad(source) => error!("upload refused: {err}: {source}"),
        UploadError::StorageCreate(source) | UploadError::StorageWrite(source) => {
            error!("upload failed: {err}: {source}")
        }
        _ => warn!("upload rejected: {err}"),
    }
}
