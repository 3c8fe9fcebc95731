use axum::{
    Json,
    body::Body,
    extract::{Multipart, Path, Query, State, rejection::QueryRejection},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use futures::TryStreamExt;
use tokio_util::io::StreamReader;

use crate::adapters::inbound::http::{
    middleware::GATEWAY_MODE_HEADER,
    dto::{
        ApiResult, DEFAULT_PRESIGN_EXPIRY_SECS, DeleteObjectResponseDto, ListObjectsResponseDto,
        ObjectInfoDto, PresignedUrlQuery, PresignedUrlResponseDto, UploadResponseDto, api_error,
        bad_request,
    },
    router::AppState,
};

/// Handle object listing
pub async fn list_objects(
    State(app_state): State<AppState>,
    Path(bucket): Path<String>,
) -> ApiResult<Json<ListObjectsResponseDto>> {
    let gateway = &app_state.gateway;

    let served = match gateway.list_objects(&bucket).await {
        Ok(served) => served,
        Err(e) => return Err(api_error(e, gateway.mode().await)),
    };

    let objects: Vec<ObjectInfoDto> = served.value.into_iter().map(Into::into).collect();
    Ok(Json(ListObjectsResponseDto {
        bucket,
        count: objects.len(),
        objects,
        mode: served.mode,
    }))
}

/// Handle a multipart form upload. An optional `key` field must precede the
/// `file` field; without it the file name is used as the key.
pub async fn upload_object_form(
    State(app_state): State<AppState>,
    Path(bucket): Path<String>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<UploadResponseDto>)> {
    let gateway = &app_state.gateway;
    let mut key: Option<String> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return Err(bad_request(
                    format!("Malformed multipart body: {}", e.body_text()),
                    gateway.mode().await,
                ));
            }
        };

        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("key") => {
                match field.text().await {
                    Ok(text) if !text.trim().is_empty() => key = Some(text.trim().to_string()),
                    Ok(_) => {}
                    Err(e) => return Err(bad_request(e.body_text(), gateway.mode().await)),
                }
            }
            Some("file") => {
                let Some(object_key) = key.take().or_else(|| field.file_name().map(str::to_string))
                else {
                    return Err(bad_request(
                        "No key given and the file part has no file name",
                        gateway.mode().await,
                    ));
                };

                let reader = StreamReader::new(Box::pin(field.map_err(std::io::Error::other)));
                let served = match gateway
                    .upload_object(&bucket, &object_key, reader, None)
                    .await
                {
                    Ok(served) => served,
                    Err(e) => return Err(api_error(e, gateway.mode().await)),
                };

                return Ok((
                    StatusCode::CREATED,
                    Json(UploadResponseDto::new(served.value, served.mode)),
                ));
            }
            _ => {}
        }
    }

    Err(bad_request("No file provided", gateway.mode().await))
}

/// Handle a raw-body upload to an explicit key
pub async fn put_object(
    State(app_state): State<AppState>,
    Path((bucket, key)): Path<(String, String)>,
    headers: HeaderMap,
    body: Body,
) -> ApiResult<(StatusCode, Json<UploadResponseDto>)> {
    let gateway = &app_state.gateway;

    let declared_length = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());

    let reader = StreamReader::new(Box::pin(
        body.into_data_stream().map_err(std::io::Error::other),
    ));

    let served = match gateway
        .upload_object(&bucket, &key, reader, declared_length)
        .await
    {
        Ok(served) => served,
        Err(e) => return Err(api_error(e, gateway.mode().await)),
    };

    Ok((
        StatusCode::CREATED,
        Json(UploadResponseDto::new(served.value, served.mode)),
    ))
}

/// Handle object download, streaming the body
pub async fn get_object(
    State(app_state): State<AppState>,
    Path((bucket, key)): Path<(String, String)>,
) -> ApiResult<Response> {
    let gateway = &app_state.gateway;

    let served = match gateway.download_object(&bucket, &key).await {
        Ok(served) => served,
        Err(e) => return Err(api_error(e, gateway.mode().await)),
    };

    let download = served.value;
    let file_name = download
        .key
        .rsplit('/')
        .next()
        .unwrap_or(download.key.as_str())
        .replace('"', "");

    let headers = [
        (header::CONTENT_TYPE, "application/octet-stream".to_string()),
        (header::CONTENT_LENGTH, download.size.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", file_name),
        ),
        (GATEWAY_MODE_HEADER, served.mode.as_str().to_string()),
    ];

    Ok((StatusCode::OK, headers, Body::from_stream(download.stream)).into_response())
}

/// Handle object deletion
pub async fn delete_object(
    State(app_state): State<AppState>,
    Path((bucket, key)): Path<(String, String)>,
) -> ApiResult<Json<DeleteObjectResponseDto>> {
    let gateway = &app_state.gateway;

    let served = match gateway.delete_object(&bucket, &key).await {
        Ok(served) => served,
        Err(e) => return Err(api_error(e, gateway.mode().await)),
    };

    Ok(Json(DeleteObjectResponseDto {
        success: true,
        bucket,
        key: served.value.to_string(),
        mode: served.mode,
    }))
}

/// Handle presigned URL generation
pub async fn presigned_url(
    State(app_state): State<AppState>,
    Path(bucket): Path<String>,
    query: Result<Query<PresignedUrlQuery>, QueryRejection>,
) -> ApiResult<Json<PresignedUrlResponseDto>> {
    let gateway = &app_state.gateway;

    let params = match query {
        Ok(Query(params)) => params,
        Err(rejection) => {
            return Err(bad_request(
                format!("Invalid query: {}", rejection.body_text()),
                gateway.mode().await,
            ));
        }
    };

    let Some(key) = params.key.filter(|k| !k.is_empty()) else {
        return Err(bad_request("key is required", gateway.mode().await));
    };
    let expires_in = params.expires_in.unwrap_or(DEFAULT_PRESIGN_EXPIRY_SECS);

    let served = match gateway.presigned_url(&bucket, &key, expires_in).await {
        Ok(served) => served,
        Err(e) => return Err(api_error(e, gateway.mode().await)),
    };

    Ok(Json(PresignedUrlResponseDto {
        url: served.value,
        bucket,
        key,
        expires_in,
        mode: served.mode,
    }))
}
