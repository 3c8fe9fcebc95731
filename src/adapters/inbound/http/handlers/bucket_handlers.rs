use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};

use crate::adapters::inbound::http::{
    dto::{
        ApiResult, BucketListResponseDto, BucketResponseDto, CreateBucketDto, api_error,
        bad_request,
    },
    router::AppState,
};

/// Handle bucket listing
pub async fn list_buckets(
    State(app_state): State<AppState>,
) -> ApiResult<Json<BucketListResponseDto>> {
    let gateway = &app_state.gateway;

    let served = match gateway.list_buckets().await {
        Ok(served) => served,
        Err(e) => return Err(api_error(e, gateway.mode().await)),
    };

    Ok(Json(BucketListResponseDto {
        count: served.value.len(),
        buckets: served.value,
        mode: served.mode,
    }))
}

/// Handle bucket creation
pub async fn create_bucket(
    State(app_state): State<AppState>,
    payload: Result<Json<CreateBucketDto>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<BucketResponseDto>)> {
    let gateway = &app_state.gateway;

    let bucket_name = match payload {
        Ok(Json(CreateBucketDto {
            bucket_name: Some(name),
        })) if !name.trim().is_empty() => name,
        Ok(_) => return Err(bad_request("bucket_name is required", gateway.mode().await)),
        Err(rejection) => {
            return Err(bad_request(
                format!("Invalid request body: {}", rejection.body_text()),
                gateway.mode().await,
            ));
        }
    };

    let served = match gateway.create_bucket(&bucket_name).await {
        Ok(served) => served,
        Err(e) => return Err(api_error(e, gateway.mode().await)),
    };

    Ok((
        StatusCode::CREATED,
        Json(BucketResponseDto {
            success: true,
            bucket: served.value.to_string(),
            message: "Bucket created successfully".to_string(),
            mode: served.mode,
        }),
    ))
}

/// Handle bucket deletion
pub async fn delete_bucket(
    State(app_state): State<AppState>,
    Path(bucket): Path<String>,
) -> ApiResult<Json<BucketResponseDto>> {
    let gateway = &app_state.gateway;

    let served = match gateway.delete_bucket(&bucket).await {
        Ok(served) => served,
        Err(e) => return Err(api_error(e, gateway.mode().await)),
    };

    Ok(Json(BucketResponseDto {
        success: true,
        bucket: served.value.to_string(),
        message: "Bucket deleted successfully".to_string(),
        mode: served.mode,
    }))
}
