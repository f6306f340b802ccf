use axum::extract::{Multipart, Path, Query};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::domain::TenantKey;
use crate::error::ApiError;
use crate::services::Services;

const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Serialize)]
pub struct IndexResponse {
    success: bool,
    message: String,
    document_count: u32,
    chunk_count: usize,
    processing_time: f64,
    collection_name: String,
}

pub async fn index_handler(
    Extension(services): Extension<Arc<Services>>,
    mut multipart: Multipart,
) -> Result<Json<IndexResponse>, ApiError> {
    let mut file_name: Option<String> = None;
    let mut file_bytes: Option<Vec<u8>> = None;
    let mut course_id: Option<String> = None;
    let mut course_material_id: Option<String> = None;
    let mut course_material_name: Option<String> = None;
    let mut collection_name: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("invalid multipart body: {e}")))?
    {
        match field.name().unwrap_or_default() {
            "file" => {
                file_name = field.file_name().map(String::from);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("failed to read file field: {e}")))?;
                if bytes.len() > MAX_UPLOAD_BYTES {
                    return Err(ApiError::BadRequest("file exceeds 10 MiB limit".to_string()));
                }
                file_bytes = Some(bytes.to_vec());
            }
            "course_id" => course_id = Some(text_field(field).await?),
            "course_material_id" => course_material_id = Some(text_field(field).await?),
            "course_material_name" => course_material_name = Some(text_field(field).await?),
            "collection_name" => collection_name = Some(text_field(field).await?),
            _ => {}
        }
    }

    let file_name = file_name.ok_or_else(|| ApiError::BadRequest("missing file field".to_string()))?;
    if !file_name.ends_with(".md") && !file_name.ends_with(".txt") {
        return Err(ApiError::BadRequest(
            "only .md and .txt files are accepted".to_string(),
        ));
    }

    let file_bytes = file_bytes.ok_or_else(|| ApiError::BadRequest("missing file contents".to_string()))?;
    let text = String::from_utf8(file_bytes)
        .map_err(|_| ApiError::BadRequest("file is not valid UTF-8 text".to_string()))?;

    let course_id = course_id.ok_or_else(|| ApiError::BadRequest("missing course_id".to_string()))?;
    let course_material_id =
        course_material_id.ok_or_else(|| ApiError::BadRequest("missing course_material_id".to_string()))?;
    let material_name = course_material_name
        .ok_or_else(|| ApiError::BadRequest("missing course_material_name".to_string()))?;

    let tenant = TenantKey::new(course_id, course_material_id)?;

    let _guard = services.tenant_locks.acquire(&tenant).await;

    let result = services
        .indexing
        .build_index(&text, tenant, material_name, collection_name)
        .await?;

    Ok(Json(IndexResponse {
        success: result.success,
        message: "document indexed".to_string(),
        document_count: 1,
        chunk_count: result.chunk_count,
        processing_time: result.processing_time,
        collection_name: result.collection_name,
    }))
}

async fn text_field(field: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::BadRequest(format!("invalid form field: {e}")))
}

#[derive(Serialize)]
pub struct CollectionSummary {
    name: String,
    vectors_count: u64,
}

pub async fn list_collections_handler(
    Extension(services): Extension<Arc<Services>>,
) -> Result<Json<Vec<CollectionSummary>>, ApiError> {
    let collections = services.vector_store.list_collections().await?;
    Ok(Json(
        collections
            .into_iter()
            .map(|c| CollectionSummary {
                name: c.name,
                vectors_count: c.vectors_count,
            })
            .collect(),
    ))
}

pub async fn get_collection_handler(
    Extension(services): Extension<Arc<Services>>,
    Path(name): Path<String>,
) -> Result<Json<CollectionSummary>, ApiError> {
    let collections = services.vector_store.list_collections().await?;
    collections
        .into_iter()
        .find(|c| c.name == name)
        .map(|c| {
            Json(CollectionSummary {
                name: c.name,
                vectors_count: c.vectors_count,
            })
        })
        .ok_or_else(|| ApiError::NotFound(format!("collection '{name}' not found")))
}

#[derive(Serialize)]
pub struct DeleteCollectionResponse {
    success: bool,
    collection_name: String,
    message: String,
}

pub async fn delete_collection_handler(
    Extension(services): Extension<Arc<Services>>,
    Path(name): Path<String>,
) -> Result<Json<DeleteCollectionResponse>, ApiError> {
    services.vector_store.delete_collection(&name).await?;
    Ok(Json(DeleteCollectionResponse {
        success: true,
        collection_name: name,
        message: "collection deleted".to_string(),
    }))
}

#[derive(Deserialize)]
pub struct CollectionQuery {
    collection_name: Option<String>,
}

#[derive(Serialize)]
pub struct DeleteByCourseResponse {
    success: bool,
    course_id: String,
    deleted_count: u64,
}

pub async fn delete_by_course_handler(
    Extension(services): Extension<Arc<Services>>,
    Path(course_id): Path<String>,
    Query(query): Query<CollectionQuery>,
) -> Result<Json<DeleteByCourseResponse>, ApiError> {
    let collection = query
        .collection_name
        .unwrap_or_else(|| services.settings.default_collection.clone());

    let deleted_count = services
        .vector_store
        .delete_by_filter(&collection, &crate::domain::FilterSpec::ByCourse(course_id.clone()))
        .await?;

    Ok(Json(DeleteByCourseResponse {
        success: true,
        course_id,
        deleted_count,
    }))
}

#[derive(Serialize)]
pub struct DeleteByMaterialResponse {
    success: bool,
    deleted_count: u64,
}

pub async fn delete_by_material_handler(
    Extension(services): Extension<Arc<Services>>,
    Path((course_id, course_material_id)): Path<(String, String)>,
    Query(query): Query<CollectionQuery>,
) -> Result<Json<DeleteByMaterialResponse>, ApiError> {
    let tenant = TenantKey::new(course_id, course_material_id.clone())?;
    let collection = query
        .collection_name
        .unwrap_or_else(|| services.settings.default_collection.clone());

    let _guard = services.tenant_locks.acquire(&tenant).await;

    let deleted_count = services
        .vector_store
        .delete_by_filter(&collection, &crate::domain::FilterSpec::ByMaterial(course_material_id))
        .await?;

    Ok(Json(DeleteByMaterialResponse {
        success: true,
        deleted_count,
    }))
}

#[derive(Serialize)]
pub struct CollectionCountResponse {
    collection_name: String,
    document_count: u64,
}

pub async fn collection_count_handler(
    Extension(services): Extension<Arc<Services>>,
    Path(name): Path<String>,
) -> Result<Json<CollectionCountResponse>, ApiError> {
    let document_count = services.vector_store.count(&name).await?;
    Ok(Json(CollectionCountResponse {
        collection_name: name,
        document_count,
    }))
}
