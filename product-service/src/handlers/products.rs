use crate::dtos::ProductResponse;
use crate::startup::AppState;
use axum::{extract::State, Extension, Json};
use service_core::error::AppError;
use service_core::middleware::RequestId;

/// `GET /api/products`: every product in the collection.
pub async fn list_products(
    State(state): State<AppState>,
    request_id: Option<Extension<RequestId>>,
) -> Result<Json<Vec<ProductResponse>>, AppError> {
    let request_id = request_id.map(|Extension(RequestId(id))| id);
    let store = state.ready_store()?;

    let products = store.find_all().await.map_err(|e| {
        tracing::error!(error = %e, request_id = ?request_id, "Error retrieving products");
        AppError::InternalError(anyhow::anyhow!("Failed to retrieve products"))
    })?;

    let Some(products) = products else {
        return Err(AppError::NotFound(anyhow::anyhow!("No products found")));
    };

    tracing::debug!(
        count = products.len(),
        request_id = ?request_id,
        "Retrieved products"
    );
    Ok(Json(
        products.into_iter().map(ProductResponse::from).collect(),
    ))
}
