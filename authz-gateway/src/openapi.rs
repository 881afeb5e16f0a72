use crate::state::AppState;
use axum::{routing::get, Json, Router};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

pub(crate) const HEALTH_TAG: &str = "Health API";
pub(crate) const AUTHZ_TAG: &str = "Authorization API";

#[derive(OpenApi)]
#[openapi(
    tags(
        (name = HEALTH_TAG, description = "Health check endpoints"),
        (name = AUTHZ_TAG, description = "Authorization endpoints"),
    ),
    info(
        title = "Authorization Gateway API",
        description = "Gates document access on policy engine decisions",
        version = "0.1.0"
    )
)]
pub(crate) struct ApiDoc;

/// Creates a router serving the generated OpenAPI document and its Scalar UI
pub(crate) fn router(api_doc: utoipa::openapi::OpenApi) -> Router<AppState> {
    let document = api_doc.clone();
    Router::new()
        .route("/openapi.json", get(move || async move { Json(document) }))
        .merge(Scalar::with_url("/scalar", api_doc))
}
