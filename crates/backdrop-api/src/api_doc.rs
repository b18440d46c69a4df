//! OpenAPI documentation, served at `/api/openapi.json`.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use backdrop_core::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Backdrop API",
        version = "0.1.0",
        description = "Background removal and AI background replacement. Uploads are cut out by a remove.bg compatible service; new backgrounds are generated from a text prompt."
    ),
    paths(
        handlers::remove_bg::remove_background,
        handlers::change_bg::change_background,
    ),
    components(schemas(
        models::ChangeBackgroundRequest,
        models::ChangeBackgroundResponse,
        error::ErrorResponse,
    )),
    tags(
        (name = "background", description = "Background removal and replacement")
    )
)]
pub struct ApiDoc;

pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
