use actix_web::HttpResponse;
use utoipa::OpenApi;

use crate::http::openapi::ApiDoc;

#[utoipa::path(
  get,
  path = "/open-api.json",
  tag = "docs",
  responses((status = 200, description = "`OpenAPI` document of this server"))
)]
pub async fn open_api() -> HttpResponse {
  HttpResponse::Ok().json(ApiDoc::openapi())
}
