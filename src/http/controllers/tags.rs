use actix_web::{web, HttpRequest, HttpResponse};

use crate::{
  http::{Actor, Error},
  models::DbPostWithTags,
  projection::{assert_no_leakage, make_search_result, ServerPostWithTags},
  schema::TagFilter,
  types, App,
};

#[utoipa::path(
  get,
  path = "/tags/search",
  tag = "tags",
  params(
    ("tags" = Vec<String>, Query, description = "Tags every result must have. Repeat the key for more tags."),
    ("exclude" = Option<Vec<String>>, Query, description = "Tags no result may have. Repeat the key for more tags."),
  ),
  responses(
    (status = 200, description = "Matching posts, newest first", body = [ServerPostWithTags]),
    (status = 400, description = "No tags to include", body = types::Error),
  ),
  security((), ("bearer" = []))
)]
#[tracing::instrument(skip_all, fields(query = req.query_string()))]
pub async fn search(
  app: web::Data<App>,
  req: HttpRequest,
  actor: Actor,
) -> Result<HttpResponse, Error> {
  let filter = TagFilter::from_query(req.query_string())?;

  let mut conn = app.db_read().await?;
  let rows = DbPostWithTags::search(&mut conn, &filter, actor.firebase_id()).await?;
  drop(conn);

  let results = rows.iter().map(make_search_result).collect::<Vec<_>>();
  assert_no_leakage(&results)?;

  tracing::debug!(results = results.len(), "tag search done");
  Ok(HttpResponse::Ok().json(results))
}
