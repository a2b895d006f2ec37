use actix_web::{web, HttpServer};
use boba::{config, http, logging, App};
use error_stack::{Result, ResultExt};
use thiserror::Error;
use tracing_actix_web::TracingLogger;

#[derive(Debug, Error)]
#[error("Failed to run the server")]
struct ServerError;

#[tokio::main]
async fn main() -> Result<(), ServerError> {
  let config = config::Server::load().change_context(ServerError)?;
  logging::init(&config.logging).change_context(ServerError)?;

  let (ip, port, workers) = (config.ip, config.port, config.workers);
  let app = App::new(config).await.change_context(ServerError)?;
  tracing::info!(%ip, port, workers, "starting http server");

  let data = app.clone();
  let result = HttpServer::new(move || {
    actix_web::App::new()
      .app_data(web::Data::new(data.clone()))
      .app_data(http::util::json_config())
      .wrap(TracingLogger::default())
      .configure(http::controllers::configure)
      .default_service(web::to(http::util::not_found))
  })
  .workers(workers)
  .bind((ip, port))
  .change_context(ServerError)
  .attach_printable_lazy(|| format!("could not bind to {ip}:{port}"))?
  .run()
  .await
  .change_context(ServerError);

  tracing::info!("shutting down");
  app.close().await;
  result
}
