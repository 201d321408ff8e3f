use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use dotenvy::dotenv;

mod api;
mod attendance;
mod config;
mod db;
mod docs;
mod model;
mod routes;
mod utils;

use config::Config;
use db::{MySqlAttendanceStore, init_db};

use crate::attendance::service::AttendanceService;
use crate::docs::ApiDoc;
use tracing::info;
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "Attendance service is running"
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    let config = Config::from_env().map_err(std::io::Error::other)?;
    let settings = config
        .attendance_settings()
        .map_err(std::io::Error::other)?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!(
        business_offset = %settings.business_offset,
        parallel_threshold = settings.parallel_threshold,
        "Server starting..."
    );

    let pool = init_db(&config.database_url)
        .await
        .map_err(std::io::Error::other)?;
    let service = Data::new(AttendanceService::new(
        MySqlAttendanceStore::new(pool),
        settings,
    ));

    let server_addr = config.server_addr.clone();
    let reports_limiter = routes::build_limiter(config.rate_reports_per_min);

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(service.clone())
            .service(index)
            .configure(|cfg| routes::configure(cfg, &config, reports_limiter.clone()))
    })
    .bind(server_addr)?
    .run()
    .await
}
