use crate::{api::attendance, config::Config};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::web;

/// Per-IP limiter for the reporting scope. Build it once and hand every
/// worker a clone so they share one quota.
pub fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / u64::from(requests_per_min)).max(1);
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        // burst_size and period are both non-zero above
        .unwrap();
    Governor::new(&cfg)
}

pub fn configure(
    cfg: &mut web::ServiceConfig,
    config: &Config,
    reports_limiter: Governor<PeerIpKeyExtractor, NoOpMiddleware>,
) {
    cfg.service(
        web::scope(&config.api_prefix).service(
            web::scope("/attendance")
                .wrap(reports_limiter) // rate limiting
                // /attendance/employees/{employee_id}/...
                .service(
                    web::resource("/employees/{employee_id}/day")
                        .route(web::get().to(attendance::day_attendance)),
                )
                .service(
                    web::resource("/employees/{employee_id}/monthly")
                        .route(web::get().to(attendance::monthly_statistics)),
                )
                // /attendance/overview
                .service(web::resource("/overview").route(web::get().to(attendance::overview)))
                .service(
                    web::resource("/overview/monthly")
                        .route(web::get().to(attendance::monthly_overview)),
                )
                // /attendance/summary
                .service(
                    web::resource("/summary").route(web::get().to(attendance::monthly_summary)),
                )
                // /attendance/employees
                .service(web::resource("/employees").route(web::get().to(attendance::roster)))
                // daily exception lists
                .service(web::resource("/late").route(web::get().to(attendance::late_employees)))
                .service(
                    web::resource("/early-leave")
                        .route(web::get().to(attendance::early_leave_employees)),
                )
                .service(
                    web::resource("/overtime").route(web::get().to(attendance::overtime_employees)),
                ),
        ),
    );
}
