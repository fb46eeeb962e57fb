use crate::{
    api::{admin, attendance, employee},
    auth::middleware::auth_middleware,
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap();
        Governor::new(&cfg)
    }

    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));
    let export_limiter = Arc::new(build_limiter(config.rate_export_per_min));

    // Protected routes; token issuance lives in the identity provider,
    // so there is no public auth scope here.
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
             // authentication
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/attendance")
                    // /attendance
                    .service(
                        web::resource("")
                            .route(web::post().to(attendance::check_in))
                            .route(web::put().to(attendance::check_out)),
                    )
                    // /attendance/break
                    .service(
                        web::resource("/break")
                            .route(web::post().to(attendance::start_break))
                            .route(web::put().to(attendance::end_break)),
                    )
                    // /attendance/note
                    .service(
                        web::resource("/note").route(web::put().to(attendance::set_work_note)),
                    )
                    // /attendance/today
                    .service(
                        web::resource("/today").route(web::get().to(attendance::today_status)),
                    )
                    // /attendance/export
                    .service(
                        web::resource("/export")
                            .wrap(export_limiter.clone())
                            .route(web::get().to(attendance::export_my_attendance)),
                    ),
            )
            .service(
                web::scope("/admin")
                    .service(
                        web::resource("/attendance")
                            .route(web::get().to(admin::attendance_list)),
                    )
                    .service(web::resource("/dashboard").route(web::get().to(admin::dashboard)))
                    .service(
                        web::resource("/reports/attendance")
                            .wrap(export_limiter)
                            .route(web::get().to(admin::export_report)),
                    ),
            )
            .service(
                web::scope("/employees")
                    // /employees
                    .service(
                        web::resource("")
                            .route(web::post().to(employee::create_employee))
                            .route(web::get().to(employee::list_employees)),
                    )
                    // /employees/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(employee::update_employee))
                            .route(web::get().to(employee::get_employee))
                            .route(web::delete().to(employee::delete_employee)),
                    ),
            ),
    );
}
