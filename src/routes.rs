use crate::{
    api::{assignment, attendance, location, reports},
    auth::{handlers, middleware::auth_middleware},
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

    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/admin/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::admin_login)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            // authentication
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/attendance")
                    .service(web::resource("/today").route(web::get().to(attendance::today)))
                    .service(web::resource("/confirm").route(web::post().to(attendance::confirm)))
                    .service(web::resource("/history").route(web::get().to(attendance::history)))
                    .service(web::resource("/pending").route(web::get().to(attendance::pending)))
                    .service(web::resource("/report").route(web::get().to(reports::report)))
                    .service(
                        web::resource("/statistics").route(web::get().to(reports::statistics)),
                    ),
            )
            .service(
                web::scope("/locations")
                    // /locations/nearby before /locations/{id} so "nearby"
                    // is not captured as an id
                    .service(
                        web::resource("/nearby").route(web::get().to(location::nearby_locations)),
                    )
                    .service(
                        web::resource("/{id}/validate")
                            .route(web::post().to(location::validate_position)),
                    )
                    // /locations
                    .service(
                        web::resource("")
                            .route(web::post().to(location::create_location))
                            .route(web::get().to(location::list_locations)),
                    )
                    // /locations/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(location::get_location))
                            .route(web::put().to(location::update_location))
                            .route(web::delete().to(location::delete_location)),
                    ),
            )
            .service(
                web::scope("/assignments")
                    .service(
                        web::resource("/mine").route(web::get().to(assignment::my_assignments)),
                    )
                    // /assignments
                    .service(
                        web::resource("")
                            .route(web::post().to(assignment::create_assignment))
                            .route(web::get().to(assignment::list_assignments)),
                    )
                    // /assignments/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(assignment::update_assignment))
                            .route(web::delete().to(assignment::delete_assignment)),
                    ),
            ),
    );
}
