use crate::{
    api::{attendance, payroll, settings, staff},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware,
};
use actix_web::web;
use anyhow::{Context, Result};

pub type LimiterConfig = GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware>;

/// Per-route limiter settings, built once at startup.
#[derive(Clone)]
pub struct RateLimits {
    pub punch: LimiterConfig,
    pub protected: LimiterConfig,
}

impl RateLimits {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            punch: build_limiter(config.rate_punch_per_min).context("invalid RATE_PUNCH_PER_MIN")?,
            protected: build_limiter(config.rate_protected_per_min)
                .context("invalid RATE_PROTECTED_PER_MIN")?,
        })
    }
}

fn build_limiter(requests_per_min: u32) -> Result<LimiterConfig> {
    let per_ms = if requests_per_min == 0 {
        1
    } else {
        (60_000 / requests_per_min as u64).max(1)
    };
    GovernorConfigBuilder::default()
        .milliseconds_per_request(per_ms)
        .burst_size(requests_per_min.max(1))
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .context("rate limiter rejected the configured period or burst size")
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config, limits: &RateLimits) {
    cfg.service(
        web::scope(&config.api_prefix).service(
            web::scope("/v1")
                // punches get their own budget so device bursts are not starved
                .service(
                    web::resource("/attendance/punch")
                        .wrap(Governor::new(&limits.punch))
                        .route(web::post().to(attendance::submit_punch)),
                )
                .service(
                    web::scope("")
                        .wrap(Governor::new(&limits.protected))
                        .service(
                            web::scope("/attendance")
                                // /attendance/{staff_id}/records
                                .service(
                                    web::resource("/{staff_id}/records")
                                        .route(web::get().to(attendance::list_records)),
                                )
                                // /attendance/{staff_id}/records/{date}
                                .service(
                                    web::resource("/{staff_id}/records/{date}")
                                        .route(web::post().to(attendance::recompute_day)),
                                ),
                        )
                        .service(
                            web::scope("/payroll")
                                // /payroll/run
                                .service(
                                    web::resource("/run")
                                        .route(web::post().to(payroll::run_payroll)),
                                )
                                // /payroll/{staff_id}
                                .service(
                                    web::resource("/{staff_id}")
                                        .route(web::post().to(payroll::calculate_staff))
                                        .route(web::get().to(payroll::get_latest_result)),
                                )
                                // /payroll/{staff_id}/revisions
                                .service(
                                    web::resource("/{staff_id}/revisions")
                                        .route(web::get().to(payroll::list_result_revisions)),
                                ),
                        )
                        .service(
                            web::scope("/staff")
                                // /staff
                                .service(
                                    web::resource("")
                                        .route(web::post().to(staff::create_staff))
                                        .route(web::get().to(staff::list_staff)),
                                )
                                // /staff/{staff_id}
                                .service(
                                    web::resource("/{staff_id}")
                                        .route(web::get().to(staff::get_staff))
                                        .route(web::patch().to(staff::update_staff)),
                                )
                                // /staff/{staff_id}/on-duty
                                .service(
                                    web::resource("/{staff_id}/on-duty")
                                        .route(web::get().to(staff::list_on_duty))
                                        .route(web::post().to(staff::create_on_duty)),
                                )
                                // /staff/{staff_id}/on-duty/{entry_id}
                                .service(
                                    web::resource("/{staff_id}/on-duty/{entry_id}")
                                        .route(web::delete().to(staff::deactivate_on_duty)),
                                ),
                        )
                        .service(
                            web::scope("/settings")
                                .service(
                                    web::resource("/shifts")
                                        .route(web::get().to(settings::list_shifts))
                                        .route(web::put().to(settings::upsert_shift)),
                                )
                                .service(
                                    web::resource("/default-timing")
                                        .route(web::get().to(settings::get_default_timing))
                                        .route(web::put().to(settings::set_default_timing)),
                                )
                                .service(
                                    web::resource("/calendar")
                                        .route(web::get().to(settings::list_exceptions))
                                        .route(web::post().to(settings::create_exception)),
                                )
                                .service(
                                    web::resource("/calendar/{exception_id}")
                                        .route(web::get().to(settings::get_exception))
                                        .route(web::put().to(settings::update_exception))
                                        .route(web::delete().to(settings::deactivate_exception)),
                                )
                                .service(
                                    web::resource("/weekly-off")
                                        .route(web::get().to(settings::get_weekly_off))
                                        .route(web::put().to(settings::set_weekly_off)),
                                )
                                .service(
                                    web::resource("/salary-rules")
                                        .route(web::get().to(settings::get_salary_rules))
                                        .route(web::put().to(settings::update_salary_rules)),
                                ),
                        ),
                ),
        ),
    );
}
