use actix_web::web;

use crate::handlers::{home::home, system::health_check};

mod posts;
mod extractors;

/// `upload_limit` bounds a whole multipart payload, in bytes.
pub fn configure_routes(cfg: &mut web::ServiceConfig, upload_limit: usize) {
    cfg.service(home);
    cfg.service(health_check);

    cfg.service(
        web::scope("/v1/api")
            .configure(posts::config_routes)
    );

    extractors::config_routes(cfg, upload_limit);
}
