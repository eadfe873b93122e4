use actix_web::web;

use crate::handlers::posts;

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/posts")
            .service(
                web::resource("")
                    .route(web::get().to(posts::get_posts))
                    .route(web::post().to(posts::create_post))
            )
    );
}
