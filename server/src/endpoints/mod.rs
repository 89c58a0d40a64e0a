mod health;
mod host;
mod nodes;
mod pods;

use actix_web::web::{self, scope};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(scope("/nodes").configure(nodes::config))
        .service(scope("/pods").configure(pods::config))
        .service(scope("/health").configure(health::config))
        .service(scope("/host").configure(host::config));
}
