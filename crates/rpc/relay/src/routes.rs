use actix_web::web::ServiceConfig;

use crate::handlers::{info::get_info, validators::post_validators};

pub fn register_routers(config: &mut ServiceConfig) {
    config.service(post_validators).service(get_info);
}
