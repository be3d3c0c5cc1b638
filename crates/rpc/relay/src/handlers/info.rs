use actix_web::{HttpResponse, Responder, get, web::Data};
use depot_api_types::{error::ApiError, relay::InfoResponse};
use depot_node::version::depot_node_version;

use crate::state::RelayState;

/// Called by `/info` to describe which network and vault this relay serves.
#[get("/info")]
pub async fn get_info(state: Data<RelayState>) -> Result<impl Responder, ApiError> {
    let services = &state.services;
    Ok(HttpResponse::Ok().json(InfoResponse {
        network: services.network_spec.network.to_string(),
        vault: services.network_spec.vault,
        deployment: services.network_spec.deployment.clone(),
        version: depot_node_version(),
        available_keys: services.key_manager.key_count().await,
    }))
}

#[cfg(test)]
mod tests {
    use actix_web::{
        App,
        test::{TestRequest, call_and_read_body_json, init_service},
    };
    use depot_node::mock::MockServices;
    use tempdir::TempDir;

    use super::*;

    #[actix_web::test]
    async fn test_info_reports_deployment() {
        let dir = TempDir::new("relay").unwrap();
        let services = MockServices::new(dir.path()).unwrap();
        services.generate_keys(2).await.unwrap();
        let app = init_service(
            App::new()
                .app_data(Data::new(RelayState::new(services.provider.clone())))
                .service(get_info),
        )
        .await;

        let info: InfoResponse =
            call_and_read_body_json(&app, TestRequest::get().uri("/info").to_request()).await;
        assert_eq!(info.network, "dev");
        assert_eq!(info.vault, services.provider.network_spec.vault);
        assert_eq!(info.available_keys, 2);
    }
}
