use std::{io::Result, net::SocketAddr, sync::Arc};

use actix_web::{
    App, HttpServer,
    dev::Server,
    error::JsonPayloadError,
    middleware::Logger,
    web::{Data, JsonConfig, ServiceConfig},
};
use depot_api_types::error::ApiError;
use tracing::info;

/// A type alias for a function that configures the actix-web ServiceConfig.
type Configurator = dyn Fn(&mut ServiceConfig) + Send + Sync;

/// Request bodies above this are rejected before deserialization.
pub const MAX_JSON_PAYLOAD: usize = 64 * 1024;

/// A builder for configuring and starting the relay HTTP server.
pub struct RpcServerBuilder {
    http_socket_address: SocketAddr,
    workers: Option<usize>,
    configurators: Vec<Arc<Configurator>>,
}

impl RpcServerBuilder {
    pub fn new(http_socket_address: SocketAddr) -> Self {
        Self {
            http_socket_address,
            workers: None,
            configurators: Vec::new(),
        }
    }

    /// Number of actix workers. Defaults to one per core.
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    /// Configure actix-web App by providing a closure that takes a mutable ref ServiceConfig.
    pub fn configure<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut ServiceConfig) + Send + Sync + 'static,
    {
        self.configurators.push(Arc::new(f));
        self
    }

    /// Add app data to the ServiceConfig.
    pub fn with_data<T>(mut self, value: T) -> Self
    where
        T: Send + Sync + 'static,
    {
        let value = Data::new(value);
        self.configurators
            .push(Arc::new(move |config: &mut ServiceConfig| {
                config.app_data(value.clone());
            }));
        self
    }

    /// Binds the socket and returns the server without running it. The caller owns
    /// shutdown through the server handle.
    pub fn build(self) -> Result<Server> {
        let configurators = self.configurators.clone();
        let configure_all = move |config: &mut ServiceConfig| {
            config.app_data(json_config());
            for configurator in &configurators {
                configurator(config);
            }
        };

        info!("starting HTTP server on {:?}", self.http_socket_address);

        let mut server = HttpServer::new(move || {
            App::new()
                .wrap(Logger::default())
                .configure(configure_all.clone())
        })
        .disable_signals();
        if let Some(workers) = self.workers {
            server = server.workers(workers);
        }

        Ok(server.bind(self.http_socket_address)?.run())
    }
}

/// Malformed JSON bodies answer 400 with the same `{"error": ..}` body as every other
/// failure.
pub fn json_config() -> JsonConfig {
    JsonConfig::default()
        .limit(MAX_JSON_PAYLOAD)
        .error_handler(|err: JsonPayloadError, _| ApiError::BadRequest(err.to_string()).into())
}

#[cfg(test)]
mod tests {
    use actix_web::{
        HttpResponse,
        http::StatusCode,
        test::{TestRequest, call_service, init_service, read_body},
        web,
    };

    use super::*;

    async fn echo(body: web::Json<serde_json::Value>) -> HttpResponse {
        HttpResponse::Ok().json(body.into_inner())
    }

    #[actix_web::test]
    async fn test_malformed_json_is_a_bad_request() {
        let app = init_service(
            App::new()
                .app_data(json_config())
                .route("/", web::post().to(echo)),
        )
        .await;

        let request = TestRequest::post()
            .uri("/")
            .insert_header(("content-type", "application/json"))
            .set_payload("{not json")
            .to_request();
        let response = call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = serde_json::from_slice(&read_body(response).await).unwrap();
        assert!(body["error"].as_str().unwrap().starts_with("Bad Request"));
    }
}
