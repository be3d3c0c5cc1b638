pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

use std::{io::Result, net::SocketAddr, sync::Arc};

use actix_web::dev::Server;
use depot_node::ServiceProvider;
use depot_rpc_common::server::RpcServerBuilder;

use crate::{routes::register_routers, state::RelayState};

/// Binds the relay on `http_socket_address`. The returned server must be awaited to run.
pub fn start_relay_server(
    http_socket_address: SocketAddr,
    services: Arc<ServiceProvider>,
) -> Result<Server> {
    RpcServerBuilder::new(http_socket_address)
        .with_data(RelayState::new(services))
        .configure(register_routers)
        .build()
}
