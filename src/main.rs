//! # wserver - Entry Point
//! src/main.rs
//!
//! Parsea la configuración, inicializa logging y arranca el servidor.
//! Solo los errores de arranque terminan el proceso.

use tracing::error;
use wserver::config::Config;
use wserver::logging::init_logging;
use wserver::server::Server;

fn main() {
    init_logging();

    let config = Config::new();
    config.print_summary();

    if let Err(e) = Server::bind(config).and_then(Server::run) {
        error!(error = %e, "error fatal");
        std::process::exit(1);
    }
}
