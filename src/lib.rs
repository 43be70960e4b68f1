//! # wserver
//! src/lib.rs
//!
//! Servidor HTTP/1.1 concurrente con un buffer acotado de conexiones
//! entre un thread acceptor y un pool fijo de workers.
//!
//! ## Arquitectura
//!
//! - `http`: lectura incremental del request, validación y respuestas
//! - `dispatch`: buffer acotado (cola + dos semáforos) y lock de salida
//! - `server`: socket de escucha, acceptor y workers
//! - `router`: decide entre archivo estático, programa CGI o error
//! - `handlers`: escritura de cada tipo de respuesta
//! - `cgi`: lógica del programa CGI de ejemplo (`fib_cgi`)
//! - `config` / `logging` / `error`: infraestructura
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use wserver::config::Config;
//! use wserver::server::Server;
//!
//! let config = Config::default();
//! Server::bind(config)?.run()?;
//! # Ok::<(), wserver::error::ServerError>(())
//! ```

pub mod cgi;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod http;
pub mod logging;
pub mod router;
pub mod server;
