//! # Módulo del Servidor HTTP
//! src/server/mod.rs
//!
//! - `tcp`: socket de escucha, acceptor y arranque del pool
//! - `worker`: loop de los consumidores y atención de cada conexión

pub mod tcp;
pub mod worker;

pub use tcp::{Server, ServerHandle};
pub use worker::{handle_connection, Served};
