//! # Handlers
//! src/handlers/mod.rs
//!
//! Las tres formas de responder a una conexión. Todas escriben bajo el
//! lock de salida del [`crate::dispatch::Dispatcher`] y cierran la
//! conexión al terminar.
//!
//! - **static_file**: archivo mapeado a memoria, `200 OK`
//! - **dynamic**: proceso CGI con la salida redirigida al socket
//! - **error**: página HTML de error (400, 403, 404, 500, 501, 502)

pub mod dynamic;
pub mod error;
pub mod static_file;
