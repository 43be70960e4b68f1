//! # Módulo HTTP
//! src/http/mod.rs
//!
//! Subconjunto mínimo de HTTP/1.1 implementado a mano:
//!
//! - Lectura incremental de la cabecera hasta `\r\n\r\n`
//! - Parsing y validación de la request line
//! - Construcción de responses (éxito y error)
//!
//! Sin keep-alive, sin chunked, sin body: una respuesta por conexión y
//! la conexión se cierra.

pub mod request;
pub mod response;
pub mod status;

pub use request::{read_request_head, ParsedRequest, ReadError, RequestLine, RequestReader};
pub use response::Response;
pub use status::StatusCode;
