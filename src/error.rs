//! # Tipos de Error
//! src/error.rs
//!
//! Dos familias de errores:
//!
//! - [`HttpError`]: error de una petición concreta. Se traduce a una
//!   respuesta HTTP con [`crate::http::Response::error`] y nunca tumba el
//!   servidor.
//! - [`ServerError`]: error fatal de arranque (config inválida, bind,
//!   threads). El servidor no puede progresar y `main` termina.

use crate::http::StatusCode;
use std::io;
use thiserror::Error;

/// Categoría de un error de petición
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Request line malformada, incompleta o demasiado grande
    BadRequest,

    /// Path con `..`, archivo sin permisos o que no es un archivo regular
    Forbidden,

    /// Archivo o programa CGI inexistente
    NotFound,

    /// Método distinto de GET
    MethodNotImplemented,

    /// Versión distinta de HTTP/1.1
    VersionNotSupported,

    /// Fallo interno (por ejemplo, no se pudo crear el proceso CGI)
    Internal,
}

impl ErrorKind {
    /// Código de estado que corresponde a esta categoría
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorKind::BadRequest => StatusCode::BadRequest,
            ErrorKind::Forbidden => StatusCode::Forbidden,
            ErrorKind::NotFound => StatusCode::NotFound,
            ErrorKind::MethodNotImplemented => StatusCode::NotImplemented,
            ErrorKind::VersionNotSupported => StatusCode::VersionNotSupported,
            ErrorKind::Internal => StatusCode::InternalServerError,
        }
    }

    /// Mensaje largo, legible por humanos, que va en el body del error
    pub fn message(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "Server could not parse this request.",
            ErrorKind::Forbidden => "Server could not read this file.",
            ErrorKind::NotFound => "Server could not find this file.",
            ErrorKind::MethodNotImplemented => "Server does not implement this method.",
            ErrorKind::VersionNotSupported => "Server does not support this version.",
            ErrorKind::Internal => "Server could not complete this request.",
        }
    }
}

/// Causa usada para 403 tanto por traversal como por permisos
pub const FORBIDDEN_CAUSE: &str = "The requested file is not located on the sub-tree of the file \
    system hierarchy that's rooted at the server's base working directory, or the web server \
    does not have permissions to read the file.";

/// Causa usada para 404
pub const NOT_FOUND_CAUSE: &str = "The requested file does not exist";

/// Error de una petición: categoría + causa concreta
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}: {}", .kind.status(), .cause)]
pub struct HttpError {
    pub kind: ErrorKind,
    pub cause: String,
}

impl HttpError {
    pub fn new(kind: ErrorKind, cause: impl Into<String>) -> Self {
        Self {
            kind,
            cause: cause.into(),
        }
    }

    pub fn bad_request(cause: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, cause)
    }

    pub fn forbidden() -> Self {
        Self::new(ErrorKind::Forbidden, FORBIDDEN_CAUSE)
    }

    pub fn not_found() -> Self {
        Self::new(ErrorKind::NotFound, NOT_FOUND_CAUSE)
    }

    pub fn method_not_implemented() -> Self {
        Self::new(ErrorKind::MethodNotImplemented, "HTTP method other than GET")
    }

    pub fn version_not_supported() -> Self {
        Self::new(ErrorKind::VersionNotSupported, "HTTP version other than 1.1")
    }

    pub fn internal(cause: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, cause)
    }

    /// Traduce un error de I/O sobre un archivo a 404/403/500
    pub fn from_io(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::not_found(),
            io::ErrorKind::PermissionDenied => Self::forbidden(),
            _ => Self::internal(err.to_string()),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.kind.status()
    }
}

/// Errores fatales de arranque
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("configuración inválida: {0}")]
    InvalidConfig(String),

    #[error("dirección inválida {addr}: {source}")]
    InvalidAddress {
        addr: String,
        #[source]
        source: std::net::AddrParseError,
    },

    #[error("no se pudo escuchar en {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("no se pudo lanzar el thread {name}: {source}")]
    Spawn {
        name: String,
        #[source]
        source: io::Error,
    },
}
