//! # Lectura y Parsing de Requests HTTP/1.1
//! src/http/request.rs
//!
//! El servidor solo interpreta la request line; los headers se leen
//! (hasta la línea en blanco) pero se descartan.
//!
//! ```text
//! GET /fib.cgi?user=alice&n=5 HTTP/1.1\r\n
//! Host: localhost:10401\r\n
//! \r\n
//! ```
//!
//! ## Etapas
//!
//! 1. [`RequestReader`]: acumula bytes del socket en un buffer propio
//!    hasta ver `\r\n\r\n`.
//! 2. [`RequestLine::parse`]: separa método, target y versión.
//! 3. [`RequestLine::validate`]: compuertas secuenciales
//!    (GET → 501, HTTP/1.1 → 502, `..` → 403).

use crate::error::HttpError;
use std::io::{self, Read};
use thiserror::Error;

/// Tamaño de cada lectura del socket
pub const CHUNK_SIZE: usize = 1024;

/// Máximo de bytes aceptados antes de la línea en blanco
pub const MAX_HEAD_SIZE: usize = 8192;

/// Marca el fin de los headers
pub const HEAD_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Errores al leer la cabecera de un request desde el socket
#[derive(Debug, Error)]
pub enum ReadError {
    /// El peer cerró la conexión antes de mandar la línea en blanco
    #[error("request incompleto: el peer cerró tras {received} bytes")]
    Incomplete { received: usize },

    /// La cabecera superó el límite sin terminar
    #[error("cabecera demasiado grande (límite {limit} bytes)")]
    TooLarge { limit: usize },

    /// Error del socket; no se reintenta
    #[error("error de lectura: {0}")]
    Io(#[from] io::Error),
}

impl ReadError {
    /// Error HTTP a devolver al cliente, si todavía tiene sentido responder
    ///
    /// Una conexión que se cierra sin mandar nada no recibe respuesta.
    pub fn to_http_error(&self) -> Option<HttpError> {
        match self {
            ReadError::Incomplete { received: 0 } => None,
            ReadError::Incomplete { .. } => Some(HttpError::bad_request("Incomplete HTTP request")),
            ReadError::TooLarge { limit } => Some(HttpError::bad_request(format!(
                "HTTP request header larger than {} bytes",
                limit
            ))),
            ReadError::Io(_) => None,
        }
    }
}

/// Lector incremental de la cabecera de un request
///
/// Mantiene un buffer propio y un cursor `scanned` con la cantidad de
/// bytes ya revisados, de modo que cada chunk nuevo solo se examina una
/// vez (más los 3 bytes previos, por si el terminador queda partido entre
/// dos lecturas).
#[derive(Debug)]
pub struct RequestReader {
    buf: Vec<u8>,
    scanned: usize,
    limit: usize,
}

impl RequestReader {
    pub fn new() -> Self {
        Self::with_limit(MAX_HEAD_SIZE)
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            buf: Vec::with_capacity(CHUNK_SIZE),
            scanned: 0,
            limit,
        }
    }

    /// Agrega bytes al buffer
    ///
    /// Retorna `Some(end)` con la posición justo después de `\r\n\r\n`
    /// si el terminador ya está en el buffer.
    pub fn push(&mut self, bytes: &[u8]) -> Option<usize> {
        self.buf.extend_from_slice(bytes);

        let start = self.scanned.saturating_sub(HEAD_TERMINATOR.len() - 1);
        match self.buf[start..]
            .windows(HEAD_TERMINATOR.len())
            .position(|window| window == HEAD_TERMINATOR)
        {
            Some(pos) => Some(start + pos + HEAD_TERMINATOR.len()),
            None => {
                self.scanned = self.buf.len();
                None
            }
        }
    }

    /// Bytes acumulados hasta ahora
    pub fn buffered(&self) -> &[u8] {
        &self.buf
    }

    /// Lee del stream hasta encontrar la línea en blanco
    ///
    /// Retorna la cabecera completa (incluyendo `\r\n\r\n`). Cualquier
    /// byte posterior se descarta: el servidor no acepta body.
    pub fn read_from<R: Read>(mut self, reader: &mut R) -> Result<Vec<u8>, ReadError> {
        let mut chunk = [0u8; CHUNK_SIZE];

        loop {
            let bytes_read = reader.read(&mut chunk)?;
            if bytes_read == 0 {
                return Err(ReadError::Incomplete {
                    received: self.buf.len(),
                });
            }

            if let Some(end) = self.push(&chunk[..bytes_read]) {
                self.buf.truncate(end);
                return Ok(self.buf);
            }

            if self.buf.len() > self.limit {
                return Err(ReadError::TooLarge { limit: self.limit });
            }
        }
    }
}

impl Default for RequestReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Atajo: lee una cabecera completa con el límite por defecto
pub fn read_request_head<R: Read>(reader: &mut R) -> Result<Vec<u8>, ReadError> {
    RequestReader::new().read_from(reader)
}

/// Cursor sobre los bytes de la cabecera
struct Tokenizer<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Tokenizer<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    /// Token hasta el siguiente `delim` (que se consume)
    fn next_until(&mut self, delim: &[u8]) -> Option<&'a [u8]> {
        let rest = &self.bytes[self.pos..];
        let end = rest.windows(delim.len()).position(|w| w == delim)?;
        self.pos += end + delim.len();
        Some(&rest[..end])
    }

    fn rest(&self) -> &'a [u8] {
        &self.bytes[self.pos..]
    }
}

/// Request line tal cual llegó: `METHOD TARGET VERSION`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    method: String,
    target: String,
    version: String,
}

impl RequestLine {
    /// Separa la request line en sus tres tokens
    ///
    /// - método: hasta el primer espacio
    /// - target: hasta el siguiente espacio (puede incluir `?query`)
    /// - versión: hasta el fin de línea
    ///
    /// # Ejemplo
    /// ```
    /// use wserver::http::RequestLine;
    ///
    /// let line = RequestLine::parse(b"GET /index.html HTTP/1.1\r\n\r\n").unwrap();
    /// assert_eq!(line.method(), "GET");
    /// assert_eq!(line.target(), "/index.html");
    /// assert_eq!(line.version(), "HTTP/1.1");
    /// ```
    pub fn parse(head: &[u8]) -> Result<Self, HttpError> {
        let mut tokens = Tokenizer::new(Self::first_line(head)?);

        let method = Self::token(tokens.next_until(b" "), "method")?;
        let target = Self::token(tokens.next_until(b" "), "request target")?;
        let version = Self::token(Some(tokens.rest()), "protocol version")?;

        Ok(Self {
            method,
            target,
            version,
        })
    }

    fn first_line(head: &[u8]) -> Result<&[u8], HttpError> {
        Tokenizer::new(head)
            .next_until(b"\r\n")
            .ok_or_else(|| HttpError::bad_request("Missing request line terminator"))
    }

    /// Compuerta del método sobre la línea cruda
    ///
    /// Solo necesita el primer token: un método distinto de `GET` da 501
    /// aunque falten el target o la versión.
    pub fn check_method(head: &[u8]) -> Result<(), HttpError> {
        let line = Self::first_line(head)?;
        let method = line.split(|b| *b == b' ').next().unwrap_or_default();

        if method.is_empty() {
            return Err(HttpError::bad_request("Missing method in request line"));
        }
        if method != b"GET" {
            return Err(HttpError::method_not_implemented());
        }
        Ok(())
    }

    fn token(raw: Option<&[u8]>, what: &str) -> Result<String, HttpError> {
        let raw = raw
            .filter(|t| !t.is_empty())
            .ok_or_else(|| HttpError::bad_request(format!("Missing {} in request line", what)))?;

        String::from_utf8(raw.to_vec())
            .map_err(|_| HttpError::bad_request(format!("Invalid {} in request line", what)))
    }

    /// Aplica las compuertas en orden; la primera que falla corta el resto
    ///
    /// 1. método `GET` (si no, 501)
    /// 2. versión `HTTP/1.1` (si no, 502)
    /// 3. sin `..` tras quitar un `/` inicial (si no, 403)
    pub fn validate(self) -> Result<ParsedRequest, HttpError> {
        if self.method != "GET" {
            return Err(HttpError::method_not_implemented());
        }

        if self.version != "HTTP/1.1" {
            return Err(HttpError::version_not_supported());
        }

        let stripped = self.target.strip_prefix('/').unwrap_or(&self.target);
        if stripped.contains("..") {
            return Err(HttpError::forbidden());
        }

        let (path, query) = match stripped.split_once('?') {
            Some((path, query)) => (path.to_string(), Some(query.to_string())),
            None => (stripped.to_string(), None),
        };

        Ok(ParsedRequest {
            target: self.target,
            path,
            query,
        })
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}

/// Request que pasó todas las compuertas
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRequest {
    target: String,
    path: String,
    query: Option<String>,
}

impl ParsedRequest {
    /// Parsea y valida una cabecera completa
    pub fn from_head(head: &[u8]) -> Result<Self, HttpError> {
        RequestLine::check_method(head)?;
        RequestLine::parse(head)?.validate()
    }

    /// Target original, con `/` y query
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Path sin el `/` inicial y sin query
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Todo lo que sigue al primer `?`, sin decodificar
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }
}
