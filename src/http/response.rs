//! # Construcción de Respuestas HTTP
//! src/http/response.rs
//!
//! API para construir respuestas HTTP/1.1 y convertirlas a bytes.
//! Toda respuesta del servidor (éxito o error) lleva los mismos headers:
//!
//! ```text
//! HTTP/1.1 200 OK\r\n
//! Connection: close\r\n
//! Content-Length: 13\r\n
//! Content-Type: text/html\r\n
//! Server: wserver/1.0\r\n
//! \r\n
//! <body>
//! ```

use super::StatusCode;
use crate::error::HttpError;

/// Token de identificación del servidor
pub const SERVER_TOKEN: &str = "wserver/1.0";

/// Único Content-Type que sirve el servidor
pub const CONTENT_TYPE: &str = "text/html";

/// Representa una respuesta HTTP/1.1 completa
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,

    /// Headers en el orden en que se escriben
    headers: Vec<(String, String)>,

    body: Vec<u8>,
}

impl Response {
    /// Crea una respuesta sin headers ni body
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Agrega un header; si ya existe, se sobrescribe en su posición
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.add_header(name, value);
        self
    }

    /// Versión mutable de [`Response::with_header`]
    pub fn add_header(&mut self, name: &str, value: &str) {
        match self
            .headers
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
        {
            Some((_, existing)) => *existing = value.to_string(),
            None => self.headers.push((name.to_string(), value.to_string())),
        }
    }

    /// Establece el body y los headers estándar con su longitud exacta
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        let len = self.body.len();
        self.with_standard_headers(len)
    }

    /// Headers comunes a todas las respuestas del servidor
    ///
    /// `content_length` se pasa aparte porque en archivos estáticos el
    /// body no vive dentro de la respuesta (se escribe desde el mmap).
    pub fn with_standard_headers(self, content_length: usize) -> Self {
        self.with_header("Connection", "close")
            .with_header("Content-Length", &content_length.to_string())
            .with_header("Content-Type", CONTENT_TYPE)
            .with_header("Server", SERVER_TOKEN)
    }

    /// Cabecera de un 200 OK para un archivo de `len` bytes
    ///
    /// # Ejemplo
    /// ```
    /// use wserver::http::Response;
    ///
    /// let head = Response::file_head(42).head_bytes();
    /// let text = String::from_utf8(head).unwrap();
    /// assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
    /// assert!(text.contains("Content-Length: 42\r\n"));
    /// ```
    pub fn file_head(len: usize) -> Self {
        Self::new(StatusCode::Ok).with_standard_headers(len)
    }

    /// Respuesta de error con un documento HTML mínimo
    ///
    /// El body incluye código, frase de razón, mensaje largo y causa.
    pub fn error(err: &HttpError) -> Self {
        let status = err.status();
        let body = format!(
            "<!doctype html>\r\n\
             <html>\r\n\
             <head>\r\n\
             \x20 <title>WebServer Error</title>\r\n\
             </head>\r\n\
             <body>\r\n\
             \x20 <h2>{}: {}</h2>\r\n\
             \x20 <p>{}: {}</p>\r\n\
             </body>\r\n\
             </html>\r\n",
            status.as_u16(),
            status.reason_phrase(),
            err.kind.message(),
            err.cause
        );

        Self::new(status).with_body(body)
    }

    /// Status line + headers + línea vacía
    pub fn head_bytes(&self) -> Vec<u8> {
        let mut result = format!("HTTP/1.1 {}\r\n", self.status).into_bytes();

        for (name, value) in &self.headers {
            result.extend_from_slice(format!("{}: {}\r\n", name, value).as_bytes());
        }

        result.extend_from_slice(b"\r\n");
        result
    }

    /// Respuesta completa lista para escribir en el socket
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut result = self.head_bytes();
        result.extend_from_slice(&self.body);
        result
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Busca un header (sin distinguir mayúsculas)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}
