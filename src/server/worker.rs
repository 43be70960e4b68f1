//! # Workers (Consumidores)
//! src/server/worker.rs
//!
//! Cada worker repite:
//!
//! 1. esperar `occupied` y sacar una conexión de la cola
//! 2. leer y validar el request
//! 3. responder (estático, dinámico o error) y cerrar la conexión
//! 4. liberar el slot (`free`), recién después de cerrar

use crate::dispatch::Dispatcher;
use crate::error::HttpError;
use crate::handlers::dynamic::DynamicError;
use crate::handlers::error as error_response;
use crate::http::{read_request_head, ParsedRequest, ReadError};
use crate::router::{Route, Router};
use std::io;
use std::net::TcpStream;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, error, info, info_span, warn};

/// Fallos que abandonan una conexión (nunca el servidor)
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error(transparent)]
    Read(#[from] ReadError),

    #[error("error escribiendo la respuesta: {0}")]
    Write(#[from] io::Error),

    #[error(transparent)]
    Dynamic(#[from] DynamicError),
}

/// Cómo terminó una conexión atendida
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Served {
    /// Archivo enviado con `len` bytes de body
    Static { len: usize },

    /// Programa CGI ejecutado; `exit_code` es `None` si terminó por señal
    Dynamic { exit_code: Option<i32> },

    /// Respuesta de error con este código
    Error { status: u16 },

    /// El peer cerró sin mandar nada
    Closed,
}

/// Loop de un worker; no retorna
pub fn run(id: usize, dispatcher: &Dispatcher, router: &Router) {
    let span = info_span!("worker", id);
    let _enter = span.enter();
    info!("worker listo");

    loop {
        let (stream, claim) = dispatcher.take();
        let start = Instant::now();

        match handle_connection(dispatcher, router, stream) {
            Ok(served) => debug!(
                ?served,
                elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
                "conexión atendida"
            ),
            Err(e) => error!(error = %e, "conexión abandonada"),
        }

        // La conexión ya está cerrada: recién ahora se libera el slot
        drop(claim);
    }
}

/// Atiende una conexión completa y la cierra
pub fn handle_connection(
    dispatcher: &Dispatcher,
    router: &Router,
    mut stream: TcpStream,
) -> Result<Served, ConnectionError> {
    let peer = stream
        .peer_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    let head = match read_request_head(&mut stream) {
        Ok(head) => head,
        Err(e) => {
            return match e.to_http_error() {
                Some(err) => {
                    warn!(%peer, error = %e, "request incompleto");
                    send_error(dispatcher, stream, &err)
                }
                None if matches!(e, ReadError::Incomplete { .. }) => {
                    debug!(%peer, "conexión cerrada sin request");
                    Ok(Served::Closed)
                }
                None => Err(e.into()),
            };
        }
    };

    let request = match ParsedRequest::from_head(&head) {
        Ok(request) => request,
        Err(err) => {
            warn!(%peer, error = %err, "request rechazado");
            return send_error(dispatcher, stream, &err);
        }
    };

    info!(%peer, target = request.target(), "GET");

    match router.route(&request) {
        Ok(Route::Static(file)) => {
            let len = file.len();
            file.serve(dispatcher, stream)?;
            Ok(Served::Static { len })
        }
        Ok(Route::Dynamic { params }) => {
            let status = router.cgi().run(dispatcher, stream, &params)?;
            Ok(Served::Dynamic {
                exit_code: status.code(),
            })
        }
        Err(err) => {
            warn!(%peer, error = %err, "recurso no disponible");
            send_error(dispatcher, stream, &err)
        }
    }
}

fn send_error(dispatcher: &Dispatcher, stream: TcpStream, err: &HttpError) -> Result<Served, ConnectionError> {
    error_response::respond(dispatcher, stream, err)?;
    Ok(Served::Error {
        status: err.status().as_u16(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::dynamic::CgiProgram;
    use std::fs;
    use std::io::{Read, Write};
    use std::net::{Shutdown, TcpListener};
    use std::path::Path;
    use std::thread;

    /// Acepta una conexión, la atiende y devuelve lo que recibió el cliente
    fn exchange(root: &Path, raw: &[u8]) -> (Result<Served, ConnectionError>, String) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().unwrap();
        let router = Router::new(root, "fib.cgi", CgiProgram::new(root.join("fib.cgi"), "QUERY_STRING"));

        let server = thread::spawn(move || {
            let dispatcher = Dispatcher::new(1);
            let (stream, _) = listener.accept().unwrap();
            handle_connection(&dispatcher, &router, stream)
        });

        let mut client = TcpStream::connect(addr).unwrap();
        client.write_all(raw).unwrap();
        client.shutdown(Shutdown::Write).unwrap();

        let mut buf = Vec::new();
        client.read_to_end(&mut buf).unwrap();

        (server.join().unwrap(), String::from_utf8_lossy(&buf).into_owned())
    }

    #[test]
    fn test_static_ok() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), "<h1>ok</h1>").unwrap();

        let (served, text) = exchange(dir.path(), b"GET /index.html HTTP/1.1\r\nHost: x\r\n\r\n");

        assert_eq!(served.unwrap(), Served::Static { len: 11 });
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.contains("Content-Length: 11\r\n"));
        assert!(text.ends_with("\r\n\r\n<h1>ok</h1>"));
    }

    #[test]
    fn test_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let (served, text) = exchange(dir.path(), b"GET /nope.html HTTP/1.1\r\n\r\n");

        assert_eq!(served.unwrap(), Served::Error { status: 404 });
        assert!(text.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert!(text.contains("404: Not Found"));
    }

    #[test]
    fn test_post_is_501() {
        let dir = tempfile::tempdir().unwrap();
        let (served, text) = exchange(dir.path(), b"POST /index.html HTTP/1.1\r\n\r\n");

        assert_eq!(served.unwrap(), Served::Error { status: 501 });
        assert!(text.starts_with("HTTP/1.1 501 Not Implemented\r\n"));
    }

    #[test]
    fn test_incomplete_request_is_400() {
        let dir = tempfile::tempdir().unwrap();
        let (served, text) = exchange(dir.path(), b"GET /index.html HTTP/1.1\r\n");

        assert_eq!(served.unwrap(), Served::Error { status: 400 });
        assert!(text.starts_with("HTTP/1.1 400 Bad Request\r\n"));
    }

    #[test]
    fn test_peer_closed_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let (served, text) = exchange(dir.path(), b"");

        assert_eq!(served.unwrap(), Served::Closed);
        assert!(text.is_empty());
    }
}
