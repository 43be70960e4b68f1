//! # Respuesta de Error
//! src/handlers/error.rs

use crate::dispatch::Dispatcher;
use crate::error::HttpError;
use crate::http::Response;
use std::io::{self, Write};
use std::net::TcpStream;

/// Escribe la respuesta de error en una sola escritura bajo el lock de
/// salida y cierra la conexión
pub fn respond(dispatcher: &Dispatcher, mut stream: TcpStream, err: &HttpError) -> io::Result<()> {
    let bytes = Response::error(err).to_bytes();

    {
        let _output = dispatcher.lock_output();
        stream.write_all(&bytes)?;
        stream.flush()?;
    }

    drop(stream);
    Ok(())
}
