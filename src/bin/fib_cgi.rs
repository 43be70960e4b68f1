//! # fib_cgi
//! src/bin/fib_cgi.rs
//!
//! Programa CGI que lanza el servidor para el endpoint dinámico. Lee la
//! query de `QUERY_STRING` ([`cgi::QUERY_ENV_VAR`]) y escribe la
//! respuesta HTTP completa en stdout, que el servidor ya redirigió al
//! socket del cliente. Solo funciona con el `--cgi-env-var` por defecto.

use std::env;
use std::io::{self, Write};
use std::process::ExitCode;
use wserver::cgi;

fn main() -> ExitCode {
    let params = env::var(cgi::QUERY_ENV_VAR).ok();
    let response = cgi::respond(params.as_deref());

    let mut stdout = io::stdout().lock();
    if stdout
        .write_all(&response.to_bytes())
        .and_then(|_| stdout.flush())
        .is_err()
    {
        return ExitCode::FAILURE;
    }

    if response.status().is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
