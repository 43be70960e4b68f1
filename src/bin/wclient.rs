//! # wclient
//! src/bin/wclient.rs
//!
//! Cliente mínimo: manda un GET por una conexión nueva e imprime la
//! respuesta cruda tal como llega.
//!
//! ```bash
//! wclient -s localhost -p 10401 http://localhost/index.html
//! wclient                         # pide la URL por stdin
//! ```

use clap::Parser;
use std::io::{self, BufRead, Read, Write};
use std::net::TcpStream;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "wclient")]
#[command(about = "Cliente HTTP/1.1 mínimo para wserver")]
#[command(version = "0.1.0")]
struct Args {
    /// Servidor al que conectarse
    #[arg(short, long, default_value = "localhost")]
    server: String,

    /// Puerto del servidor
    #[arg(short, long, default_value = "10401")]
    port: u16,

    /// URL a pedir (por ejemplo http://localhost/index.html)
    url: Option<String>,
}

/// Path de una URL: todo lo que sigue al host, o `/`
fn request_path(url: &str) -> &str {
    let without_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    match without_scheme.find('/') {
        Some(idx) => &without_scheme[idx..],
        None => "/",
    }
}

fn build_request(url: &str, server: &str) -> String {
    format!("GET {} HTTP/1.1\r\nHost: {}\r\n\r\n", request_path(url), server)
}

fn prompt_url() -> io::Result<String> {
    println!("Enter the URL you would like to request:");
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn fetch(args: &Args, url: &str) -> io::Result<Vec<u8>> {
    let mut stream = TcpStream::connect((args.server.as_str(), args.port))?;
    stream.write_all(build_request(url, &args.server).as_bytes())?;

    let mut response = Vec::new();
    stream.read_to_end(&mut response)?;
    Ok(response)
}

fn main() -> ExitCode {
    let args = Args::parse();

    let url = match args.url.clone() {
        Some(url) => url,
        None => match prompt_url() {
            Ok(url) => url,
            Err(e) => {
                eprintln!("wclient: no se pudo leer la URL: {}", e);
                return ExitCode::FAILURE;
            }
        },
    };

    match fetch(&args, &url) {
        Ok(response) => {
            let mut stdout = io::stdout().lock();
            if stdout.write_all(&response).and_then(|_| stdout.flush()).is_err() {
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("wclient: {}:{}: {}", args.server, args.port, e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_path() {
        assert_eq!(request_path("http://localhost/index.html"), "/index.html");
        assert_eq!(request_path("localhost:10401/fib.cgi?user=a&n=3"), "/fib.cgi?user=a&n=3");
        assert_eq!(request_path("http://localhost"), "/");
    }

    #[test]
    fn test_build_request() {
        assert_eq!(
            build_request("http://h/a.html", "h"),
            "GET /a.html HTTP/1.1\r\nHost: h\r\n\r\n"
        );
    }
}
