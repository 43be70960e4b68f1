//! # Configuración del Servidor
//! src/config.rs
//!
//! Configuración por argumentos CLI o variables de entorno.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./wserver -p 10401 -t 4 -b 16 --root ./public
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! WSERVER_PORT=8080 WSERVER_THREADS=8 ./wserver
//! ```

use crate::cgi::QUERY_ENV_VAR;
use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use tracing::info;

/// Configuración del servidor
#[derive(Debug, Clone, Parser)]
#[command(name = "wserver")]
#[command(about = "Servidor HTTP/1.1 concurrente con buffer acotado de conexiones")]
#[command(version = "0.1.0")]
pub struct Config {
    /// Puerto en el que escucha el servidor
    #[arg(short, long, default_value = "10401", env = "WSERVER_PORT")]
    pub port: u16,

    /// Host/IP en el que escucha
    #[arg(long, default_value = "0.0.0.0", env = "WSERVER_HOST")]
    pub host: String,

    /// Número de workers (consumidores)
    #[arg(short = 't', long = "threads", default_value = "1", env = "WSERVER_THREADS")]
    pub threads: usize,

    /// Capacidad del buffer de conexiones (también el backlog de listen)
    #[arg(short = 'b', long = "buffers", default_value = "1", env = "WSERVER_BUFFERS")]
    pub buffers: usize,

    /// Directorio raíz de los archivos estáticos
    #[arg(long, default_value = ".", env = "WSERVER_ROOT")]
    pub root: PathBuf,

    /// Nombre del endpoint dinámico (sin `/` inicial)
    #[arg(long = "cgi-endpoint", default_value = "fib.cgi", env = "WSERVER_CGI_ENDPOINT")]
    pub cgi_endpoint: String,

    /// Programa que se ejecuta para el endpoint dinámico
    #[arg(long = "cgi-program", default_value = "./fib.cgi", env = "WSERVER_CGI_PROGRAM")]
    pub cgi_program: PathBuf,

    /// Variable de entorno con la query que recibe el programa
    #[arg(long = "cgi-env-var", default_value = QUERY_ENV_VAR, env = "WSERVER_CGI_ENV_VAR")]
    pub cgi_env_var: String,
}

impl Config {
    /// Crea una nueva configuración parseando argumentos CLI
    pub fn new() -> Self {
        Config::parse()
    }

    /// Dirección completa para bind (host:port)
    ///
    /// # Ejemplo
    /// ```rust
    /// use wserver::config::Config;
    ///
    /// let config = Config::default();
    /// assert_eq!(config.address(), "0.0.0.0:10401");
    /// ```
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Dirección de bind ya parseada
    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        let ip: IpAddr = self.host.parse()?;
        Ok(SocketAddr::new(ip, self.port))
    }

    /// Valida la configuración
    ///
    /// El puerto ya está acotado a 65535 por su tipo.
    pub fn validate(&self) -> Result<(), String> {
        if self.threads == 0 {
            return Err("Worker threads must be >= 1".to_string());
        }

        if self.buffers == 0 {
            return Err("Buffer capacity must be >= 1".to_string());
        }

        if i32::try_from(self.buffers).is_err() {
            return Err("Buffer capacity must fit the listen backlog".to_string());
        }

        if self.host.parse::<IpAddr>().is_err() {
            return Err(format!("Host must be an IP address: {}", self.host));
        }

        if self.cgi_endpoint.is_empty() || self.cgi_endpoint.contains('/') {
            return Err("CGI endpoint must be a non-empty name without '/'".to_string());
        }

        if self.cgi_env_var.is_empty() || self.cgi_env_var.contains('=') || self.cgi_env_var.contains('\0') {
            return Err("CGI env var must be a non-empty name without '='".to_string());
        }

        Ok(())
    }

    /// Registra un resumen de la configuración
    pub fn print_summary(&self) {
        info!(
            address = %self.address(),
            threads = self.threads,
            buffers = self.buffers,
            root = %self.root.display(),
            "configuración del servidor"
        );
        info!(
            endpoint = %self.cgi_endpoint,
            program = %self.cgi_program.display(),
            env_var = %self.cgi_env_var,
            "endpoint dinámico"
        );
    }
}

impl Default for Config {
    /// Configuración por defecto
    fn default() -> Self {
        Self {
            port: 10401,
            host: "0.0.0.0".to_string(),
            threads: 1,
            buffers: 1,
            root: PathBuf::from("."),
            cgi_endpoint: "fib.cgi".to_string(),
            cgi_program: PathBuf::from("./fib.cgi"),
            cgi_env_var: QUERY_ENV_VAR.to_string(),
        }
    }
}
