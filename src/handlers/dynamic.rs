//! # Despacho Dinámico (CGI)
//! src/handlers/dynamic.rs
//!
//! Lanza el programa externo con la salida estándar y de error apuntando
//! al socket del cliente. El contrato con el programa es mínimo:
//!
//! - sin argumentos
//! - un único entorno: `<VAR>=<query sin decodificar>`
//! - el programa escribe una respuesta HTTP completa y termina
//!
//! El lock de salida se toma antes de crear el proceso y se suelta
//! después de `wait` y de cerrar la conexión, así que a lo sumo hay un
//! proceso CGI vivo en todo el servidor.

use crate::dispatch::Dispatcher;
use crate::error::HttpError;
use crate::http::Response;
use std::ffi::CString;
use std::fs;
use std::io::{self, Write};
use std::net::TcpStream;
use std::os::fd::OwnedFd;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use thiserror::Error;
use tracing::{debug, error, warn};

/// Fallos del despacho dinámico
#[derive(Debug, Error)]
pub enum DynamicError {
    /// No se pudo crear el proceso o reemplazar su imagen
    #[error("no se pudo lanzar {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// El proceso arrancó pero no se pudo esperar su fin
    #[error("no se pudo esperar a {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: io::Error,
    },
}

/// Programa externo que atiende el endpoint dinámico
#[derive(Debug, Clone)]
pub struct CgiProgram {
    path: PathBuf,
    env_var: String,
}

impl CgiProgram {
    /// `path` relativo sin directorio se ancla a `.` para que no se
    /// busque en `PATH`
    pub fn new(path: impl Into<PathBuf>, env_var: impl Into<String>) -> Self {
        let path = path.into();
        let bare = !path.is_absolute()
            && path
                .parent()
                .map_or(true, |parent| parent.as_os_str().is_empty());
        let path = if bare { Path::new(".").join(path) } else { path };

        Self {
            path,
            env_var: env_var.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn env_var(&self) -> &str {
        &self.env_var
    }

    /// Mismo criterio que los archivos estáticos
    ///
    /// - no existe → 404
    /// - no es archivo regular o no es ejecutable → 403
    pub fn check(&self) -> Result<(), HttpError> {
        let metadata = fs::metadata(&self.path).map_err(|e| HttpError::from_io(&e))?;
        if !metadata.is_file() {
            return Err(HttpError::forbidden());
        }

        let c_path = CString::new(self.path.as_os_str().as_bytes())
            .map_err(|_| HttpError::forbidden())?;

        // SAFETY: c_path es un C string válido durante la llamada.
        let rc = unsafe { libc::access(c_path.as_ptr(), libc::X_OK) };
        if rc != 0 {
            return Err(HttpError::forbidden());
        }

        Ok(())
    }

    /// Crea el proceso hijo con stdout/stderr duplicados del socket
    ///
    /// Todos los demás descriptores del servidor son close-on-exec, así
    /// que el hijo solo hereda estos dos (y `/dev/null` como stdin).
    fn spawn(&self, stream: &TcpStream, params: &str) -> io::Result<Child> {
        let stdout = OwnedFd::from(stream.try_clone()?);
        let stderr = OwnedFd::from(stream.try_clone()?);

        let mut command = Command::new(&self.path);
        command
            .env_clear()
            .env(&self.env_var, params)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr));

        // Al soltar `command` se cierran las copias del padre
        command.spawn()
    }

    /// Ejecuta el programa para una conexión y la cierra
    ///
    /// Si el proceso no se puede crear, se responde 404/403/500 (mejor
    /// esfuerzo) bajo el mismo lock y se abandona la conexión; el
    /// servidor sigue vivo.
    pub fn run(
        &self,
        dispatcher: &Dispatcher,
        mut stream: TcpStream,
        params: &str,
    ) -> Result<ExitStatus, DynamicError> {
        let program = self.path.display().to_string();
        let output = dispatcher.lock_output();

        let outcome = match self.spawn(&stream, params) {
            Ok(mut child) => {
                debug!(pid = child.id(), %program, "proceso CGI lanzado");
                child
                    .wait()
                    .map_err(|source| DynamicError::Wait {
                        program: program.clone(),
                        source,
                    })
            }
            Err(source) => {
                error!(%program, error = %source, "fallo al lanzar el proceso CGI");
                let response = Response::error(&HttpError::from_io(&source));
                if let Err(e) = stream.write_all(&response.to_bytes()) {
                    warn!(error = %e, "no se pudo avisar al cliente del fallo CGI");
                }
                Err(DynamicError::Spawn { program, source })
            }
        };

        drop(stream);
        drop(output);

        if let Ok(status) = &outcome {
            if !status.success() {
                warn!(%status, "el proceso CGI terminó con error");
            }
        }

        outcome
    }
}
