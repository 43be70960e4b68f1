//! # Enrutamiento
//! src/router/mod.rs
//!
//! Decide qué hacer con un request ya validado:
//!
//! ```text
//! ParsedRequest → Router → Route::Dynamic (endpoint CGI)
//!                        → Route::Static  (archivo bajo la raíz)
//!                        → HttpError      (404 / 403)
//! ```

use crate::config::Config;
use crate::error::HttpError;
use crate::handlers::dynamic::CgiProgram;
use crate::handlers::static_file::StaticFile;
use crate::http::ParsedRequest;
use std::path::{Component, Path, PathBuf};

/// Destino de un request
#[derive(Debug)]
pub enum Route {
    /// Archivo abierto y mapeado, listo para enviarse
    Static(StaticFile),

    /// Endpoint dinámico con la query cruda (sin decodificar)
    Dynamic { params: String },
}

/// Router que mapea paths a archivos o al programa CGI
#[derive(Debug, Clone)]
pub struct Router {
    root: PathBuf,
    cgi_endpoint: String,
    cgi: CgiProgram,
}

impl Router {
    pub fn new(root: impl Into<PathBuf>, cgi_endpoint: impl Into<String>, cgi: CgiProgram) -> Self {
        Self {
            root: root.into(),
            cgi_endpoint: cgi_endpoint.into(),
            cgi,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.root,
            config.cgi_endpoint.clone(),
            CgiProgram::new(&config.cgi_program, config.cgi_env_var.clone()),
        )
    }

    pub fn cgi(&self) -> &CgiProgram {
        &self.cgi
    }

    /// Encuentra el destino del request
    ///
    /// El endpoint dinámico se reconoce por nombre exacto (antes del `?`).
    /// Para archivos estáticos la query se ignora.
    pub fn route(&self, request: &ParsedRequest) -> Result<Route, HttpError> {
        if request.path() == self.cgi_endpoint {
            self.cgi.check()?;
            return Ok(Route::Dynamic {
                params: request.query().unwrap_or_default().to_string(),
            });
        }

        let path = self.resolve(request.path())?;
        Ok(Route::Static(StaticFile::open(&path)?))
    }

    /// Une el path relativo a la raíz sin salir de ella
    ///
    /// Solo se aceptan componentes normales (y `.`); un path absoluto o
    /// con `..` da 403. El resultado se canonicaliza, así que un symlink
    /// que apunta fuera de la raíz también da 403; si no existe, 404.
    pub fn resolve(&self, relative: &str) -> Result<PathBuf, HttpError> {
        let joined = self.join(relative)?;

        let root = self.root.canonicalize().map_err(|e| HttpError::from_io(&e))?;
        let real = joined.canonicalize().map_err(|e| HttpError::from_io(&e))?;

        if !real.starts_with(&root) {
            return Err(HttpError::forbidden());
        }
        Ok(real)
    }

    fn join(&self, relative: &str) -> Result<PathBuf, HttpError> {
        let mut resolved = self.root.clone();

        for component in Path::new(relative).components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                Component::RootDir | Component::ParentDir | Component::Prefix(_) => {
                    return Err(HttpError::forbidden());
                }
            }
        }

        Ok(resolved)
    }
}
