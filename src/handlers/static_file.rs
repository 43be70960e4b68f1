//! # Respuesta Estática
//! src/handlers/static_file.rs
//!
//! Sirve un archivo del directorio raíz: se mapea a memoria con `mmap`
//! y se escribe cabecera + contenido de una sola vez bajo el lock de
//! salida.

use crate::dispatch::Dispatcher;
use crate::error::HttpError;
use crate::http::Response;
use std::fs::{self, File};
use std::io::{self, Write};
use std::net::TcpStream;
use std::os::unix::io::AsRawFd;
use std::path::Path;
use std::ptr::{self, NonNull};
use tracing::debug;

/// Región de solo lectura mapeada desde un archivo; se desmapea al soltarse
#[derive(Debug)]
pub struct Mapping {
    ptr: NonNull<u8>,
    len: usize,
}

// El mapeo es PROT_READ y nadie escribe a través del puntero.
unsafe impl Send for Mapping {}
unsafe impl Sync for Mapping {}

impl Mapping {
    /// Mapea los primeros `len` bytes de `file` (`len` > 0)
    pub fn map(file: &File, len: usize) -> io::Result<Self> {
        if len == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "no se puede mapear un archivo vacío",
            ));
        }

        // SAFETY: fd válido durante la llamada; el resultado se verifica
        // contra MAP_FAILED antes de usarse.
        let addr = unsafe {
            libc::mmap(
                ptr::null_mut(),
                len,
                libc::PROT_READ,
                libc::MAP_PRIVATE,
                file.as_raw_fd(),
                0,
            )
        };

        if addr == libc::MAP_FAILED {
            return Err(io::Error::last_os_error());
        }

        let ptr = NonNull::new(addr.cast::<u8>())
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "mmap devolvió NULL"))?;

        Ok(Self { ptr, len })
    }

    pub fn as_slice(&self) -> &[u8] {
        // SAFETY: `ptr` apunta a `len` bytes mapeados que viven hasta Drop.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }
}

impl Drop for Mapping {
    fn drop(&mut self) {
        // SAFETY: región obtenida de mmap con este mismo tamaño.
        unsafe {
            libc::munmap(self.ptr.as_ptr().cast(), self.len);
        }
    }
}

/// Archivo listo para enviarse
#[derive(Debug)]
pub struct StaticFile {
    /// `None` para archivos vacíos
    mapping: Option<Mapping>,
    len: usize,
}

impl StaticFile {
    /// Verifica existencia y permisos, y mapea el archivo
    ///
    /// - no existe → 404
    /// - sin permiso de lectura, o no es un archivo regular → 403
    pub fn open(path: &Path) -> Result<Self, HttpError> {
        let metadata = fs::metadata(path).map_err(|e| HttpError::from_io(&e))?;
        if !metadata.is_file() {
            return Err(HttpError::forbidden());
        }

        let file = File::open(path).map_err(|e| HttpError::from_io(&e))?;

        // El tamaño se toma del descriptor abierto, no del path
        let len = file
            .metadata()
            .map_err(|e| HttpError::from_io(&e))?
            .len();
        let len = usize::try_from(len)
            .map_err(|_| HttpError::internal("File too large to map"))?;

        let mapping = if len == 0 {
            None
        } else {
            Some(Mapping::map(&file, len).map_err(|e| HttpError::internal(e.to_string()))?)
        };

        debug!(path = %path.display(), len, "archivo mapeado");
        Ok(Self { mapping, len })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn contents(&self) -> &[u8] {
        self.mapping.as_ref().map(Mapping::as_slice).unwrap_or(&[])
    }

    /// Escribe `200 OK` + contenido y cierra la conexión
    pub fn serve(self, dispatcher: &Dispatcher, mut stream: TcpStream) -> io::Result<()> {
        let head = Response::file_head(self.len).head_bytes();

        {
            let _output = dispatcher.lock_output();
            stream.write_all(&head)?;
            stream.write_all(self.contents())?;
            stream.flush()?;
        }

        drop(stream);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::os::unix::fs::PermissionsExt;

    #[test]
    fn test_open_maps_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.html");
        fs::write(&path, b"<h1>hola</h1>").unwrap();

        let file = StaticFile::open(&path).unwrap();
        assert_eq!(file.len(), 13);
        assert_eq!(file.contents(), b"<h1>hola</h1>");
    }

    #[test]
    fn test_open_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.html");
        fs::write(&path, b"").unwrap();

        let file = StaticFile::open(&path).unwrap();
        assert!(file.is_empty());
        assert!(file.contents().is_empty());
    }

    #[test]
    fn test_open_missing_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let err = StaticFile::open(&dir.path().join("nope.html")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[test]
    fn test_open_directory_is_403() {
        let dir = tempfile::tempdir().unwrap();
        let err = StaticFile::open(dir.path()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Forbidden);
    }

    #[test]
    fn test_open_unreadable_is_403() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secret.html");
        fs::write(&path, b"secret").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o000)).unwrap();

        // root ignora los bits de permiso
        if File::open(&path).is_ok() {
            return;
        }

        let err = StaticFile::open(&path).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Forbidden);
    }

    #[test]
    fn test_mapping_rejects_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty");
        fs::write(&path, b"").unwrap();
        let file = File::open(&path).unwrap();
        assert!(Mapping::map(&file, 0).is_err());
    }
}
