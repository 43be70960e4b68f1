//! # Códigos de Estado HTTP
//! src/http/status.rs
//!
//! Códigos de estado que produce el servidor. Además de los estándar,
//! el servidor usa **502** con la frase propia `Not Supported` para
//! rechazar versiones de protocolo distintas de HTTP/1.1.
//!
//! - **2xx**: Éxito (200 OK)
//! - **4xx**: Error del cliente (400, 403, 404)
//! - **5xx**: Error del servidor (500, 501, 502)

/// Representa los códigos de estado HTTP que soporta nuestro servidor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    /// 200 OK - La petición fue exitosa
    Ok = 200,

    /// 400 Bad Request - Request line malformada o incompleta
    BadRequest = 400,

    /// 403 Forbidden - Path con `..` o archivo sin permisos de lectura
    Forbidden = 403,

    /// 404 Not Found - El archivo o el programa CGI no existe
    NotFound = 404,

    /// 500 Internal Server Error - Fallo al lanzar el proceso CGI
    InternalServerError = 500,

    /// 501 Not Implemented - Método distinto de GET
    NotImplemented = 501,

    /// 502 Not Supported - Versión distinta de HTTP/1.1 (código no estándar)
    VersionNotSupported = 502,
}

impl StatusCode {
    /// Convierte el código a su valor numérico
    ///
    /// # Ejemplo
    /// ```
    /// use wserver::http::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// ```
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }

    /// Retorna el texto de razón (reason phrase) asociado al código
    ///
    /// # Ejemplo
    /// ```
    /// use wserver::http::StatusCode;
    /// assert_eq!(StatusCode::NotFound.reason_phrase(), "Not Found");
    /// assert_eq!(StatusCode::VersionNotSupported.reason_phrase(), "Not Supported");
    /// ```
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::Forbidden => "Forbidden",
            StatusCode::NotFound => "Not Found",
            StatusCode::InternalServerError => "Internal Server Error",
            StatusCode::NotImplemented => "Not Implemented",
            StatusCode::VersionNotSupported => "Not Supported",
        }
    }

    /// Verifica si el código indica éxito (2xx)
    pub fn is_success(&self) -> bool {
        matches!(self, StatusCode::Ok)
    }

    /// Verifica si el código indica error del cliente (4xx)
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.as_u16())
    }

    /// Verifica si el código indica error del servidor (5xx)
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.as_u16())
    }
}

impl std::fmt::Display for StatusCode {
    /// Formato: "200 OK"
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.reason_phrase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_values() {
        assert_eq!(StatusCode::Ok.as_u16(), 200);
        assert_eq!(StatusCode::Forbidden.as_u16(), 403);
        assert_eq!(StatusCode::NotFound.as_u16(), 404);
        assert_eq!(StatusCode::NotImplemented.as_u16(), 501);
        assert_eq!(StatusCode::VersionNotSupported.as_u16(), 502);
    }

    #[test]
    fn test_reason_phrases() {
        assert_eq!(StatusCode::Ok.reason_phrase(), "OK");
        assert_eq!(StatusCode::Forbidden.reason_phrase(), "Forbidden");
        assert_eq!(StatusCode::NotImplemented.reason_phrase(), "Not Implemented");
        assert_eq!(StatusCode::VersionNotSupported.reason_phrase(), "Not Supported");
    }

    #[test]
    fn test_classification() {
        assert!(StatusCode::Ok.is_success());
        assert!(StatusCode::Forbidden.is_client_error());
        assert!(!StatusCode::Forbidden.is_server_error());
        assert!(StatusCode::VersionNotSupported.is_server_error());
        assert!(!StatusCode::NotImplemented.is_client_error());
    }

    #[test]
    fn test_display() {
        assert_eq!(StatusCode::Ok.to_string(), "200 OK");
        assert_eq!(StatusCode::NotFound.to_string(), "404 Not Found");
        assert_eq!(StatusCode::VersionNotSupported.to_string(), "502 Not Supported");
    }
}
