//! # Programa CGI de Fibonacci
//! src/cgi.rs
//!
//! Lógica del binario `fib_cgi`: lee la query que el servidor deja en
//! una variable de entorno, calcula `fib(n) mod 1_000_000_007` y arma la
//! respuesta HTTP completa (el servidor no agrega nada).
//!
//! La query acepta exactamente dos formas, sin decodificar nada:
//!
//! ```text
//! user=<U>&n=<N>
//! n=<N>&user=<U>
//! ```

use crate::error::HttpError;
use crate::http::{Response, StatusCode};
use thiserror::Error;

/// Variable de entorno de la que `fib_cgi` lee la query
///
/// Es también el valor por defecto de `--cgi-env-var`; si el servidor
/// usa otro nombre, `fib_cgi` no encuentra sus parámetros y responde 500.
pub const QUERY_ENV_VAR: &str = "QUERY_STRING";

/// Mayor `n` aceptado
pub const MAX_N: u32 = 10_000;

/// Módulo del resultado
pub const MODULUS: u64 = 1_000_000_007;

/// Query inválida; cualquiera de estos termina en un 500
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("missing query string")]
    Absent,

    #[error("expected 'user=<name>&n=<int>' or 'n=<int>&user=<name>', got '{0}'")]
    Malformed(String),

    #[error(
        "The parameter 'n' for fib.cgi is not an integer, a negative integer, \
         or a positive integer larger than 10,000."
    )]
    InvalidN(String),
}

/// Parámetros del programa ya validados
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FibQuery {
    pub user: String,
    pub n: u32,
}

impl FibQuery {
    pub fn parse(params: &str) -> Result<Self, QueryError> {
        let malformed = || QueryError::Malformed(params.to_string());

        let (user, n) = if let Some(rest) = params.strip_prefix("user=") {
            let (user, tail) = rest.split_once('&').ok_or_else(malformed)?;
            let n = tail.strip_prefix("n=").ok_or_else(malformed)?;
            (user, n)
        } else if let Some(rest) = params.strip_prefix("n=") {
            let (n, tail) = rest.split_once('&').ok_or_else(malformed)?;
            let user = tail.strip_prefix("user=").ok_or_else(malformed)?;
            (user, n)
        } else {
            return Err(malformed());
        };

        let n = n
            .parse::<u32>()
            .ok()
            .filter(|n| *n <= MAX_N)
            .ok_or_else(|| QueryError::InvalidN(n.to_string()))?;

        Ok(Self {
            user: user.to_string(),
            n,
        })
    }
}

/// n-ésimo número de Fibonacci módulo [`MODULUS`], iterativo
pub fn fib_mod(n: u32) -> u64 {
    let (mut a, mut b) = (0u64, 1u64);
    for _ in 0..n {
        let next = (a + b) % MODULUS;
        a = b;
        b = next;
    }
    a
}

/// Respuesta completa para una query (o su ausencia)
pub fn respond(params: Option<&str>) -> Response {
    match params.ok_or(QueryError::Absent).and_then(FibQuery::parse) {
        Ok(query) => {
            let body = format!(
                "{}, welcome to the CGI Program!\nThe {}th Fibonnaci number is {}.\n",
                query.user,
                query.n,
                fib_mod(query.n)
            );
            Response::new(StatusCode::Ok).with_body(body)
        }
        Err(e) => Response::error(&HttpError::internal(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_both_orders() {
        let expected = FibQuery {
            user: "alice".to_string(),
            n: 5,
        };
        assert_eq!(FibQuery::parse("user=alice&n=5").unwrap(), expected);
        assert_eq!(FibQuery::parse("n=5&user=alice").unwrap(), expected);
    }

    #[test]
    fn test_parse_keeps_raw_values() {
        // Sin decodificación: lo que venga va tal cual
        let query = FibQuery::parse("n=3&user=a%20b&c").unwrap();
        assert_eq!(query.user, "a%20b&c");
        assert_eq!(query.n, 3);
    }

    #[test]
    fn test_parse_malformed() {
        assert!(matches!(FibQuery::parse(""), Err(QueryError::Malformed(_))));
        assert!(matches!(FibQuery::parse("user=alice"), Err(QueryError::Malformed(_))));
        assert!(matches!(FibQuery::parse("name=alice&n=5"), Err(QueryError::Malformed(_))));
        assert!(matches!(FibQuery::parse("user=alice&m=5"), Err(QueryError::Malformed(_))));
    }

    #[test]
    fn test_parse_invalid_n() {
        for params in ["user=a&n=-1", "user=a&n=10001", "user=a&n=abc", "n=&user=a"] {
            assert!(
                matches!(FibQuery::parse(params), Err(QueryError::InvalidN(_))),
                "{}",
                params
            );
        }
        assert_eq!(FibQuery::parse("user=a&n=10000").unwrap().n, MAX_N);
    }

    #[test]
    fn test_fib_mod() {
        let small: Vec<u64> = (0..10).map(fib_mod).collect();
        assert_eq!(small, vec![0, 1, 1, 2, 3, 5, 8, 13, 21, 34]);
        assert_eq!(fib_mod(50), 12_586_269_025 % MODULUS);
        assert!(fib_mod(MAX_N) < MODULUS);
    }

    #[test]
    fn test_respond_ok() {
        let response = respond(Some("user=alice&n=10"));
        let body = "alice, welcome to the CGI Program!\nThe 10th Fibonnaci number is 55.\n";

        assert_eq!(response.status(), StatusCode::Ok);
        assert_eq!(response.body(), body.as_bytes());
        assert_eq!(response.header("Content-Length"), Some(body.len().to_string().as_str()));
    }

    #[test]
    fn test_respond_errors_are_500() {
        for params in [None, Some("user=alice&n=20000"), Some("garbage")] {
            let response = respond(params);
            assert_eq!(response.status(), StatusCode::InternalServerError);
            assert!(String::from_utf8_lossy(response.body()).contains("500: Internal Server Error"));
        }
    }
}
