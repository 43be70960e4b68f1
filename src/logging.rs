//! # Logging
//! src/logging.rs
//!
//! Inicializa el subscriber de `tracing`. El nivel se controla con
//! `RUST_LOG`:
//!
//! ```bash
//! RUST_LOG=debug ./wserver        # tráfico de la cola y semáforos
//! RUST_LOG=wserver=warn ./wserver # solo errores de clientes y CGI
//! ```

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Inicializa logging con `info` por defecto
///
/// Llamar una sola vez al arrancar. Si ya había un subscriber global
/// (por ejemplo en tests), no hace nada.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_thread_names(true))
        .try_init();
}
