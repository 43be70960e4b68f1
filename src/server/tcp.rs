//! # Servidor TCP Concurrente
//! src/server/tcp.rs
//!
//! Un thread acceptor (productor) y un pool fijo de workers
//! (consumidores), conectados por el [`Dispatcher`]:
//!
//! ```text
//! listen ──► acceptor ──► Dispatcher (cola acotada) ──► worker-0..N
//! ```
//!
//! Cuando hay `buffers` conexiones sin terminar de atender, el acceptor
//! se bloquea y deja de aceptar: esa es la política de admisión.

use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::error::ServerError;
use crate::router::Router;
use crate::server::worker;
use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info};

/// Pausa tras un `accept` fallido, para no girar en vacío (p. ej. EMFILE)
const ACCEPT_BACKOFF: Duration = Duration::from_millis(50);

/// Servidor enlazado pero todavía sin threads
pub struct Server {
    config: Config,
    listener: TcpListener,
    dispatcher: Arc<Dispatcher>,
    router: Arc<Router>,
}

impl Server {
    /// Valida la configuración y abre el socket de escucha
    ///
    /// Cualquier error aquí es fatal: sin socket no hay servidor.
    pub fn bind(config: Config) -> Result<Self, ServerError> {
        config.validate().map_err(ServerError::InvalidConfig)?;

        let addr = config
            .socket_addr()
            .map_err(|source| ServerError::InvalidAddress {
                addr: config.address(),
                source,
            })?;

        let listener = Self::listen(addr, config.buffers).map_err(|source| ServerError::Bind {
            addr: config.address(),
            source,
        })?;

        info!(address = %config.address(), backlog = config.buffers, "servidor escuchando");

        Ok(Self {
            dispatcher: Arc::new(Dispatcher::new(config.buffers)),
            router: Arc::new(Router::from_config(&config)),
            listener,
            config,
        })
    }

    /// Socket con SO_REUSEADDR y backlog igual a la capacidad del buffer
    fn listen(addr: SocketAddr, backlog: usize) -> io::Result<TcpListener> {
        let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
        socket.set_reuse_address(true)?;
        socket.bind(&addr.into())?;
        socket.listen(i32::try_from(backlog).unwrap_or(i32::MAX))?;
        Ok(socket.into())
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn dispatcher(&self) -> Arc<Dispatcher> {
        Arc::clone(&self.dispatcher)
    }

    /// Lanza los workers y el acceptor y retorna inmediatamente
    pub fn start(self) -> Result<ServerHandle, ServerError> {
        let local_addr = self.local_addr().map_err(|source| ServerError::Bind {
            addr: self.config.address(),
            source,
        })?;

        let mut workers = Vec::with_capacity(self.config.threads);
        for id in 0..self.config.threads {
            let dispatcher = Arc::clone(&self.dispatcher);
            let router = Arc::clone(&self.router);
            let name = format!("worker-{}", id);

            let handle = thread::Builder::new()
                .name(name.clone())
                .spawn(move || worker::run(id, &dispatcher, &router))
                .map_err(|source| ServerError::Spawn { name, source })?;
            workers.push(handle);
        }

        let dispatcher = Arc::clone(&self.dispatcher);
        let listener = self.listener;
        let acceptor = thread::Builder::new()
            .name("acceptor".to_string())
            .spawn(move || accept_loop(&listener, &dispatcher))
            .map_err(|source| ServerError::Spawn {
                name: "acceptor".to_string(),
                source,
            })?;

        info!(workers = workers.len(), "servidor en marcha");

        Ok(ServerHandle {
            local_addr,
            dispatcher: self.dispatcher,
            acceptor,
            workers,
        })
    }

    /// Arranca y bloquea para siempre
    pub fn run(self) -> Result<(), ServerError> {
        self.start()?.join();
        Ok(())
    }
}

/// Servidor en marcha
pub struct ServerHandle {
    local_addr: SocketAddr,
    dispatcher: Arc<Dispatcher>,
    acceptor: JoinHandle<()>,
    workers: Vec<JoinHandle<()>>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Espera a todos los threads (en la práctica, nunca terminan)
    pub fn join(self) {
        if let Err(e) = self.acceptor.join() {
            error!(?e, "el acceptor terminó con pánico");
        }
        for worker in self.workers {
            if let Err(e) = worker.join() {
                error!(?e, "un worker terminó con pánico");
            }
        }
    }
}

/// Loop del productor
///
/// Reserva un slot libre antes de aceptar. Si `accept` falla, el slot se
/// suelta sin llenar y su permiso vuelve a `free`.
fn accept_loop(listener: &TcpListener, dispatcher: &Dispatcher) {
    info!("acceptor listo");

    loop {
        let slot = dispatcher.reserve();

        match listener.accept() {
            Ok((stream, peer)) => {
                debug!(%peer, "nueva conexión");
                if let Err(stream) = slot.fill(stream) {
                    error!("cola llena con un slot reservado; se descarta la conexión");
                    drop(stream);
                }
            }
            Err(e) => {
                error!(error = %e, "error al aceptar conexión");
                drop(slot);
                thread::sleep(ACCEPT_BACKOFF);
            }
        }
    }
}
