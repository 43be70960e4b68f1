//! # Semáforo Contador
//! src/dispatch/semaphore.rs
//!
//! La biblioteca estándar no trae semáforos; este se arma con un
//! `Mutex<usize>` y un `Condvar`, igual que las colas bloqueantes del
//! resto del servidor.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// Semáforo contador clásico (P/V)
#[derive(Debug)]
pub struct Semaphore {
    permits: Mutex<usize>,
    condvar: Condvar,
}

impl Semaphore {
    /// Crea un semáforo con `permits` permisos iniciales
    pub fn new(permits: usize) -> Self {
        Self {
            permits: Mutex::new(permits),
            condvar: Condvar::new(),
        }
    }

    // El contador no puede quedar inconsistente a mitad de una operación,
    // así que un mutex envenenado se sigue usando.
    fn lock(&self) -> MutexGuard<'_, usize> {
        self.permits.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Toma un permiso, bloqueando mientras no haya ninguno (P / wait)
    pub fn acquire(&self) {
        let mut permits = self.lock();
        while *permits == 0 {
            permits = self
                .condvar
                .wait(permits)
                .unwrap_or_else(PoisonError::into_inner);
        }
        *permits -= 1;
    }

    /// Toma un permiso solo si hay alguno disponible
    pub fn try_acquire(&self) -> bool {
        let mut permits = self.lock();
        if *permits == 0 {
            return false;
        }
        *permits -= 1;
        true
    }

    /// Devuelve un permiso y despierta a un thread en espera (V / post)
    pub fn release(&self) {
        let mut permits = self.lock();
        *permits += 1;
        self.condvar.notify_one();
    }

    /// Permisos disponibles en este instante
    pub fn available(&self) -> usize {
        *self.lock()
    }
}
