//! # Buffer Acotado de Conexiones
//! src/dispatch/mod.rs
//!
//! El [`Dispatcher`] es el punto de encuentro entre el acceptor
//! (productor) y los workers (consumidores):
//!
//! ```text
//! Acceptor                         Worker
//!   free.acquire()                   occupied.acquire()
//!   accept()                         queue.pop()
//!   queue.push(conn)                 ... atender la conexión ...
//!   occupied.release()               close(conn)
//!                                    free.release()
//! ```
//!
//! Invariantes:
//! - la cola nunca tiene más de `capacity` conexiones
//! - `occupied + free == capacity` cuando no hay operaciones en vuelo
//! - la cola solo se toca después de haber obtenido el permiso
//!   correspondiente
//!
//! También guarda el lock de serialización de salida: toda escritura a
//! un cliente (estática, dinámica o de error) pasa por él.

pub mod queue;
pub mod semaphore;

pub use queue::DispatchQueue;
pub use semaphore::Semaphore;

use std::net::TcpStream;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Foto de los contadores de admisión
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionCounts {
    pub occupied: usize,
    pub free: usize,
    pub queued: usize,
    pub capacity: usize,
}

/// Cola + semáforos + lock de salida, compartidos vía `Arc`
#[derive(Debug)]
pub struct Dispatcher<T = TcpStream> {
    queue: DispatchQueue<T>,
    occupied: Semaphore,
    free: Semaphore,
    output: Mutex<()>,
}

impl<T> Dispatcher<T> {
    /// Crea un dispatcher con `capacity` slots (todos libres)
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: DispatchQueue::new(capacity),
            occupied: Semaphore::new(0),
            free: Semaphore::new(capacity),
            output: Mutex::new(()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }

    /// Lado productor: bloquea hasta que haya un slot libre
    ///
    /// Si el [`Slot`] se suelta sin llenarse (por ejemplo, porque falló
    /// `accept`), el permiso vuelve a `free`.
    pub fn reserve(&self) -> Slot<'_, T> {
        self.free.acquire();
        Slot {
            dispatcher: self,
            filled: false,
        }
    }

    /// Lado consumidor: bloquea hasta que haya una conexión encolada
    ///
    /// El [`Claim`] devuelto libera el slot al soltarse; debe soltarse
    /// después de cerrar la conexión.
    pub fn take(&self) -> (T, Claim<'_>) {
        loop {
            self.occupied.acquire();
            match self.queue.pop() {
                Some(item) => {
                    debug!(queued = self.queue.len(), "conexión desencolada");
                    return (item, Claim { free: &self.free });
                }
                // Un permiso de `occupied` siempre acompaña a un elemento;
                // si no está, el permiso se descarta y se espera otro.
                None => debug!("permiso occupied sin conexión en la cola"),
            }
        }
    }

    /// Toma el lock de serialización de salida
    pub fn lock_output(&self) -> MutexGuard<'_, ()> {
        self.output.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn counts(&self) -> AdmissionCounts {
        AdmissionCounts {
            occupied: self.occupied.available(),
            free: self.free.available(),
            queued: self.queue.len(),
            capacity: self.queue.capacity(),
        }
    }

    /// Máximo de conexiones que llegaron a estar encoladas a la vez
    pub fn high_water(&self) -> usize {
        self.queue.high_water()
    }
}

/// Slot libre reservado por el productor
#[must_use = "un slot sin llenar devuelve su permiso al soltarse"]
pub struct Slot<'a, T> {
    dispatcher: &'a Dispatcher<T>,
    filled: bool,
}

impl<T> Slot<'_, T> {
    /// Encola el elemento y señala `occupied`
    pub fn fill(mut self, item: T) -> Result<(), T> {
        self.dispatcher.queue.push(item)?;
        self.filled = true;
        self.dispatcher.occupied.release();
        debug!(queued = self.dispatcher.queue.len(), "conexión encolada");
        Ok(())
    }
}

impl<T> Drop for Slot<'_, T> {
    fn drop(&mut self) {
        if !self.filled {
            self.dispatcher.free.release();
        }
    }
}

/// Slot ocupado por un worker; al soltarse señala `free`
#[must_use = "soltar el claim libera el slot para el acceptor"]
pub struct Claim<'a> {
    free: &'a Semaphore,
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        self.free.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_initial_counts() {
        let dispatcher: Dispatcher<u32> = Dispatcher::new(4);
        assert_eq!(
            dispatcher.counts(),
            AdmissionCounts {
                occupied: 0,
                free: 4,
                queued: 0,
                capacity: 4
            }
        );
    }

    #[test]
    fn test_fill_and_take() {
        let dispatcher = Dispatcher::new(2);
        dispatcher.reserve().fill(7).unwrap();

        let counts = dispatcher.counts();
        assert_eq!(counts.occupied + counts.free, 2);
        assert_eq!(counts.queued, 1);

        let (item, claim) = dispatcher.take();
        assert_eq!(item, 7);
        assert_eq!(dispatcher.counts().free, 1);

        drop(claim);
        let counts = dispatcher.counts();
        assert_eq!((counts.occupied, counts.free), (0, 2));
    }

    #[test]
    fn test_unfilled_slot_returns_permit() {
        let dispatcher: Dispatcher<u32> = Dispatcher::new(1);
        {
            let _slot = dispatcher.reserve();
            assert_eq!(dispatcher.counts().free, 0);
        }
        assert_eq!(dispatcher.counts().free, 1);
        assert_eq!(dispatcher.counts().occupied, 0);
    }

    #[test]
    fn test_fifo_across_threads() {
        let dispatcher = Arc::new(Dispatcher::new(8));
        for i in 0..8 {
            dispatcher.reserve().fill(i).unwrap();
        }

        let mut seen = Vec::new();
        for _ in 0..8 {
            let (item, _claim) = dispatcher.take();
            seen.push(item);
        }
        assert_eq!(seen, (0..8).collect::<Vec<_>>());
    }

    #[test]
    fn test_producer_blocks_when_full() {
        let dispatcher = Arc::new(Dispatcher::new(1));
        dispatcher.reserve().fill(1u32).unwrap();

        let produced = Arc::new(AtomicUsize::new(0));
        let producer = {
            let dispatcher = Arc::clone(&dispatcher);
            let produced = Arc::clone(&produced);
            thread::spawn(move || {
                dispatcher.reserve().fill(2).unwrap();
                produced.fetch_add(1, Ordering::SeqCst);
            })
        };

        thread::sleep(Duration::from_millis(50));
        assert_eq!(produced.load(Ordering::SeqCst), 0);

        let (first, claim) = dispatcher.take();
        assert_eq!(first, 1);
        thread::sleep(Duration::from_millis(20));
        // El slot sigue ocupado mientras el claim vive
        assert_eq!(produced.load(Ordering::SeqCst), 0);

        drop(claim);
        producer.join().unwrap();
        assert_eq!(produced.load(Ordering::SeqCst), 1);
        assert_eq!(dispatcher.take().0, 2);
    }

    #[test]
    fn test_bounded_under_burst() {
        for capacity in [1usize, 2, 5] {
            let dispatcher = Arc::new(Dispatcher::new(capacity));

            let producers: Vec<_> = (0..4)
                .map(|p| {
                    let dispatcher = Arc::clone(&dispatcher);
                    thread::spawn(move || {
                        for i in 0..50 {
                            dispatcher.reserve().fill(p * 100 + i).unwrap();
                        }
                    })
                })
                .collect();

            let consumers: Vec<_> = (0..3)
                .map(|_| {
                    let dispatcher = Arc::clone(&dispatcher);
                    thread::spawn(move || {
                        let mut taken = 0;
                        while taken < 200 / 4 {
                            let (_item, _claim) = dispatcher.take();
                            assert!(dispatcher.counts().queued <= capacity);
                            taken += 1;
                        }
                        taken
                    })
                })
                .collect();

            // 3 consumidores x 50 = 150; drenar los 50 restantes para que
            // los productores puedan terminar
            let mut drained = 0;
            for consumer in consumers {
                drained += consumer.join().unwrap();
            }
            while drained < 200 {
                let (_item, _claim) = dispatcher.take();
                drained += 1;
            }

            for producer in producers {
                producer.join().unwrap();
            }

            assert!(dispatcher.high_water() <= capacity);
            let counts = dispatcher.counts();
            assert_eq!(counts.occupied + counts.free, capacity);
            assert_eq!(counts.queued, 0);
        }
    }

    #[test]
    fn test_output_lock_is_exclusive() {
        let dispatcher: Arc<Dispatcher<u32>> = Arc::new(Dispatcher::new(1));
        let inside = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let dispatcher = Arc::clone(&dispatcher);
                let inside = Arc::clone(&inside);
                thread::spawn(move || {
                    for _ in 0..20 {
                        let _guard = dispatcher.lock_output();
                        assert_eq!(inside.fetch_add(1, Ordering::SeqCst), 0);
                        thread::yield_now();
                        inside.fetch_sub(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
    }
}
