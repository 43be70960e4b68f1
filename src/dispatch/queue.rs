//! # Cola de Despacho
//! src/dispatch/queue.rs
//!
//! Cola FIFO thread-safe de capacidad fija. No bloquea: quien llama ya
//! probó con los semáforos del [`super::Dispatcher`] que hay un slot (o
//! un elemento) disponible.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Cola FIFO acotada
#[derive(Debug)]
pub struct DispatchQueue<T> {
    items: Mutex<VecDeque<T>>,
    capacity: usize,

    /// Máximo de elementos que llegó a tener la cola
    high_water: AtomicUsize,
}

impl<T> DispatchQueue<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            high_water: AtomicUsize::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<T>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Encola al final
    ///
    /// Si la cola está llena devuelve el elemento: con los semáforos bien
    /// usados esto no ocurre, pero la cola no confía en ello.
    pub fn push(&self, item: T) -> Result<(), T> {
        let mut items = self.lock();
        if items.len() >= self.capacity {
            return Err(item);
        }

        items.push_back(item);
        self.high_water.fetch_max(items.len(), Ordering::Relaxed);
        Ok(())
    }

    /// Desencola el elemento más antiguo
    pub fn pop(&self) -> Option<T> {
        self.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn high_water(&self) -> usize {
        self.high_water.load(Ordering::Relaxed)
    }
}
