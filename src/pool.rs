//! Bounded pool of reusable buffers
//!
//! Items are created lazily up to `capacity`; after that [`Pool::acquire`]
//! blocks until a [`Pooled`] guard is dropped. The guard owns its item
//! exclusively, and returning it to the pool is the last thing its drop does.

use crossbeam_channel::{bounded, Receiver, Sender};
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};

type Factory<T> = Box<dyn Fn() -> T + Send + Sync>;

/// Bounded free list backed by a crossbeam channel
pub struct Pool<T> {
    free_tx: Sender<T>,
    free_rx: Receiver<T>,
    created: AtomicUsize,
    capacity: usize,
    make: Factory<T>,
}

impl<T: Send> Pool<T> {
    /// Create a pool that holds at most `capacity` items (minimum 1)
    pub fn new(capacity: usize, make: impl Fn() -> T + Send + Sync + 'static) -> Self {
        let capacity = capacity.max(1);
        let (free_tx, free_rx) = bounded(capacity);

        Self {
            free_tx,
            free_rx,
            created: AtomicUsize::new(0),
            capacity,
            make: Box::new(make),
        }
    }

    /// Take an item, creating one if under capacity, otherwise waiting for a release
    pub fn acquire(&self) -> Pooled<'_, T> {
        if let Ok(item) = self.free_rx.try_recv() {
            return self.guard(item);
        }

        let mut created = self.created.load(Ordering::Relaxed);
        while created < self.capacity {
            match self.created.compare_exchange_weak(
                created,
                created + 1,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return self.guard((self.make)()),
                Err(current) => created = current,
            }
        }

        // The pool holds its own sender, so the channel never disconnects
        match self.free_rx.recv() {
            Ok(item) => self.guard(item),
            Err(_) => self.guard((self.make)()),
        }
    }

    fn guard(&self, item: T) -> Pooled<'_, T> {
        Pooled {
            item: Some(item),
            pool: self,
        }
    }

    /// Items allocated so far
    pub fn created(&self) -> usize {
        self.created.load(Ordering::Relaxed)
    }
}

/// Exclusive handle to a pooled item
pub struct Pooled<'a, T: Send> {
    item: Option<T>,
    pool: &'a Pool<T>,
}

impl<T: Send> Deref for Pooled<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // Only `Drop` takes the item
        self.item.as_ref().unwrap_or_else(|| unreachable!())
    }
}

impl<T: Send> DerefMut for Pooled<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.item.as_mut().unwrap_or_else(|| unreachable!())
    }
}

impl<T: Send> Drop for Pooled<'_, T> {
    fn drop(&mut self) {
        if let Some(item) = self.item.take() {
            // At most `capacity` items exist, so the free list has room
            let _ = self.pool.free_tx.try_send(item);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn test_reuses_released_items() {
        let pool = Pool::new(4, || Vec::<u8>::with_capacity(16));

        {
            let mut buf = pool.acquire();
            buf.extend_from_slice(b"hello");
        }

        let buf = pool.acquire();
        assert_eq!(buf.as_slice(), b"hello");
        assert_eq!(pool.created(), 1);
    }

    #[test]
    fn test_grows_to_capacity() {
        let pool = Pool::new(3, Vec::<u8>::new);

        let a = pool.acquire();
        let b = pool.acquire();
        let c = pool.acquire();
        assert_eq!(pool.created(), 3);

        drop((a, b, c));
        let _again = (pool.acquire(), pool.acquire(), pool.acquire());
        assert_eq!(pool.created(), 3);
    }

    #[test]
    fn test_acquire_blocks_at_capacity() {
        let pool = Pool::new(1, Vec::<u8>::new);
        let held = pool.acquire();
        let (tx, rx) = mpsc::channel();

        std::thread::scope(|s| {
            s.spawn(|| {
                let _second = pool.acquire();
                tx.send(()).unwrap();
            });

            assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
            drop(held);
            assert!(rx.recv_timeout(Duration::from_secs(5)).is_ok());
        });

        assert_eq!(pool.created(), 1);
    }

    #[test]
    fn test_zero_capacity_is_one() {
        let pool = Pool::new(0, || 0u32);
        {
            let mut first = pool.acquire();
            *first = 7;
        }
        assert_eq!(*pool.acquire(), 7);
        assert_eq!(pool.created(), 1);
    }
}
