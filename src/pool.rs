//! Bounded object pools with blocking checkout.
//!
//! Queries and result buffers are pre-allocated at open time and recycled
//! through these pools, keeping query execution allocation-free. Checkout
//! blocks while the pool is drained, which doubles as backpressure: at most
//! pool-size queries are in flight at once.
//!
//! Objects do not return on drop. Holders release explicitly, after
//! resetting the object to its canonical empty state.

use parking_lot::{Condvar, Mutex};

pub(crate) struct Pool<T> {
    items: Mutex<Vec<T>>,
    available: Condvar,
}

impl<T> Pool<T> {
    pub(crate) fn new<F>(count: usize, mut init: F) -> Self
    where
        F: FnMut() -> T,
    {
        let mut items = Vec::with_capacity(count);
        items.resize_with(count, &mut init);
        Self {
            items: Mutex::new(items),
            available: Condvar::new(),
        }
    }

    /// Takes an object out of the pool, blocking until one is available.
    pub(crate) fn checkout(&self) -> T {
        let mut items = self.items.lock();
        loop {
            if let Some(item) = items.pop() {
                return item;
            }
            self.available.wait(&mut items);
        }
    }

    /// Returns an object to the pool and wakes one blocked checkout.
    pub(crate) fn release(&self, item: T) {
        self.items.lock().push(item);
        self.available.notify_one();
    }

    #[cfg(test)]
    pub(crate) fn available(&self) -> usize {
        self.items.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn checkout_and_release_cycle() {
        let pool = Pool::new(2, || 0u32);
        assert_eq!(pool.available(), 2);

        let a = pool.checkout();
        let b = pool.checkout();
        assert_eq!(pool.available(), 0);

        pool.release(a);
        assert_eq!(pool.available(), 1);
        pool.release(b);
        assert_eq!(pool.available(), 2);
    }

    #[test]
    fn checkout_blocks_until_release() {
        let pool = Arc::new(Pool::new(1, || 0u32));
        let held = pool.checkout();

        let waiter = {
            let pool = Arc::clone(&pool);
            thread::spawn(move || pool.checkout())
        };

        // The waiter cannot finish until the held object comes back.
        thread::sleep(Duration::from_millis(20));
        assert!(!waiter.is_finished());

        pool.release(held);
        waiter.join().unwrap();
        assert_eq!(pool.available(), 0);
    }
}
