//! Consumers: sinks that receive each domain value.

use std::fmt::Debug;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};

use crate::error::CrawlError;

pub trait Consumer<T>: Send + Sync {
    fn accept(&self, value: &T) -> Result<(), CrawlError>;
}

/// Ordered fan-out to every registered consumer, on the calling thread.
///
/// A consumer that returns `Err` or panics is logged and skipped; the rest
/// still receive the value.
pub struct ConsumerSet<T> {
    consumers: Vec<Arc<dyn Consumer<T>>>,
}

impl<T> Default for ConsumerSet<T> {
    fn default() -> Self {
        Self {
            consumers: Vec::new(),
        }
    }
}

impl<T> Clone for ConsumerSet<T> {
    fn clone(&self) -> Self {
        Self {
            consumers: self.consumers.clone(),
        }
    }
}

impl<T> ConsumerSet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, consumer: Arc<dyn Consumer<T>>) {
        self.consumers.push(consumer);
    }

    pub fn len(&self) -> usize {
        self.consumers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.consumers.is_empty()
    }

    /// Hand `value` to each consumer in registration order. Returns the number of consumers that failed.
    pub fn deliver(&self, value: T) -> usize {
        let mut failed = 0;
        for (index, consumer) in self.consumers.iter().enumerate() {
            match catch_unwind(AssertUnwindSafe(|| consumer.accept(&value))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    failed += 1;
                    tracing::warn!(consumer = index, error = %e, "consumer failed");
                }
                Err(_) => {
                    failed += 1;
                    tracing::error!(consumer = index, "consumer panicked");
                }
            }
        }
        failed
    }
}

/// Consumer built from a closure; see [`consumer_fn`].
pub struct ConsumerFn<F>(F);

pub fn consumer_fn<T, F>(f: F) -> ConsumerFn<F>
where
    F: Fn(&T) -> Result<(), CrawlError> + Send + Sync,
{
    ConsumerFn(f)
}

impl<T, F> Consumer<T> for ConsumerFn<F>
where
    F: Fn(&T) -> Result<(), CrawlError> + Send + Sync,
{
    fn accept(&self, value: &T) -> Result<(), CrawlError> {
        (self.0)(value)
    }
}

/// Logs every value at info level with its `Debug` form.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogConsumer;

impl<T: Debug> Consumer<T> for LogConsumer {
    fn accept(&self, value: &T) -> Result<(), CrawlError> {
        tracing::info!(value = ?value, "consumed");
        Ok(())
    }
}

/// Forwards a clone of every value into a channel.
pub struct ChannelConsumer<T> {
    tx: Mutex<Sender<T>>,
}

impl<T> ChannelConsumer<T> {
    pub fn new(tx: Sender<T>) -> Self {
        Self { tx: Mutex::new(tx) }
    }
}

impl<T: Clone + Send> Consumer<T> for ChannelConsumer<T> {
    fn accept(&self, value: &T) -> Result<(), CrawlError> {
        self.tx
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .send(value.clone())
            .map_err(|_| CrawlError::Consumer("channel receiver dropped".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;

    #[test]
    fn failing_consumer_does_not_block_the_next() {
        let received = Arc::new(AtomicUsize::new(0));
        let r = Arc::clone(&received);
        let mut set: ConsumerSet<u32> = ConsumerSet::new();
        set.push(Arc::new(consumer_fn(|_: &u32| {
            Err(CrawlError::Consumer("disk full".into()))
        })));
        set.push(Arc::new(consumer_fn(move |v: &u32| {
            r.fetch_add(*v as usize, Ordering::SeqCst);
            Ok(())
        })));

        for v in 1..=3 {
            assert_eq!(set.deliver(v), 1);
        }
        assert_eq!(received.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn panicking_consumer_is_isolated() {
        let (tx, rx) = mpsc::channel();
        let mut set: ConsumerSet<String> = ConsumerSet::new();
        set.push(Arc::new(consumer_fn(|_: &String| -> Result<(), CrawlError> {
            panic!("boom")
        })));
        set.push(Arc::new(ChannelConsumer::new(tx)));
        assert_eq!(set.deliver("v".to_string()), 1);
        assert_eq!(rx.try_recv().unwrap(), "v");
    }

    #[test]
    fn delivery_follows_registration_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut set: ConsumerSet<()> = ConsumerSet::new();
        for i in 0..3 {
            let order = Arc::clone(&order);
            set.push(Arc::new(consumer_fn(move |_: &()| {
                order.lock().unwrap().push(i);
                Ok(())
            })));
        }
        set.deliver(());
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn channel_consumer_reports_dropped_receiver() {
        let (tx, rx) = mpsc::channel::<u8>();
        drop(rx);
        assert!(ChannelConsumer::new(tx).accept(&1).is_err());
    }
}
