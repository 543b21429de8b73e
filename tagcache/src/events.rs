//! Cache notifications.
//!
//! The coordinator and middleware report hits, misses and flushes to a
//! [`CacheObserver`]. Delivery is synchronous and fire-and-forget.

use std::fmt;
use std::sync::Arc;

use http::{Method, Uri};
use tagcache_core::Tag;
use tracing::debug;

use crate::http::RequestHead;

/// Something that happened in the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    /// A request was answered from cache.
    Hit {
        /// Request method.
        method: Method,
        /// Request URI.
        uri: Uri,
    },
    /// A request had no cached response and went upstream.
    Miss {
        /// Request method.
        method: Method,
        /// Request URI.
        uri: Uri,
    },
    /// A tag group, or the whole cache when `tags` is `None`, was flushed.
    Flush {
        /// The flushed tags.
        tags: Option<Vec<Tag>>,
    },
}

impl CacheEvent {
    /// Hit event for a request.
    pub fn hit(request: &RequestHead<'_>) -> Self {
        Self::Hit {
            method: request.method().clone(),
            uri: request.uri().clone(),
        }
    }

    /// Miss event for a request.
    pub fn miss(request: &RequestHead<'_>) -> Self {
        Self::Miss {
            method: request.method().clone(),
            uri: request.uri().clone(),
        }
    }

    /// Short name of the event kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Hit { .. } => "hit",
            Self::Miss { .. } => "miss",
            Self::Flush { .. } => "flush",
        }
    }
}

/// Receiver of [`CacheEvent`]s.
pub trait CacheObserver: Send + Sync {
    /// Called once per event.
    fn notify(&self, event: &CacheEvent);
}

impl<T> CacheObserver for Arc<T>
where
    T: CacheObserver + ?Sized,
{
    fn notify(&self, event: &CacheEvent) {
        (**self).notify(event)
    }
}

/// Default observer: logs every event at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl CacheObserver for TracingObserver {
    fn notify(&self, event: &CacheEvent) {
        match event {
            CacheEvent::Hit { method, uri } => debug!(%method, %uri, "cache hit"),
            CacheEvent::Miss { method, uri } => debug!(%method, %uri, "cache miss"),
            CacheEvent::Flush { tags: None } => debug!("cache flushed"),
            CacheEvent::Flush { tags: Some(tags) } => {
                debug!(tags = %DisplayTags(tags), "cache tags flushed")
            }
        }
    }
}

/// Observer fanning events out to several observers in order.
#[derive(Clone, Default)]
pub struct Observers(Vec<Arc<dyn CacheObserver>>);

impl Observers {
    /// Creates an empty fan-out.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an observer.
    pub fn with(mut self, observer: impl CacheObserver + 'static) -> Self {
        self.0.push(Arc::new(observer));
        self
    }
}

impl CacheObserver for Observers {
    fn notify(&self, event: &CacheEvent) {
        for observer in &self.0 {
            observer.notify(event);
        }
    }
}

impl fmt::Debug for Observers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers")
            .field("len", &self.0.len())
            .finish()
    }
}

struct DisplayTags<'a>(&'a [Tag]);

impl fmt::Display for DisplayTags<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, tag) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            f.write_str(tag.as_str())?;
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Observer that records every event, for assertions.
    #[derive(Default)]
    pub(crate) struct Recorder(pub(crate) Mutex<Vec<CacheEvent>>);

    impl CacheObserver for Recorder {
        fn notify(&self, event: &CacheEvent) {
            self.0.lock().unwrap().push(event.clone());
        }
    }

    #[test]
    fn test_fan_out_preserves_order() {
        let first = Arc::new(Recorder::default());
        let second = Arc::new(Recorder::default());
        let observers = Observers::new()
            .with(Arc::clone(&first))
            .with(Arc::clone(&second));

        observers.notify(&CacheEvent::Flush { tags: None });
        observers.notify(&CacheEvent::Flush {
            tags: Some(vec![Tag::from("users")]),
        });

        assert_eq!(first.0.lock().unwrap().len(), 2);
        assert_eq!(*first.0.lock().unwrap(), *second.0.lock().unwrap());
    }

    #[test]
    fn test_event_kind() {
        let request = http::Request::get("/x").body(()).unwrap();
        let head = RequestHead::from(&request);
        assert_eq!(CacheEvent::hit(&head).kind(), "hit");
        assert_eq!(CacheEvent::miss(&head).kind(), "miss");
        assert_eq!(CacheEvent::Flush { tags: None }.kind(), "flush");
    }
}
