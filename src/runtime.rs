//! Runtime abstraction layer for async operations
//!
//! The renderer detaches one future per tile fetch and never awaits it. This
//! module lets the host choose where those futures run: on a Tokio runtime, or
//! on plain OS threads when no runtime is around.

use crate::prelude::{Arc, Future, Pin};
use std::sync::atomic::{AtomicBool, Ordering};

/// Boxed future accepted by [`AsyncSpawner::spawn_boxed`]
pub type BoxedTask = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// A trait for spawning async tasks (object-safe version)
pub trait AsyncSpawner: Send + Sync + 'static {
    /// Spawn a future and return a handle to it
    fn spawn_boxed(&self, future: BoxedTask) -> Box<dyn AsyncHandle>;
}

/// Handle to a spawned async task
pub trait AsyncHandle: Send + Sync {
    /// Check if the task is finished
    fn is_finished(&self) -> bool;
}

/// Convenience function for spawning with type safety
pub fn spawn<F>(spawner: &dyn AsyncSpawner, future: F) -> Box<dyn AsyncHandle>
where
    F: Future<Output = ()> + Send + 'static,
{
    spawner.spawn_boxed(Box::pin(future))
}

/// Runs every future to completion on its own OS thread.
///
/// Threads are not pooled or capped: a cold pass over a large view starts one
/// thread per missing tile. Meant for tests, demos and hosts without an async
/// runtime; real hosts should use `TokioSpawner`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSpawner;

impl AsyncSpawner for ThreadSpawner {
    fn spawn_boxed(&self, future: BoxedTask) -> Box<dyn AsyncHandle> {
        let finished = Arc::new(AtomicBool::new(false));
        let done = Arc::clone(&finished);

        std::thread::spawn(move || {
            futures::executor::block_on(future);
            done.store(true, Ordering::Release);
        });

        Box::new(ThreadHandle { finished })
    }
}

struct ThreadHandle {
    finished: Arc<AtomicBool>,
}

impl AsyncHandle for ThreadHandle {
    fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }
}

#[cfg(feature = "tokio-runtime")]
pub use tokio_impl::TokioSpawner;

#[cfg(feature = "tokio-runtime")]
mod tokio_impl {
    use super::*;
    use ::tokio::runtime::Handle;
    use ::tokio::task::JoinHandle;

    /// Tokio-based async spawner bound to a runtime handle
    #[derive(Debug, Clone)]
    pub struct TokioSpawner {
        handle: Handle,
    }

    impl TokioSpawner {
        /// Spawner for the runtime the caller is running inside, if any
        pub fn current() -> Option<Self> {
            Handle::try_current().ok().map(Self::from_handle)
        }

        pub fn from_handle(handle: Handle) -> Self {
            Self { handle }
        }
    }

    impl AsyncSpawner for TokioSpawner {
        fn spawn_boxed(&self, future: BoxedTask) -> Box<dyn AsyncHandle> {
            Box::new(TokioHandle(self.handle.spawn(future)))
        }
    }

    struct TokioHandle(JoinHandle<()>);

    impl AsyncHandle for TokioHandle {
        fn is_finished(&self) -> bool {
            self.0.is_finished()
        }
    }
}
