//! # Thread creation for pool workers.
//!
//! Every worker of a pool is an OS thread created through a [`ThreadFactory`]. The pool
//! names each thread from its [`NameFormat`] template and the builder wraps whatever
//! factory it was given in an [`InstrumentedThreadFactory`] so thread churn shows up in
//! the metrics sink.
//!
//! ```text
//! WorkerPoolBuilder::build()
//!   └─► InstrumentedThreadFactory(threads.created / running / terminated)
//!         └─► user factory or DefaultThreadFactory
//!               └─► std::thread::Builder::new().name("jobs-0")
//! ```
//!
//! ## Rules
//! - The factory **must** run `body` on the new thread; the pool tracks its workers
//!   through it.
//! - The factory should apply `name` to the thread; pools rely on it for diagnostics
//!   (stuck-worker reports list thread names).
//! - Factories are called with the pool's internal lock held: they must not call back
//!   into the pool.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::thread;

use crate::telemetry::MetricsSink;

/// Code a worker thread runs.
pub type ThreadBody = Box<dyn FnOnce() + Send + 'static>;

/// Creates the OS threads backing a pool's workers.
///
/// # Example
/// ```
/// use std::io;
/// use std::thread;
/// use lifevisor::{ThreadBody, ThreadFactory};
///
/// struct SmallStacks;
///
/// impl ThreadFactory for SmallStacks {
///     fn new_thread(&self, name: String, body: ThreadBody) -> io::Result<thread::JoinHandle<()>> {
///         thread::Builder::new().name(name).stack_size(256 * 1024).spawn(body)
///     }
/// }
/// ```
pub trait ThreadFactory: Send + Sync + 'static {
    /// Spawns a thread named `name` running `body`.
    fn new_thread(&self, name: String, body: ThreadBody) -> io::Result<thread::JoinHandle<()>>;
}

/// Plain `std::thread` factory with an optional stack size.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultThreadFactory {
    stack_size: Option<usize>,
}

impl DefaultThreadFactory {
    /// Creates a factory using the platform default stack size.
    pub fn new() -> Self {
        Self { stack_size: None }
    }

    /// Creates a factory that spawns threads with `bytes` of stack.
    pub fn with_stack_size(bytes: usize) -> Self {
        Self {
            stack_size: Some(bytes),
        }
    }
}

impl ThreadFactory for DefaultThreadFactory {
    fn new_thread(&self, name: String, body: ThreadBody) -> io::Result<thread::JoinHandle<()>> {
        let mut builder = thread::Builder::new().name(name);
        if let Some(bytes) = self.stack_size {
            builder = builder.stack_size(bytes);
        }
        builder.spawn(body)
    }
}

/// Thread name template with a numeric slot.
///
/// Every `%d` in the template is replaced by a per-pool index starting at `0`.
/// A template without `%d` is used verbatim for every thread.
///
/// ```
/// use lifevisor::NameFormat;
///
/// let names = NameFormat::new("jobs-%d");
/// assert_eq!(names.next_name(), "jobs-0");
/// assert_eq!(names.next_name(), "jobs-1");
/// assert_eq!(names.metric_prefix(), "jobs");
/// ```
#[derive(Debug)]
pub struct NameFormat {
    template: Arc<str>,
    next: AtomicUsize,
}

impl NameFormat {
    /// Creates a format from `template`.
    pub fn new(template: impl Into<Arc<str>>) -> Self {
        Self {
            template: template.into(),
            next: AtomicUsize::new(0),
        }
    }

    /// Returns the raw template (the pool's display name).
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Renders the name for `index`.
    pub fn format(&self, index: usize) -> String {
        if self.template.contains("%d") {
            self.template.replace("%d", &index.to_string())
        } else {
            self.template.to_string()
        }
    }

    /// Renders the next name, advancing the index.
    pub fn next_name(&self) -> String {
        self.format(self.next.fetch_add(1, Ordering::Relaxed))
    }

    /// Derives the metrics key prefix: the template without its `%d` slot and
    /// surrounding separators (`"jobs-%d"` → `"jobs"`).
    pub fn metric_prefix(&self) -> String {
        let prefix = self
            .template
            .replace("%d", "")
            .trim_matches(|c: char| matches!(c, '-' | '_' | '.' | ' '))
            .to_owned();
        if prefix.is_empty() {
            "pool".to_owned()
        } else {
            prefix
        }
    }
}

/// Keys and live count shared by every thread of one instrumented factory.
struct ThreadInstruments {
    sink: Arc<dyn MetricsSink>,
    created: String,
    running: String,
    terminated: String,
    live: AtomicI64,
}

/// Factory decorator exporting `threads.created`, `threads.running` and
/// `threads.terminated` under `{prefix}`.
pub struct InstrumentedThreadFactory {
    inner: Arc<dyn ThreadFactory>,
    instruments: Arc<ThreadInstruments>,
}

impl InstrumentedThreadFactory {
    /// Wraps `inner`, reporting into `sink` under `prefix`.
    pub fn new(inner: Arc<dyn ThreadFactory>, sink: Arc<dyn MetricsSink>, prefix: &str) -> Self {
        Self {
            inner,
            instruments: Arc::new(ThreadInstruments {
                sink,
                created: format!("{prefix}.threads.created"),
                running: format!("{prefix}.threads.running"),
                terminated: format!("{prefix}.threads.terminated"),
                live: AtomicI64::new(0),
            }),
        }
    }
}

/// Marks a thread as running for as long as it lives (panics included).
struct RunningGuard(Arc<ThreadInstruments>);

impl RunningGuard {
    fn enter(instruments: Arc<ThreadInstruments>) -> Self {
        let live = instruments.live.fetch_add(1, Ordering::Relaxed) + 1;
        instruments.sink.set_gauge(&instruments.running, live as f64);
        Self(instruments)
    }
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        let live = self.0.live.fetch_sub(1, Ordering::Relaxed) - 1;
        self.0.sink.set_gauge(&self.0.running, live as f64);
        self.0.sink.increment_counter(&self.0.terminated, 1);
    }
}

impl ThreadFactory for InstrumentedThreadFactory {
    fn new_thread(&self, name: String, body: ThreadBody) -> io::Result<thread::JoinHandle<()>> {
        let instruments = Arc::clone(&self.instruments);
        let handle = self.inner.new_thread(
            name,
            Box::new(move || {
                let _running = RunningGuard::enter(instruments);
                body();
            }),
        )?;
        self.instruments
            .sink
            .increment_counter(&self.instruments.created, 1);
        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::InMemorySink;

    #[test]
    fn template_without_slot_is_verbatim() {
        let names = NameFormat::new("single");
        assert_eq!(names.next_name(), "single");
        assert_eq!(names.next_name(), "single");
        assert_eq!(names.metric_prefix(), "single");
        assert_eq!(NameFormat::new("%d").metric_prefix(), "pool");
    }

    #[test]
    fn default_factory_names_threads() {
        let handle = DefaultThreadFactory::with_stack_size(512 * 1024)
            .new_thread("factory-test".into(), Box::new(|| {}))
            .unwrap();
        assert_eq!(handle.thread().name(), Some("factory-test"));
        handle.join().unwrap();
    }

    #[test]
    fn instrumented_factory_counts_thread_churn() {
        let sink = Arc::new(InMemorySink::new());
        let factory =
            InstrumentedThreadFactory::new(Arc::new(DefaultThreadFactory::new()), sink.clone(), "io");

        let (tx, rx) = std::sync::mpsc::channel();
        let handle = factory
            .new_thread(
                "io-0".into(),
                Box::new(move || {
                    tx.send(thread::current().name().map(str::to_owned)).unwrap();
                }),
            )
            .unwrap();
        handle.join().unwrap();

        assert_eq!(rx.recv().unwrap().as_deref(), Some("io-0"));
        assert_eq!(sink.counter("io.threads.created"), 1);
        assert_eq!(sink.counter("io.threads.terminated"), 1);
        assert_eq!(sink.gauge("io.threads.running"), Some(0.0));
    }
}
