use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{mpsc, Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::thread::{self, ThreadId};

use serde_json::Value;
use tracing::{debug, warn};
use watone_frame::validate_origin;

use crate::error::{Result, WindowError};
use crate::event::{Listener, ListenerId, MessageEvent};
use crate::origin::TargetOrigin;
use crate::remote::RemoteWindow;

type ListenerList = Arc<Mutex<Vec<(ListenerId, Listener)>>>;

enum Task {
    Deliver(MessageEvent),
    Flush(mpsc::Sender<()>),
}

pub(crate) struct LocalInner {
    origin: String,
    listeners: ListenerList,
    queue: mpsc::Sender<Task>,
    next_listener_id: AtomicU64,
    loop_thread: ThreadId,
}

impl LocalInner {
    fn enqueue(&self, event: MessageEvent) {
        if self.queue.send(Task::Deliver(event)).is_err() {
            debug!(origin = %self.origin, "event loop stopped; dropping message");
        }
    }
}

/// A window owned by this process.
///
/// Each local window runs one event-loop thread. Messages posted to it are
/// queued and handed to every listener in registration order, one message
/// at a time, in the order they were posted. The loop stops once the last
/// handle to the window is gone.
#[derive(Clone)]
pub struct LocalWindow {
    inner: Arc<LocalInner>,
}

impl LocalWindow {
    /// Create a window for `origin` and start its event loop.
    pub fn new(origin: impl Into<String>) -> Result<Self> {
        let origin = origin.into();
        validate_origin(&origin).map_err(WindowError::InvalidOrigin)?;

        let listeners: ListenerList = Arc::new(Mutex::new(Vec::new()));
        let (queue, tasks) = mpsc::channel();

        let loop_listeners = Arc::clone(&listeners);
        let loop_origin = origin.clone();
        let handle = thread::Builder::new()
            .name(format!("watone-window {origin}"))
            .spawn(move || run_event_loop(&loop_origin, &loop_listeners, tasks))
            .map_err(WindowError::Spawn)?;
        let loop_thread = handle.thread().id();

        debug!(%origin, "window created");

        Ok(Self {
            inner: Arc::new(LocalInner {
                origin,
                listeners,
                queue,
                next_listener_id: AtomicU64::new(1),
                loop_thread,
            }),
        })
    }

    /// This window's origin.
    pub fn origin(&self) -> &str {
        &self.inner.origin
    }

    /// A postable handle to this window.
    pub fn handle(&self) -> Window {
        Window {
            kind: WindowKind::Local(Arc::clone(&self.inner)),
        }
    }

    /// Register a listener for every inbound message.
    pub fn add_listener(&self, listener: Listener) -> ListenerId {
        let id = ListenerId(self.inner.next_listener_id.fetch_add(1, Ordering::Relaxed));
        lock(&self.inner.listeners).push((id, listener));
        id
    }

    /// Remove a listener. Unknown or already removed ids are ignored.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = lock(&self.inner.listeners);
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        before != listeners.len()
    }

    /// Register a listener that is removed when the returned guard drops.
    pub fn subscribe(&self, listener: Listener) -> Subscription {
        let id = self.add_listener(listener);
        Subscription {
            window: self.clone(),
            id,
        }
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        lock(&self.inner.listeners).len()
    }

    /// Queue an event as if it had been posted, bypassing origin checks.
    pub fn dispatch_event(&self, event: MessageEvent) {
        self.inner.enqueue(event);
    }

    /// Post `data` from this window to `target`.
    pub fn post_to(&self, target: &Window, data: Value, target_origin: &TargetOrigin) {
        target.post_message(data, target_origin, &self.handle());
    }

    /// Block until every message queued before this call has been handed to
    /// the listeners. Returns immediately when called from a listener.
    pub fn flush(&self) {
        if thread::current().id() == self.inner.loop_thread {
            return;
        }
        let (done, wait) = mpsc::channel();
        if self.inner.queue.send(Task::Flush(done)).is_ok() {
            let _ = wait.recv();
        }
    }
}

impl fmt::Debug for LocalWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalWindow")
            .field("origin", &self.inner.origin)
            .field("listeners", &self.listener_count())
            .finish()
    }
}

fn run_event_loop(origin: &str, listeners: &ListenerList, tasks: mpsc::Receiver<Task>) {
    for task in tasks {
        match task {
            Task::Deliver(event) => {
                let snapshot: Vec<Listener> = lock(listeners)
                    .iter()
                    .map(|(_, listener)| Arc::clone(listener))
                    .collect();
                for listener in snapshot {
                    if catch_unwind(AssertUnwindSafe(|| listener(&event))).is_err() {
                        warn!(%origin, "message listener panicked");
                    }
                }
            }
            Task::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
    debug!(%origin, "window event loop stopped");
}

/// Keeps a listener registered on a [`LocalWindow`] until dropped.
pub struct Subscription {
    window: LocalWindow,
    id: ListenerId,
}

impl Subscription {
    /// Remove the listener now. Safe to call any number of times.
    pub fn unsubscribe(&self) -> bool {
        self.window.remove_listener(self.id)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("origin", &self.window.origin())
            .field("id", &self.id)
            .finish()
    }
}

/// A handle messages can be posted to: a local window or the far end of a
/// bridge. Equality is identity.
#[derive(Clone)]
pub struct Window {
    kind: WindowKind,
}

#[derive(Clone)]
enum WindowKind {
    Local(Arc<LocalInner>),
    Remote(Arc<RemoteWindow>),
}

impl Window {
    pub(crate) fn from_remote(remote: Arc<RemoteWindow>) -> Self {
        Self {
            kind: WindowKind::Remote(remote),
        }
    }

    /// The target window's origin.
    pub fn origin(&self) -> &str {
        match &self.kind {
            WindowKind::Local(inner) => &inner.origin,
            WindowKind::Remote(remote) => remote.origin(),
        }
    }

    /// True for the far end of a bridge.
    pub fn is_remote(&self) -> bool {
        matches!(self.kind, WindowKind::Remote(_))
    }

    /// True once a bridged window has disconnected. Local windows never close.
    pub fn is_closed(&self) -> bool {
        match &self.kind {
            WindowKind::Local(_) => false,
            WindowKind::Remote(remote) => remote.is_closed(),
        }
    }

    /// Post `data` to this window on behalf of `source`.
    ///
    /// The message is dropped (with a warning) unless this window's origin
    /// passes `target_origin`. Delivery is asynchronous: listeners run later
    /// on the target's event loop. Nothing is reported back to the caller.
    pub fn post_message(&self, data: Value, target_origin: &TargetOrigin, source: &Window) {
        if !target_origin.matches(self.origin()) {
            warn!(
                target = %self.origin(),
                expected = %target_origin,
                "target origin does not match; message dropped"
            );
            return;
        }

        match &self.kind {
            WindowKind::Local(inner) => inner.enqueue(MessageEvent {
                data,
                origin: source.origin().to_string(),
                source: Some(source.clone()),
            }),
            WindowKind::Remote(remote) => remote.post(source.origin(), data),
        }
    }

    /// Disconnect a bridged window. No-op for local windows.
    pub fn close(&self) {
        if let WindowKind::Remote(remote) = &self.kind {
            remote.close();
        }
    }

    /// A reference that does not keep the window alive.
    pub fn downgrade(&self) -> WeakWindow {
        let kind = match &self.kind {
            WindowKind::Local(inner) => WeakKind::Local(Arc::downgrade(inner)),
            WindowKind::Remote(remote) => WeakKind::Remote(Arc::downgrade(remote)),
        };
        WeakWindow { kind }
    }

    /// Identity comparison.
    pub fn ptr_eq(&self, other: &Window) -> bool {
        match (&self.kind, &other.kind) {
            (WindowKind::Local(a), WindowKind::Local(b)) => Arc::ptr_eq(a, b),
            (WindowKind::Remote(a), WindowKind::Remote(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl PartialEq for Window {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Window {}

impl From<&LocalWindow> for Window {
    fn from(window: &LocalWindow) -> Self {
        window.handle()
    }
}

impl fmt::Debug for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_remote() { "remote" } else { "local" };
        f.debug_struct("Window")
            .field("origin", &self.origin())
            .field("kind", &kind)
            .finish()
    }
}

/// Non-owning counterpart of [`Window`].
#[derive(Clone)]
pub struct WeakWindow {
    kind: WeakKind,
}

#[derive(Clone)]
enum WeakKind {
    Local(Weak<LocalInner>),
    Remote(Weak<RemoteWindow>),
}

impl WeakWindow {
    /// The window, if it is still alive.
    pub fn upgrade(&self) -> Option<Window> {
        let kind = match &self.kind {
            WeakKind::Local(weak) => WindowKind::Local(weak.upgrade()?),
            WeakKind::Remote(weak) => WindowKind::Remote(weak.upgrade()?),
        };
        Some(Window { kind })
    }

    /// Whether this refers to `window`.
    pub fn points_to(&self, window: &Window) -> bool {
        match (&self.kind, &window.kind) {
            (WeakKind::Local(weak), WindowKind::Local(inner)) => {
                std::ptr::eq(weak.as_ptr(), Arc::as_ptr(inner))
            }
            (WeakKind::Remote(weak), WindowKind::Remote(remote)) => {
                std::ptr::eq(weak.as_ptr(), Arc::as_ptr(remote))
            }
            _ => false,
        }
    }
}

impl fmt::Debug for WeakWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upgrade() {
            Some(window) => f.debug_tuple("WeakWindow").field(&window).finish(),
            None => f.write_str("WeakWindow(<dropped>)"),
        }
    }
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
