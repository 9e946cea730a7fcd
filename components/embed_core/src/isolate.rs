//! Isolates: one engine heap and everything allocated in it.
//!
//! All engine state of an isolate lives in an [`EngineCell`] behind a
//! reentrant mutex. Host calls take the lock, so calls from different
//! threads are serialized, while a host closure invoked by script code can
//! call back into the same isolate on the same thread.
//!
//! While script code is running, the engine context it runs in is pushed on
//! the cell's frame stack. Nested host calls reuse the top frame instead of
//! entering the engine again. Anything that needs the engine to itself
//! (creating or rebuilding contexts, disposal, collection) refuses to run
//! while a frame is active and reports [`EmbedError::Reentrant`].

use crate::callback::{CallbackRegistry, HostFn};
use crate::config::IsolateConfig;
use crate::context::ExecutionContext;
use crate::error::{EmbedError, EmbedResult};
use crate::handles::{SlotKey, SlotTable};
use crate::scope::Scope;
use crate::template::GlobalTemplate;
use crate::value::Value;
use core_types::{CallbackId, IsolateId};
use parking_lot::{Mutex, ReentrantMutex, ReentrantMutexGuard};
use rquickjs::{Ctx, Persistent};
use serde::Serialize;
use std::cell::{Cell, RefCell};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

pub(crate) type StoredValue = Persistent<rquickjs::Value<'static>>;

/// Shared engine context. Never clone the `rquickjs::Context` itself: every
/// copy frees the context when dropped.
type EngineContext = Arc<rquickjs::Context>;

pub(crate) struct ContextSlot {
    engine: EngineContext,
    rebuilds: u64,
}

struct Frame {
    ctx: Ctx<'static>,
    context: Option<SlotKey>,
}

/// Engine state of one isolate. Only reachable through [`IsolateShared::lock`].
pub(crate) struct EngineCell {
    runtime: RefCell<Option<rquickjs::Runtime>>,
    housekeeping: RefCell<Option<EngineContext>>,
    contexts: RefCell<SlotTable<ContextSlot>>,
    pub(crate) values: RefCell<SlotTable<StoredValue>>,
    pub(crate) callbacks: RefCell<CallbackRegistry>,
    frames: RefCell<Vec<Frame>>,
    retired: RefCell<Vec<EngineContext>>,
    disposed: Cell<bool>,
    rebuilds: Cell<u64>,
}

// SAFETY: the cell is only ever reached through the isolate's reentrant
// mutex, so at most one thread touches the engine objects at a time. The
// engine has no thread-local state of its own.
unsafe impl Send for EngineCell {}

/// Pops the frame pushed by [`EngineCell::push_frame`].
pub(crate) struct FrameGuard<'a> {
    engine: &'a EngineCell,
}

impl Drop for FrameGuard<'_> {
    fn drop(&mut self) {
        self.engine.frames.borrow_mut().pop();
    }
}

fn erase<'js>(ctx: &Ctx<'js>) -> Ctx<'static> {
    // SAFETY: the erased copy is stored in the frame stack only while the
    // engine scope that produced `ctx` is on the call stack; `FrameGuard`
    // removes it before that scope returns.
    unsafe { std::mem::transmute::<Ctx<'js>, Ctx<'static>>(ctx.clone()) }
}

impl EngineCell {
    fn check_alive(&self, id: IsolateId) -> EmbedResult<()> {
        if self.disposed.get() {
            Err(EmbedError::IsolateDisposed(id))
        } else {
            Ok(())
        }
    }

    fn check_outermost(&self, id: IsolateId, operation: &'static str) -> EmbedResult<()> {
        if self.depth() > 0 {
            Err(EmbedError::Reentrant {
                isolate: id,
                operation,
            })
        } else {
            Ok(())
        }
    }

    pub(crate) fn depth(&self) -> usize {
        self.frames.borrow().len()
    }

    fn top_frame(&self) -> Option<(Ctx<'static>, Option<SlotKey>)> {
        self.frames
            .borrow()
            .last()
            .map(|frame| (frame.ctx.clone(), frame.context))
    }

    pub(crate) fn push_frame(&self, ctx: &Ctx<'_>, context: Option<SlotKey>) -> FrameGuard<'_> {
        self.frames.borrow_mut().push(Frame {
            ctx: erase(ctx),
            context,
        });
        FrameGuard { engine: self }
    }

    fn housekeeping(&self, id: IsolateId) -> EmbedResult<EngineContext> {
        self.housekeeping
            .borrow()
            .as_ref()
            .map(Arc::clone)
            .ok_or(EmbedError::IsolateDisposed(id))
    }

    fn context(&self, key: SlotKey) -> EmbedResult<EngineContext> {
        self.contexts
            .borrow()
            .get(key)
            .map(|slot| Arc::clone(&slot.engine))
            .ok_or(EmbedError::ContextDisposed)
    }

    fn new_context(&self, id: IsolateId) -> EmbedResult<EngineContext> {
        let runtime = self.runtime.borrow();
        let runtime = runtime.as_ref().ok_or(EmbedError::IsolateDisposed(id))?;
        rquickjs::Context::full(runtime)
            .map(Arc::new)
            .map_err(EmbedError::engine)
    }

    fn drain_retired(&self) {
        if self.depth() > 0 {
            return;
        }
        let retired = std::mem::take(&mut *self.retired.borrow_mut());
        drop(retired);
    }

    fn run_pending_jobs(&self, id: IsolateId) {
        let runtime = self.runtime.borrow();
        let Some(runtime) = runtime.as_ref() else {
            return;
        };
        loop {
            match runtime.execute_pending_job() {
                Ok(true) => {}
                Ok(false) => break,
                Err(_) => warn!(isolate = %id, "pending job threw"),
            }
        }
    }
}

/// Interrupt flags polled by the engine while script code runs.
#[derive(Debug, Default)]
pub(crate) struct InterruptState {
    terminate: AtomicBool,
    deadline: Mutex<Option<Instant>>,
}

impl InterruptState {
    fn should_interrupt(&self) -> bool {
        if self.terminate.load(Ordering::Relaxed) {
            return true;
        }
        matches!(*self.deadline.lock(), Some(deadline) if Instant::now() >= deadline)
    }

    fn arm(&self, timeout: Option<Duration>) {
        self.terminate.store(false, Ordering::Relaxed);
        *self.deadline.lock() = timeout.and_then(|t| Instant::now().checked_add(t));
    }

    fn disarm(&self) {
        *self.deadline.lock() = None;
        self.terminate.store(false, Ordering::Relaxed);
    }
}

/// Stops script code running in an isolate, from any thread.
///
/// The running `evaluate` fails with an uncatchable `InternalError:
/// interrupted` exception. Requests made while nothing runs are dropped when
/// the next evaluation starts.
#[derive(Debug, Clone)]
pub struct TerminationHandle {
    isolate: IsolateId,
    state: Weak<InterruptState>,
}

impl TerminationHandle {
    /// Isolate this handle stops.
    pub fn isolate_id(&self) -> IsolateId {
        self.isolate
    }

    /// Request termination. Returns `false` if the isolate no longer exists.
    pub fn terminate(&self) -> bool {
        match self.state.upgrade() {
            Some(state) => {
                state.terminate.store(true, Ordering::Relaxed);
                debug!(isolate = %self.isolate, "termination requested");
                true
            }
            None => false,
        }
    }
}

/// Counters describing what an isolate currently holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IsolateStats {
    /// Isolate the counters belong to.
    pub isolate: IsolateId,
    /// Value handles not yet disposed.
    pub live_values: usize,
    /// Execution contexts not yet disposed.
    pub live_contexts: usize,
    /// Registered host closures.
    pub callbacks: usize,
    /// Context rebuilds performed over the isolate's lifetime.
    pub rebuilds: u64,
    /// Whether the isolate has been disposed.
    pub disposed: bool,
}

pub(crate) struct IsolateShared {
    id: IsolateId,
    engine: ReentrantMutex<EngineCell>,
    interrupt: Arc<InterruptState>,
    timeout: Option<Duration>,
    prelude: Option<Arc<str>>,
    disposed: AtomicBool,
}

impl IsolateShared {
    fn new(config: &IsolateConfig, prelude: Option<Arc<str>>) -> EmbedResult<Arc<Self>> {
        let runtime = rquickjs::Runtime::new().map_err(EmbedError::engine)?;
        if let Some(limit) = config.memory_limit {
            runtime.set_memory_limit(limit);
        }
        if let Some(size) = config.max_stack_size {
            runtime.set_max_stack_size(size);
        }
        if let Some(threshold) = config.gc_threshold {
            runtime.set_gc_threshold(threshold);
        }

        let interrupt = Arc::new(InterruptState::default());
        let polled = Arc::clone(&interrupt);
        runtime.set_interrupt_handler(Some(Box::new(move || polled.should_interrupt())));

        let housekeeping = rquickjs::Context::full(&runtime)
            .map(Arc::new)
            .map_err(EmbedError::engine)?;

        Ok(Arc::new(Self {
            id: IsolateId::next(),
            engine: ReentrantMutex::new(EngineCell {
                runtime: RefCell::new(Some(runtime)),
                housekeeping: RefCell::new(Some(housekeeping)),
                contexts: RefCell::new(SlotTable::default()),
                values: RefCell::new(SlotTable::default()),
                callbacks: RefCell::new(CallbackRegistry::default()),
                frames: RefCell::new(Vec::new()),
                retired: RefCell::new(Vec::new()),
                disposed: Cell::new(false),
                rebuilds: Cell::new(0),
            }),
            interrupt,
            timeout: config.execution_timeout(),
            prelude,
            disposed: AtomicBool::new(false),
        }))
    }

    pub(crate) fn id(&self) -> IsolateId {
        self.id
    }

    pub(crate) fn lock(&self) -> ReentrantMutexGuard<'_, EngineCell> {
        self.engine.lock()
    }

    /// Readable without the engine lock, so it never waits on running scripts.
    pub(crate) fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Run `f` in a scope: the active frame's if script code is running on
    /// this thread, otherwise the isolate's private housekeeping context.
    pub(crate) fn enter<R, F>(self: &Arc<Self>, f: F) -> EmbedResult<R>
    where
        F: for<'js> FnOnce(&Scope<'js>) -> EmbedResult<R>,
    {
        let engine = self.lock();
        engine.check_alive(self.id)?;
        if let Some((ctx, _)) = engine.top_frame() {
            return f(&Scope::new(Arc::clone(self), ctx));
        }
        let context = engine.housekeeping(self.id)?;
        let result = context.with(|ctx| {
            let _frame = engine.push_frame(&ctx, None);
            f(&Scope::new(Arc::clone(self), ctx.clone()))
        });
        drop(context);
        engine.drain_retired();
        result
    }

    /// Run `f` in the execution context stored under `key`.
    pub(crate) fn enter_context<R, F>(self: &Arc<Self>, key: SlotKey, f: F) -> EmbedResult<R>
    where
        F: for<'js> FnOnce(&Scope<'js>) -> EmbedResult<R>,
    {
        let engine = self.lock();
        engine.check_alive(self.id)?;
        if let Some((ctx, active)) = engine.top_frame() {
            if active != Some(key) {
                return Err(EmbedError::Reentrant {
                    isolate: self.id,
                    operation: "entering another context",
                });
            }
            return f(&Scope::new(Arc::clone(self), ctx));
        }
        let context = engine.context(key)?;
        let result = context.with(|ctx| {
            let _frame = engine.push_frame(&ctx, Some(key));
            f(&Scope::new(Arc::clone(self), ctx.clone()))
        });
        drop(context);
        engine.drain_retired();
        result
    }

    /// Compile and run `source` in the context under `key`.
    ///
    /// An outermost evaluation arms the execution timeout and runs queued
    /// promise jobs before returning.
    pub(crate) fn evaluate(self: &Arc<Self>, key: SlotKey, source: &str) -> EmbedResult<Value> {
        let engine = self.lock();
        engine.check_alive(self.id)?;
        let outermost = engine.depth() == 0;
        if outermost {
            self.interrupt.arm(self.timeout);
        }
        let result = self.enter_context(key, |scope| scope.evaluate(source));
        if outermost {
            if result.is_ok() {
                engine.run_pending_jobs(self.id);
                engine.drain_retired();
            }
            self.interrupt.disarm();
        }
        result
    }

    pub(crate) fn create_context(self: &Arc<Self>, template: &GlobalTemplate) -> EmbedResult<SlotKey> {
        let engine = self.lock();
        engine.check_alive(self.id)?;
        engine.check_outermost(self.id, "creating a context")?;
        self.check_template(template)?;

        let context = engine.new_context(self.id)?;
        let key = engine.contexts.borrow_mut().insert(ContextSlot {
            engine: Arc::clone(&context),
            rebuilds: 0,
        });
        let installed: EmbedResult<()> = context.with(|ctx| {
            let _frame = engine.push_frame(&ctx, Some(key));
            let scope = Scope::new(Arc::clone(self), ctx.clone());
            scope.install_template(template, key)?;
            if let Some(prelude) = &self.prelude {
                scope.evaluate(prelude)?;
            }
            Ok(())
        });
        drop(context);
        if let Err(error) = installed {
            let slot = engine.contexts.borrow_mut().remove(key);
            drop(slot);
            return Err(error);
        }
        debug!(isolate = %self.id, bindings = template.len(), "context created");
        Ok(key)
    }

    /// Install `template`'s bindings on the global object of the context
    /// under `key`.
    ///
    /// The engine context and its global object stay the same, so scripts
    /// defined earlier keep seeing every global and pick up the new
    /// bindings. All binding values are created before the first one is
    /// installed.
    pub(crate) fn rebuild_context(
        self: &Arc<Self>,
        key: SlotKey,
        template: &GlobalTemplate,
    ) -> EmbedResult<()> {
        let engine = self.lock();
        engine.check_alive(self.id)?;
        engine.check_outermost(self.id, "rebuilding a context")?;
        self.check_template(template)?;

        let context = engine.context(key)?;
        let installed: EmbedResult<()> = context.with(|ctx| {
            let _frame = engine.push_frame(&ctx, Some(key));
            Scope::new(Arc::clone(self), ctx.clone()).install_template(template, key)
        });
        drop(context);
        installed?;

        {
            let mut contexts = engine.contexts.borrow_mut();
            let slot = contexts.get_mut(key).ok_or(EmbedError::ContextDisposed)?;
            slot.rebuilds += 1;
        }
        engine.rebuilds.set(engine.rebuilds.get() + 1);
        debug!(isolate = %self.id, bindings = template.len(), "context rebuilt");
        Ok(())
    }

    pub(crate) fn context_rebuilds(&self, key: SlotKey) -> EmbedResult<u64> {
        let engine = self.lock();
        engine.check_alive(self.id)?;
        let contexts = engine.contexts.borrow();
        contexts
            .get(key)
            .map(|slot| slot.rebuilds)
            .ok_or(EmbedError::ContextDisposed)
    }

    pub(crate) fn has_context(&self, key: SlotKey) -> bool {
        let engine = self.lock();
        let alive = engine.contexts.borrow().get(key).is_some();
        alive
    }

    pub(crate) fn dispose_context(&self, key: SlotKey) {
        let engine = self.lock();
        if engine.disposed.get() {
            return;
        }
        let slot = engine.contexts.borrow_mut().remove(key);
        if let Some(slot) = slot {
            if engine.depth() > 0 {
                engine.retired.borrow_mut().push(slot.engine);
            } else {
                drop(slot);
            }
            trace!(isolate = %self.id, "context disposed");
        }
    }

    pub(crate) fn release_value(&self, key: SlotKey) {
        let engine = self.lock();
        if engine.disposed.get() {
            return;
        }
        let stored = engine.values.borrow_mut().remove(key);
        drop(stored);
    }

    pub(crate) fn check_callback(&self, id: CallbackId) -> EmbedResult<()> {
        let engine = self.lock();
        engine.check_alive(self.id)?;
        let found = engine.callbacks.borrow().get(id).is_some();
        if found {
            Ok(())
        } else {
            Err(EmbedError::UnknownCallback(id))
        }
    }

    fn check_template(&self, template: &GlobalTemplate) -> EmbedResult<()> {
        if template.isolate_id() != self.id {
            return Err(EmbedError::ForeignHandle {
                expected: self.id,
                found: template.isolate_id(),
            });
        }
        Ok(())
    }

    pub(crate) fn register(&self, id: Option<CallbackId>, function: Arc<HostFn>) -> EmbedResult<CallbackId> {
        let engine = self.lock();
        engine.check_alive(self.id)?;
        let mut callbacks = engine.callbacks.borrow_mut();
        let id = match id {
            Some(id) => callbacks.insert_with_id(id, function)?,
            None => callbacks.insert(function),
        };
        trace!(isolate = %self.id, callback = %id, "host function registered");
        Ok(id)
    }

    fn collect_garbage(&self) -> EmbedResult<()> {
        let engine = self.lock();
        engine.check_alive(self.id)?;
        engine.check_outermost(self.id, "collecting garbage")?;
        let runtime = engine.runtime.borrow();
        if let Some(runtime) = runtime.as_ref() {
            runtime.run_gc();
        }
        Ok(())
    }

    fn stats(&self) -> IsolateStats {
        let engine = self.lock();
        let stats = IsolateStats {
            isolate: self.id,
            live_values: engine.values.borrow().len(),
            live_contexts: engine.contexts.borrow().len(),
            callbacks: engine.callbacks.borrow().len(),
            rebuilds: engine.rebuilds.get(),
            disposed: engine.disposed.get(),
        };
        stats
    }

    /// Release every handle, context and host closure, then the engine.
    fn teardown(&self) -> EmbedResult<()> {
        let engine = self.lock();
        if engine.disposed.get() {
            return Ok(());
        }
        engine.check_outermost(self.id, "disposing the isolate")?;
        engine.disposed.set(true);
        self.disposed.store(true, Ordering::Release);

        // Closures may own handles; their drops are no-ops once `disposed`
        // is set, and the tables are drained below.
        let callbacks = engine.callbacks.borrow_mut().take_all();
        drop(callbacks);

        let values = engine.values.borrow_mut().drain();
        let leaked = values.len();
        drop(values);
        let contexts = engine.contexts.borrow_mut().drain();
        drop(contexts);
        let retired = std::mem::take(&mut *engine.retired.borrow_mut());
        drop(retired);
        let housekeeping = engine.housekeeping.borrow_mut().take();
        drop(housekeeping);

        let runtime = engine.runtime.borrow_mut().take();
        if let Some(runtime) = runtime {
            runtime.set_interrupt_handler(None);
            drop(runtime);
        }
        if leaked > 0 {
            debug!(isolate = %self.id, leaked, "released undisposed value handles");
        }
        info!(isolate = %self.id, "isolate disposed");
        Ok(())
    }
}

/// An independent engine instance with its own heap.
///
/// Handles created by one isolate are rejected by every other isolate.
/// Dropping the isolate disposes it; outstanding [`Value`] and
/// [`ExecutionContext`] handles then report [`EmbedError::IsolateDisposed`].
pub struct Isolate {
    shared: Arc<IsolateShared>,
}

impl Isolate {
    pub(crate) fn new(config: &IsolateConfig, prelude: Option<Arc<str>>) -> EmbedResult<Self> {
        let shared = IsolateShared::new(config, prelude)?;
        info!(isolate = %shared.id(), ?config, "isolate created");
        Ok(Self { shared })
    }

    pub(crate) fn shared(&self) -> &Arc<IsolateShared> {
        &self.shared
    }

    /// Process-unique id of this isolate.
    pub fn id(&self) -> IsolateId {
        self.shared.id()
    }

    /// Create an empty global template.
    pub fn create_template(&self) -> EmbedResult<GlobalTemplate> {
        self.shared.lock().check_alive(self.id())?;
        Ok(GlobalTemplate::new(self.id()))
    }

    /// Create an execution context whose global object is built from
    /// `template`.
    pub fn create_context(&self, template: &GlobalTemplate) -> EmbedResult<ExecutionContext> {
        let key = self.shared.create_context(template)?;
        Ok(ExecutionContext::new(Arc::clone(&self.shared), key))
    }

    /// Register a host closure under a freshly allocated id.
    pub fn register_callback<F>(&self, function: F) -> EmbedResult<CallbackId>
    where
        F: Fn(&mut crate::CallbackInfo<'_>) + Send + Sync + 'static,
    {
        self.shared.register(None, Arc::new(function))
    }

    /// Register a host closure under an id chosen by the host.
    pub fn register_callback_with_id<F>(&self, id: CallbackId, function: F) -> EmbedResult<()>
    where
        F: Fn(&mut crate::CallbackInfo<'_>) + Send + Sync + 'static,
    {
        self.shared.register(Some(id), Arc::new(function)).map(drop)
    }

    /// Remove a host closure. Script calls to functions bound to `id` throw
    /// a `ReferenceError` afterwards.
    pub fn unregister_callback(&self, id: CallbackId) -> EmbedResult<bool> {
        let engine = self.shared.lock();
        engine.check_alive(self.id())?;
        let removed = engine.callbacks.borrow_mut().remove(id);
        Ok(removed.is_some())
    }

    /// Run `f` with a scope for inspecting several values under one lock.
    pub fn with_scope<R, F>(&self, f: F) -> EmbedResult<R>
    where
        F: for<'js> FnOnce(&Scope<'js>) -> EmbedResult<R>,
    {
        self.shared.enter(f)
    }

    /// Whether `value` is `null`.
    pub fn is_null(&self, value: &Value) -> EmbedResult<bool> {
        self.shared.enter(|scope| scope.is_null(value))
    }

    /// Whether `value` is `undefined`.
    pub fn is_undefined(&self, value: &Value) -> EmbedResult<bool> {
        self.shared.enter(|scope| scope.is_undefined(value))
    }

    /// Whether `value` is a boolean primitive.
    pub fn is_boolean(&self, value: &Value) -> EmbedResult<bool> {
        self.shared.enter(|scope| scope.is_boolean(value))
    }

    /// Whether `value` is a number primitive.
    pub fn is_number(&self, value: &Value) -> EmbedResult<bool> {
        self.shared.enter(|scope| scope.is_number(value))
    }

    /// Whether `value` is a string primitive.
    pub fn is_string(&self, value: &Value) -> EmbedResult<bool> {
        self.shared.enter(|scope| scope.is_string(value))
    }

    /// Whether `value` is an object (functions included).
    pub fn is_object(&self, value: &Value) -> EmbedResult<bool> {
        self.shared.enter(|scope| scope.is_object(value))
    }

    /// JavaScript `ToNumber` followed by truncation toward zero.
    pub fn value_to_int(&self, value: &Value) -> EmbedResult<i64> {
        self.shared.enter(|scope| scope.to_int(value))
    }

    /// Byte length of the UTF-8 encoding of `value`'s string conversion.
    pub fn utf8_length(&self, value: &Value) -> EmbedResult<usize> {
        self.shared.enter(|scope| scope.utf8_length(value))
    }

    /// Copy the UTF-8 encoding of `value` into `buffer`, returning the
    /// number of bytes written.
    pub fn copy_utf8(&self, value: &Value, buffer: &mut [u8]) -> EmbedResult<usize> {
        self.shared.enter(|scope| scope.copy_utf8(value, buffer))
    }

    /// Read the own or inherited property `key` of `target`.
    pub fn get_property(&self, target: &Value, key: &str) -> EmbedResult<Value> {
        self.shared.enter(|scope| scope.get_property(target, key))
    }

    /// Handle for stopping script execution from another thread.
    pub fn termination_handle(&self) -> TerminationHandle {
        TerminationHandle {
            isolate: self.id(),
            state: Arc::downgrade(&self.shared.interrupt),
        }
    }

    /// Run a full garbage collection.
    pub fn collect_garbage(&self) -> EmbedResult<()> {
        self.shared.collect_garbage()
    }

    /// Current handle and context counts.
    pub fn stats(&self) -> IsolateStats {
        self.shared.stats()
    }

    /// Dispose the isolate and everything allocated in it.
    ///
    /// Fails with [`EmbedError::Reentrant`] when called from a host closure
    /// of this isolate; the isolate is left intact in that case.
    pub fn dispose(self) -> EmbedResult<()> {
        self.shared.teardown()
    }
}

impl Drop for Isolate {
    fn drop(&mut self) {
        if let Err(error) = self.shared.teardown() {
            warn!(isolate = %self.id(), %error, "isolate dropped while in use; engine leaked");
        }
    }
}

impl std::fmt::Debug for Isolate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Isolate").field("id", &self.id()).finish()
    }
}
