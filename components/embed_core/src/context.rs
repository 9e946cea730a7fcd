//! Execution contexts: a global object plus the scripts evaluated against it.

use crate::error::EmbedResult;
use crate::handles::SlotKey;
use crate::isolate::IsolateShared;
use crate::template::GlobalTemplate;
use crate::value::Value;
use crate::CallbackInfo;
use core_types::{CallbackId, IsolateId};
use std::fmt;
use std::sync::Arc;
use tracing::debug_span;

/// A global scope in which scripts run.
///
/// Contexts of one isolate share its heap but not their globals. A rebuild
/// adds bindings to the existing global object; the engine context, its
/// global and every script-defined binding stay in place.
pub struct ExecutionContext {
    shared: Arc<IsolateShared>,
    key: SlotKey,
}

impl ExecutionContext {
    pub(crate) fn new(shared: Arc<IsolateShared>, key: SlotKey) -> Self {
        Self { shared, key }
    }

    /// Isolate the context belongs to.
    pub fn isolate_id(&self) -> IsolateId {
        self.shared.id()
    }

    /// Whether the context (or its isolate) has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.shared.is_disposed() || !self.shared.has_context(self.key)
    }

    /// Compile and run `source`, returning its completion value.
    ///
    /// Anything the script throws comes back as [`EmbedError::Exception`](crate::EmbedError::Exception)
    /// holding the thrown value. Called from a host closure, the script runs
    /// nested inside the calling script; only the calling context may be
    /// entered this way.
    ///
    /// # Examples
    ///
    /// ```
    /// use embed_core::{PlatformConfig, Runtime};
    ///
    /// let runtime = Runtime::new(PlatformConfig::new()).unwrap();
    /// let isolate = runtime.create_isolate().unwrap();
    /// let template = isolate.create_template().unwrap();
    /// let context = isolate.create_context(&template).unwrap();
    ///
    /// assert_eq!(context.evaluate("40 + 2").unwrap().to_int().unwrap(), 42);
    ///
    /// let error = context.evaluate("null.x").unwrap_err();
    /// let exception = error.exception().unwrap();
    /// assert_eq!(exception.info().kind.name(), "TypeError");
    /// ```
    pub fn evaluate(&self, source: &str) -> EmbedResult<Value> {
        let span = debug_span!("evaluate", isolate = %self.isolate_id(), bytes = source.len());
        let _entered = span.enter();
        self.shared.evaluate(self.key, source)
    }

    /// Bind `name` to the host closure under `id` and rebuild this context
    /// so the binding is visible to scripts.
    ///
    /// Everything earlier scripts defined stays visible, including top-level
    /// `let` and `const` bindings, and functions defined before the rebuild
    /// can call the new binding. If the rebuild fails the template keeps the
    /// new binding and the global object is left unchanged.
    pub fn bind_function(
        &self,
        template: &mut GlobalTemplate,
        name: &str,
        id: CallbackId,
    ) -> EmbedResult<()> {
        self.shared.check_callback(id)?;
        template.set_function(name, id);
        self.rebuild(template)
    }

    /// Register `function` on the isolate and bind it under `name`.
    pub fn register_function<F>(
        &self,
        template: &mut GlobalTemplate,
        name: &str,
        function: F,
    ) -> EmbedResult<CallbackId>
    where
        F: Fn(&mut CallbackInfo<'_>) + Send + Sync + 'static,
    {
        let id = self.shared.register(None, Arc::new(function))?;
        self.bind_function(template, name, id)?;
        Ok(id)
    }

    /// Install every binding of `template` on the global object. Template
    /// bindings overwrite globals of the same name; other globals are kept.
    pub fn rebuild(&self, template: &GlobalTemplate) -> EmbedResult<()> {
        self.shared.rebuild_context(self.key, template)
    }

    /// Number of times this context has been rebuilt.
    pub fn rebuild_count(&self) -> EmbedResult<u64> {
        self.shared.context_rebuilds(self.key)
    }

    /// Handle to the global object. It stays the context's global across
    /// rebuilds.
    pub fn global(&self) -> EmbedResult<Value> {
        self.shared
            .enter_context(self.key, |scope| Ok(scope.global()))
    }

    /// Release the context. Values obtained from it remain valid.
    pub fn dispose(self) {
        drop(self);
    }
}

impl Drop for ExecutionContext {
    fn drop(&mut self) {
        self.shared.dispose_context(self.key);
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("isolate", &self.isolate_id())
            .field("slot", &self.key)
            .finish()
    }
}
