//! Callback bridge: script calls into host closures.
//!
//! A host closure is registered on the isolate under a [`CallbackId`]. Binding
//! it into a global template materializes an engine function that carries the
//! id; when script code calls that function the bridge looks the closure up,
//! hands it the call's arguments as [`Value`] handles and converts whatever
//! the closure put into its [`ReturnValue`] back into an engine value.
//!
//! ```
//! use embed_core::{Runtime, PlatformConfig};
//!
//! let runtime = Runtime::new(PlatformConfig::new()).unwrap();
//! let isolate = runtime.create_isolate().unwrap();
//! let double = isolate
//!     .register_callback(|info| {
//!         let n = match info.arg(0) {
//!             Some(arg) => info.to_number(arg).unwrap_or(f64::NAN),
//!             None => f64::NAN,
//!         };
//!         info.return_value().set_number(n * 2.0);
//!     })
//!     .unwrap();
//!
//! let mut template = isolate.create_template().unwrap();
//! let context = isolate.create_context(&template).unwrap();
//! context.bind_function(&mut template, "double", double).unwrap();
//!
//! let result = context.evaluate("double(21)").unwrap();
//! assert_eq!(result.to_int().unwrap(), 42);
//! ```

use crate::handles::SlotKey;
use crate::isolate::IsolateShared;
use crate::scope::Scope;
use crate::value::Value;
use core_types::CallbackId;
use rquickjs::function::Rest;
use rquickjs::{Ctx, Exception, Function, IntoJs};
use std::collections::HashMap;
use std::ops::Deref;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Weak};
use tracing::{error, trace};

/// Signature of a host closure.
pub type HostFn = dyn Fn(&mut CallbackInfo<'_>) + Send + Sync + 'static;

/// Host closures registered on one isolate.
#[derive(Default)]
pub(crate) struct CallbackRegistry {
    functions: HashMap<CallbackId, Arc<HostFn>>,
    next: i32,
}

impl CallbackRegistry {
    pub(crate) fn insert(&mut self, function: Arc<HostFn>) -> CallbackId {
        loop {
            self.next = self.next.wrapping_add(1);
            let id = CallbackId(self.next);
            if !self.functions.contains_key(&id) {
                self.functions.insert(id, function);
                return id;
            }
        }
    }

    pub(crate) fn insert_with_id(
        &mut self,
        id: CallbackId,
        function: Arc<HostFn>,
    ) -> crate::EmbedResult<CallbackId> {
        if self.functions.contains_key(&id) {
            return Err(crate::EmbedError::DuplicateCallback(id));
        }
        self.functions.insert(id, function);
        Ok(id)
    }

    pub(crate) fn get(&self, id: CallbackId) -> Option<Arc<HostFn>> {
        self.functions.get(&id).cloned()
    }

    pub(crate) fn remove(&mut self, id: CallbackId) -> Option<Arc<HostFn>> {
        self.functions.remove(&id)
    }

    pub(crate) fn take_all(&mut self) -> HashMap<CallbackId, Arc<HostFn>> {
        std::mem::take(&mut self.functions)
    }

    pub(crate) fn len(&self) -> usize {
        self.functions.len()
    }
}

/// What a host closure hands back to script code.
///
/// Starts out as `undefined`; the last setter called wins.
#[derive(Debug, Default)]
pub enum ReturnValue {
    /// `undefined`
    #[default]
    Undefined,
    /// `null`
    Null,
    /// A boolean.
    Boolean(bool),
    /// A number.
    Number(f64),
    /// A string.
    String(String),
    /// An existing engine value.
    Value(Value),
    /// Throw an `Error` with this message instead of returning.
    Throw(String),
}

impl ReturnValue {
    /// Return `undefined`.
    pub fn set_undefined(&mut self) {
        *self = ReturnValue::Undefined;
    }

    /// Return `null`.
    pub fn set_null(&mut self) {
        *self = ReturnValue::Null;
    }

    /// Return a boolean.
    pub fn set_bool(&mut self, value: bool) {
        *self = ReturnValue::Boolean(value);
    }

    /// Return a number.
    pub fn set_number(&mut self, value: f64) {
        *self = ReturnValue::Number(value);
    }

    /// Return a string.
    pub fn set_string(&mut self, value: impl Into<String>) {
        *self = ReturnValue::String(value.into());
    }

    /// Return `""`.
    pub fn set_empty_string(&mut self) {
        *self = ReturnValue::String(String::new());
    }

    /// Return an engine value, for example an argument taken with
    /// [`CallbackInfo::take_arg`].
    pub fn set_value(&mut self, value: Value) {
        *self = ReturnValue::Value(value);
    }

    /// Make the call throw an `Error` carrying `message`.
    pub fn throw_error(&mut self, message: impl Into<String>) {
        *self = ReturnValue::Throw(message.into());
    }

    fn into_js<'js>(self, scope: &Scope<'js>) -> rquickjs::Result<rquickjs::Value<'js>> {
        let ctx = scope.ctx();
        match self {
            ReturnValue::Undefined => Ok(rquickjs::Value::new_undefined(ctx.clone())),
            ReturnValue::Null => Ok(rquickjs::Value::new_null(ctx.clone())),
            ReturnValue::Boolean(value) => Ok(rquickjs::Value::new_bool(ctx.clone(), value)),
            ReturnValue::Number(value) => Ok(rquickjs::Value::new_float(ctx.clone(), value)),
            ReturnValue::String(value) => value.into_js(ctx),
            ReturnValue::Value(handle) => scope
                .restore(&handle)
                .map_err(|e| Exception::throw_message(ctx, &e.to_string())),
            ReturnValue::Throw(message) => Err(Exception::throw_message(ctx, &message)),
        }
    }
}

/// Everything a host closure sees of one script call.
///
/// Dereferences to the [`Scope`] of the calling context, so values can be
/// inspected (or further scripts evaluated) without taking another lock.
pub struct CallbackInfo<'js> {
    scope: Scope<'js>,
    callback: CallbackId,
    args: Vec<Option<Value>>,
    ret: ReturnValue,
}

impl<'js> CallbackInfo<'js> {
    /// Id the closure was invoked under.
    pub fn callback_id(&self) -> CallbackId {
        self.callback
    }

    /// Number of arguments the script passed.
    pub fn len(&self) -> usize {
        self.args.len()
    }

    /// Whether the script passed no arguments.
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Argument `index`, unless it is out of range or was taken.
    pub fn arg(&self, index: usize) -> Option<&Value> {
        self.args.get(index).and_then(Option::as_ref)
    }

    /// Remaining arguments in call order.
    pub fn args(&self) -> impl Iterator<Item = &Value> + '_ {
        self.args.iter().flatten()
    }

    /// Take ownership of argument `index` so it outlives the call.
    pub fn take_arg(&mut self, index: usize) -> Option<Value> {
        self.args.get_mut(index).and_then(Option::take)
    }

    /// Slot for the call's result.
    pub fn return_value(&mut self) -> &mut ReturnValue {
        &mut self.ret
    }

    /// Scope of the calling context.
    pub fn scope(&self) -> &Scope<'js> {
        &self.scope
    }
}

impl<'js> Deref for CallbackInfo<'js> {
    type Target = Scope<'js>;

    fn deref(&self) -> &Self::Target {
        &self.scope
    }
}

/// Create an engine function that forwards calls to the closure under `id`.
pub(crate) fn host_function<'js>(
    shared: &Arc<IsolateShared>,
    ctx: &Ctx<'js>,
    context: SlotKey,
    id: CallbackId,
) -> rquickjs::Result<Function<'js>> {
    let isolate = Arc::downgrade(shared);
    Function::new(
        ctx.clone(),
        move |ctx: Ctx<'js>, args: Rest<rquickjs::Value<'js>>| {
            dispatch(&isolate, context, id, ctx, args.0)
        },
    )
}

fn dispatch<'js>(
    isolate: &Weak<IsolateShared>,
    context: SlotKey,
    id: CallbackId,
    ctx: Ctx<'js>,
    args: Vec<rquickjs::Value<'js>>,
) -> rquickjs::Result<rquickjs::Value<'js>> {
    let Some(shared) = isolate.upgrade() else {
        return Err(Exception::throw_message(&ctx, "isolate has been disposed"));
    };
    let engine = shared.lock();
    let function = engine.callbacks.borrow().get(id);
    let Some(function) = function else {
        return Err(Exception::throw_reference(
            &ctx,
            &format!("no host function registered under {id}"),
        ));
    };

    let _frame = engine.push_frame(&ctx, Some(context));
    let scope = Scope::new(Arc::clone(&shared), ctx.clone());
    let args = args.into_iter().map(|arg| Some(scope.wrap(arg))).collect();
    let mut info = CallbackInfo {
        scope,
        callback: id,
        args,
        ret: ReturnValue::Undefined,
    };
    trace!(isolate = %shared.id(), callback = %id, argc = info.len(), "host call");

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| function(&mut info)));
    let CallbackInfo {
        scope, args, ret, ..
    } = info;
    drop(args);

    if outcome.is_err() {
        error!(isolate = %shared.id(), callback = %id, "host function panicked");
        return Err(Exception::throw_internal(
            &ctx,
            &format!("host function {id} panicked"),
        ));
    }
    ret.into_js(&scope)
}
