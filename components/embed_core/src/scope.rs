//! Scopes: an entered engine context plus the isolate it belongs to.
//!
//! Every value operation runs inside a scope. Hosts get one from
//! [`Isolate::with_scope`](crate::Isolate::with_scope) or, inside a host
//! closure, through [`CallbackInfo`](crate::CallbackInfo). The one-shot
//! methods on [`Isolate`](crate::Isolate) and [`Value`] open a scope per call.

use crate::callback;
use crate::error::{EmbedError, EmbedResult, Exception};
use crate::handles::SlotKey;
use crate::isolate::IsolateShared;
use crate::template::{Binding, GlobalTemplate};
use crate::value::Value;
use core_types::{ErrorKind, IsolateId, JsError, ValueKind};
use rquickjs::convert::Coerced;
use rquickjs::{Ctx, Function, Object, Persistent, Type};
use std::sync::Arc;
use tracing::debug;

/// An entered engine context.
pub struct Scope<'js> {
    shared: Arc<IsolateShared>,
    ctx: Ctx<'js>,
}

impl<'js> Scope<'js> {
    pub(crate) fn new(shared: Arc<IsolateShared>, ctx: Ctx<'js>) -> Self {
        Self { shared, ctx }
    }

    pub(crate) fn ctx(&self) -> &Ctx<'js> {
        &self.ctx
    }

    /// Isolate this scope belongs to.
    pub fn isolate_id(&self) -> IsolateId {
        self.shared.id()
    }

    /// Store an engine value in the handle table.
    pub(crate) fn wrap(&self, value: rquickjs::Value<'js>) -> Value {
        let stored = Persistent::save(&self.ctx, value);
        let key = self.shared.lock().values.borrow_mut().insert(stored);
        Value::new(Arc::clone(&self.shared), key)
    }

    /// Load the engine value behind a handle.
    pub(crate) fn restore(&self, value: &Value) -> EmbedResult<rquickjs::Value<'js>> {
        if value.isolate_id() != self.isolate_id() {
            return Err(EmbedError::ForeignHandle {
                expected: self.isolate_id(),
                found: value.isolate_id(),
            });
        }
        let stored = {
            let engine = self.shared.lock();
            let values = engine.values.borrow();
            values.get(value.key()).cloned()
        };
        match stored {
            Some(stored) => stored.restore(&self.ctx).map_err(EmbedError::engine),
            None => Err(EmbedError::IsolateDisposed(self.isolate_id())),
        }
    }

    /// Turn an engine result into an [`EmbedResult`], capturing a pending
    /// exception as [`EmbedError::Exception`].
    pub(crate) fn check<T>(&self, result: rquickjs::Result<T>) -> EmbedResult<T> {
        result.map_err(|error| self.capture(error))
    }

    fn capture(&self, error: rquickjs::Error) -> EmbedError {
        if !matches!(error, rquickjs::Error::Exception) {
            return EmbedError::engine(error);
        }
        let thrown = self.ctx.catch();
        let info = self.describe(&thrown);
        debug!(isolate = %self.isolate_id(), error = %info, "exception captured");
        EmbedError::Exception(Exception::new(self.wrap(thrown), info))
    }

    fn describe(&self, thrown: &rquickjs::Value<'js>) -> JsError {
        let Some(object) = thrown.as_object() else {
            return JsError::new(ErrorKind::NonError, self.display(thrown));
        };
        let message = self.string_property(object, "message");
        let stack = self.string_property(object, "stack");
        if message.is_none() && stack.is_none() {
            return JsError::new(ErrorKind::NonError, self.display(thrown));
        }
        let kind = self
            .string_property(object, "name")
            .map(|name| ErrorKind::from_name(&name))
            .unwrap_or(ErrorKind::Error);
        let error = JsError::new(kind, message.unwrap_or_default());
        match stack {
            Some(stack) => error.with_stack_text(&stack),
            None => error,
        }
    }

    /// Read a property as a string without letting a failure escape.
    fn string_property(&self, object: &Object<'js>, key: &str) -> Option<String> {
        let value: rquickjs::Value<'js> = match object.get(key) {
            Ok(value) => value,
            Err(_) => {
                let _ = self.ctx.catch();
                return None;
            }
        };
        if value.is_undefined() || value.is_null() {
            return None;
        }
        match value.get::<Coerced<String>>() {
            Ok(text) => Some(text.0),
            Err(_) => {
                let _ = self.ctx.catch();
                None
            }
        }
    }

    fn display(&self, value: &rquickjs::Value<'js>) -> String {
        match value.get::<Coerced<String>>() {
            Ok(text) => text.0,
            Err(_) => {
                let _ = self.ctx.catch();
                format!("<{}>", Self::classify(value))
            }
        }
    }

    fn classify(value: &rquickjs::Value<'js>) -> ValueKind {
        match value.type_of() {
            Type::Uninitialized | Type::Undefined => ValueKind::Undefined,
            Type::Null => ValueKind::Null,
            Type::Bool => ValueKind::Boolean,
            Type::Int | Type::Float => ValueKind::Number,
            Type::String => ValueKind::String,
            Type::Symbol => ValueKind::Symbol,
            Type::BigInt => ValueKind::BigInt,
            Type::Function | Type::Constructor => ValueKind::Function,
            _ => ValueKind::Object,
        }
    }

    fn coerce_string(&self, raw: &rquickjs::Value<'js>) -> EmbedResult<String> {
        if let Some(string) = raw.as_string() {
            return self.check(string.to_string());
        }
        self.check(raw.get::<Coerced<String>>()).map(|text| text.0)
    }

    /// Compile and run `source` in this scope's context.
    pub fn evaluate(&self, source: &str) -> EmbedResult<Value> {
        let result = self.ctx.eval::<rquickjs::Value<'js>, _>(source);
        let value = self.check(result)?;
        Ok(self.wrap(value))
    }

    /// The global object of this scope's context.
    pub fn global(&self) -> Value {
        self.wrap(self.ctx.globals().into_value())
    }

    /// `typeof`-style classification of `value`.
    pub fn value_kind(&self, value: &Value) -> EmbedResult<ValueKind> {
        Ok(Self::classify(&self.restore(value)?))
    }

    /// Whether `value` is `null`.
    pub fn is_null(&self, value: &Value) -> EmbedResult<bool> {
        Ok(self.value_kind(value)? == ValueKind::Null)
    }

    /// Whether `value` is `undefined`.
    pub fn is_undefined(&self, value: &Value) -> EmbedResult<bool> {
        Ok(self.value_kind(value)? == ValueKind::Undefined)
    }

    /// Whether `value` is a boolean primitive.
    pub fn is_boolean(&self, value: &Value) -> EmbedResult<bool> {
        Ok(self.value_kind(value)? == ValueKind::Boolean)
    }

    /// Whether `value` is a number primitive.
    pub fn is_number(&self, value: &Value) -> EmbedResult<bool> {
        Ok(self.value_kind(value)? == ValueKind::Number)
    }

    /// Whether `value` is a string primitive.
    pub fn is_string(&self, value: &Value) -> EmbedResult<bool> {
        Ok(self.value_kind(value)? == ValueKind::String)
    }

    /// Whether `value` is an object, functions included.
    pub fn is_object(&self, value: &Value) -> EmbedResult<bool> {
        Ok(self.value_kind(value)?.is_object())
    }

    /// Whether `value` is callable.
    pub fn is_function(&self, value: &Value) -> EmbedResult<bool> {
        Ok(self.value_kind(value)? == ValueKind::Function)
    }

    /// JavaScript `ToNumber`.
    pub fn to_number(&self, value: &Value) -> EmbedResult<f64> {
        let raw = self.restore(value)?;
        self.check(raw.get::<Coerced<f64>>()).map(|number| number.0)
    }

    /// `ToNumber` truncated toward zero. `NaN` becomes 0 and out-of-range
    /// values saturate.
    pub fn to_int(&self, value: &Value) -> EmbedResult<i64> {
        let number = self.to_number(value)?;
        if number.is_nan() {
            return Ok(0);
        }
        Ok(number.trunc() as i64)
    }

    /// JavaScript `ToBoolean`.
    pub fn to_boolean(&self, value: &Value) -> EmbedResult<bool> {
        let raw = self.restore(value)?;
        self.check(raw.get::<Coerced<bool>>()).map(|flag| flag.0)
    }

    /// JavaScript `ToString`, as an owned Rust string.
    pub fn to_rust_string(&self, value: &Value) -> EmbedResult<String> {
        let raw = self.restore(value)?;
        self.coerce_string(&raw)
    }

    /// Byte length of the UTF-8 encoding of `ToString(value)`.
    pub fn utf8_length(&self, value: &Value) -> EmbedResult<usize> {
        self.to_rust_string(value).map(|text| text.len())
    }

    /// Copy the UTF-8 encoding of `ToString(value)` into the front of
    /// `buffer`. Returns the number of bytes written.
    pub fn copy_utf8(&self, value: &Value, buffer: &mut [u8]) -> EmbedResult<usize> {
        let text = self.to_rust_string(value)?;
        let bytes = text.as_bytes();
        if buffer.len() < bytes.len() {
            return Err(EmbedError::BufferTooSmall {
                needed: bytes.len(),
                provided: buffer.len(),
            });
        }
        buffer[..bytes.len()].copy_from_slice(bytes);
        Ok(bytes.len())
    }

    /// Look up `key` on `target`.
    ///
    /// Primitives are boxed first. `null` and `undefined` throw a
    /// `TypeError`; a key that is not found anywhere on the prototype chain
    /// throws a `ReferenceError`. Both come back as [`EmbedError::Exception`].
    pub fn get_property(&self, target: &Value, key: &str) -> EmbedResult<Value> {
        let raw = self.restore(target)?;
        let object = self.to_object(raw, key)?;
        let found = self.check(object.contains_key(key))?;
        if !found {
            let error = rquickjs::Exception::throw_reference(
                &self.ctx,
                &format!("property '{key}' is not defined"),
            );
            return Err(self.capture(error));
        }
        let value: rquickjs::Value<'js> = self.check(object.get(key))?;
        Ok(self.wrap(value))
    }

    fn to_object(&self, raw: rquickjs::Value<'js>, key: &str) -> EmbedResult<Object<'js>> {
        if let Some(object) = raw.as_object() {
            return Ok(object.clone());
        }
        if raw.is_null() || raw.is_undefined() {
            let error = rquickjs::Exception::throw_type(
                &self.ctx,
                &format!(
                    "cannot read property '{key}' of {}",
                    Self::classify(&raw)
                ),
            );
            return Err(self.capture(error));
        }
        let box_primitive: Function<'js> = self.check(self.ctx.globals().get("Object"))?;
        self.check(box_primitive.call((raw,)))
    }

    pub(crate) fn install_template(
        &self,
        template: &GlobalTemplate,
        context: SlotKey,
    ) -> EmbedResult<()> {
        let mut prepared = Vec::with_capacity(template.len());
        for (name, binding) in template.bindings() {
            let value = match binding {
                Binding::Function(id) => self
                    .check(callback::host_function(&self.shared, &self.ctx, context, *id))?
                    .into_value(),
                Binding::Data(primitive) => self.check(primitive.to_js(&self.ctx))?,
            };
            prepared.push((name, value));
        }
        let globals = self.ctx.globals();
        for (name, value) in prepared {
            self.check(globals.set(name, value))?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Scope<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scope")
            .field("isolate", &self.isolate_id())
            .finish_non_exhaustive()
    }
}
