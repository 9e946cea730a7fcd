//! Owning handles to engine values.

use crate::error::EmbedResult;
use crate::handles::SlotKey;
use crate::isolate::IsolateShared;
use core_types::{IsolateId, ValueKind};
use std::fmt;
use std::sync::Arc;

/// A host-owned reference to a value in an isolate's heap.
///
/// The value stays reachable while the handle exists. Dropping the handle
/// (or calling [`Value::dispose`]) releases it exactly once; there is no
/// `Clone`, so a handle cannot be released twice.
///
/// Every accessor takes the isolate lock for the duration of the call.
/// Inside a host closure use the [`Scope`](crate::Scope) methods instead;
/// they run in the scope already entered.
pub struct Value {
    shared: Arc<IsolateShared>,
    key: SlotKey,
}

impl Value {
    pub(crate) fn new(shared: Arc<IsolateShared>, key: SlotKey) -> Self {
        Self { shared, key }
    }

    pub(crate) fn key(&self) -> SlotKey {
        self.key
    }

    /// Isolate that owns the value.
    pub fn isolate_id(&self) -> IsolateId {
        self.shared.id()
    }

    /// `typeof`-style classification.
    pub fn kind(&self) -> EmbedResult<ValueKind> {
        self.shared.enter(|scope| scope.value_kind(self))
    }

    /// Whether the value is `null`.
    pub fn is_null(&self) -> EmbedResult<bool> {
        self.shared.enter(|scope| scope.is_null(self))
    }

    /// Whether the value is `undefined`.
    pub fn is_undefined(&self) -> EmbedResult<bool> {
        self.shared.enter(|scope| scope.is_undefined(self))
    }

    /// Whether the value is a boolean primitive.
    pub fn is_boolean(&self) -> EmbedResult<bool> {
        self.shared.enter(|scope| scope.is_boolean(self))
    }

    /// Whether the value is a number primitive.
    pub fn is_number(&self) -> EmbedResult<bool> {
        self.shared.enter(|scope| scope.is_number(self))
    }

    /// Whether the value is a string primitive.
    pub fn is_string(&self) -> EmbedResult<bool> {
        self.shared.enter(|scope| scope.is_string(self))
    }

    /// Whether the value is an object, functions included.
    pub fn is_object(&self) -> EmbedResult<bool> {
        self.shared.enter(|scope| scope.is_object(self))
    }

    /// Whether the value is callable.
    pub fn is_function(&self) -> EmbedResult<bool> {
        self.shared.enter(|scope| scope.is_function(self))
    }

    /// `ToNumber` truncated toward zero; see [`Scope::to_int`](crate::Scope::to_int).
    pub fn to_int(&self) -> EmbedResult<i64> {
        self.shared.enter(|scope| scope.to_int(self))
    }

    /// JavaScript `ToNumber`.
    pub fn to_number(&self) -> EmbedResult<f64> {
        self.shared.enter(|scope| scope.to_number(self))
    }

    /// JavaScript `ToBoolean`.
    pub fn to_boolean(&self) -> EmbedResult<bool> {
        self.shared.enter(|scope| scope.to_boolean(self))
    }

    /// JavaScript `ToString` as an owned Rust string.
    pub fn to_rust_string(&self) -> EmbedResult<String> {
        self.shared.enter(|scope| scope.to_rust_string(self))
    }

    /// Byte length of the value's UTF-8 string form.
    pub fn utf8_length(&self) -> EmbedResult<usize> {
        self.shared.enter(|scope| scope.utf8_length(self))
    }

    /// Copy the value's UTF-8 string form into `buffer`.
    pub fn copy_utf8(&self, buffer: &mut [u8]) -> EmbedResult<usize> {
        self.shared.enter(|scope| scope.copy_utf8(self, buffer))
    }

    /// Property lookup; see [`Scope::get_property`](crate::Scope::get_property).
    pub fn get(&self, key: &str) -> EmbedResult<Value> {
        self.shared.enter(|scope| scope.get_property(self, key))
    }

    /// Release the value.
    pub fn dispose(self) {
        drop(self);
    }
}

impl Drop for Value {
    fn drop(&mut self) {
        self.shared.release_value(self.key);
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Value")
            .field("isolate", &self.isolate_id())
            .field("slot", &self.key)
            .finish()
    }
}
