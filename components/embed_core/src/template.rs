//! Global templates: the host's description of a context's global object.
//!
//! A template is plain host data. It names the functions and constants the
//! global object should carry; nothing happens in the engine until a context
//! is created or rebuilt from it.

use core_types::{CallbackId, IsolateId};
use rquickjs::{Ctx, IntoJs};

/// A constant a template can place on the global object.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    /// `undefined`
    Undefined,
    /// `null`
    Null,
    /// A boolean.
    Boolean(bool),
    /// A number.
    Number(f64),
    /// A string.
    String(String),
}

impl Primitive {
    pub(crate) fn to_js<'js>(&self, ctx: &Ctx<'js>) -> rquickjs::Result<rquickjs::Value<'js>> {
        match self {
            Primitive::Undefined => Ok(rquickjs::Value::new_undefined(ctx.clone())),
            Primitive::Null => Ok(rquickjs::Value::new_null(ctx.clone())),
            Primitive::Boolean(value) => Ok(rquickjs::Value::new_bool(ctx.clone(), *value)),
            Primitive::Number(value) => Ok(rquickjs::Value::new_float(ctx.clone(), *value)),
            Primitive::String(value) => value.as_str().into_js(ctx),
        }
    }
}

impl From<bool> for Primitive {
    fn from(value: bool) -> Self {
        Primitive::Boolean(value)
    }
}

impl From<f64> for Primitive {
    fn from(value: f64) -> Self {
        Primitive::Number(value)
    }
}

impl From<i32> for Primitive {
    fn from(value: i32) -> Self {
        Primitive::Number(f64::from(value))
    }
}

impl From<&str> for Primitive {
    fn from(value: &str) -> Self {
        Primitive::String(value.to_string())
    }
}

impl From<String> for Primitive {
    fn from(value: String) -> Self {
        Primitive::String(value)
    }
}

/// One named property of the global object.
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    /// A function forwarding to the host closure under this id.
    Function(CallbackId),
    /// A constant.
    Data(Primitive),
}

/// Named bindings for a context's global object, in insertion order.
///
/// Setting a name that is already bound replaces the binding in place.
#[derive(Debug, Clone)]
pub struct GlobalTemplate {
    isolate: IsolateId,
    bindings: Vec<(String, Binding)>,
}

impl GlobalTemplate {
    pub(crate) fn new(isolate: IsolateId) -> Self {
        Self {
            isolate,
            bindings: Vec::new(),
        }
    }

    /// Isolate the template was created for.
    pub fn isolate_id(&self) -> IsolateId {
        self.isolate
    }

    /// Bind `name` to a function calling the host closure under `id`.
    pub fn set_function(&mut self, name: impl Into<String>, id: CallbackId) -> &mut Self {
        self.set(name.into(), Binding::Function(id))
    }

    /// Bind `name` to a constant.
    pub fn set_value(&mut self, name: impl Into<String>, value: impl Into<Primitive>) -> &mut Self {
        self.set(name.into(), Binding::Data(value.into()))
    }

    fn set(&mut self, name: String, binding: Binding) -> &mut Self {
        match self.bindings.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = binding,
            None => self.bindings.push((name, binding)),
        }
        self
    }

    /// The binding for `name`, if any.
    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.bindings
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, binding)| binding)
    }

    /// Remove the binding for `name`. Contexts built earlier keep the
    /// global; rebuilding them does not delete it.
    pub fn remove(&mut self, name: &str) -> Option<Binding> {
        let index = self.bindings.iter().position(|(existing, _)| existing == name)?;
        Some(self.bindings.remove(index).1)
    }

    /// Bindings in insertion order.
    pub fn bindings(&self) -> impl Iterator<Item = (&str, &Binding)> + '_ {
        self.bindings
            .iter()
            .map(|(name, binding)| (name.as_str(), binding))
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether the template binds nothing.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Release the template.
    pub fn dispose(self) {
        drop(self);
    }
}
