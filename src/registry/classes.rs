//! Construction by class name.
//!
//! There is no runtime reflection: every class a registry can build is
//! registered up front in a [`ClassTable`] together with a factory that
//! receives the positional constructor arguments.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::ops::RangeInclusive;
use std::sync::Arc;

use crate::errors::ConstructError;

/// A constructed object handed out by the registry.
///
/// Cloning an `Instance` clones the handle, not the object, so two clones
/// compare equal under [`Instance::ptr_eq`].
#[derive(Clone)]
pub struct Instance {
    value: Arc<dyn Any + Send + Sync>,
    class_name: Arc<str>,
    type_name: &'static str,
}

impl Instance {
    fn new<T: Send + Sync + 'static>(value: T, class_name: &str) -> Self {
        Self {
            value: Arc::new(value),
            class_name: Arc::from(class_name),
            type_name: std::any::type_name::<T>(),
        }
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Rust type name of the wrapped value.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn is<T: Any>(&self) -> bool {
        self.value.is::<T>()
    }

    pub fn downcast<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.value).downcast::<T>().ok()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// Identity comparison: true when both handles point at the same object.
    pub fn ptr_eq(&self, other: &Instance) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("class_name", &self.class_name)
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

/// Positional view over constructor arguments.
#[derive(Debug, Clone, Copy)]
pub struct ConstructArgs<'a> {
    values: &'a [Value],
}

impl<'a> ConstructArgs<'a> {
    pub fn new(values: &'a [Value]) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&'a Value> {
        self.values.get(index)
    }

    pub fn as_slice(&self) -> &'a [Value] {
        self.values
    }

    /// Fail with [`ConstructError::Arity`] unless the argument count is in `range`.
    pub fn expect_len(&self, range: RangeInclusive<usize>) -> Result<(), ConstructError> {
        if range.contains(&self.values.len()) {
            return Ok(());
        }
        let expected = if range.start() == range.end() {
            range.start().to_string()
        } else {
            format!("{} to {}", range.start(), range.end())
        };
        Err(ConstructError::Arity {
            expected,
            actual: self.values.len(),
        })
    }

    pub fn str(&self, index: usize) -> Result<&'a str, ConstructError> {
        let value = self.required(index)?;
        value
            .as_str()
            .ok_or_else(|| invalid(index, "a string", value))
    }

    /// Like [`ConstructArgs::str`], but an absent argument is `None`.
    pub fn opt_str(&self, index: usize) -> Result<Option<&'a str>, ConstructError> {
        match self.values.get(index) {
            None => Ok(None),
            Some(_) => self.str(index).map(Some),
        }
    }

    pub fn i64(&self, index: usize) -> Result<i64, ConstructError> {
        let value = self.required(index)?;
        value
            .as_i64()
            .ok_or_else(|| invalid(index, "an integer", value))
    }

    pub fn bool(&self, index: usize) -> Result<bool, ConstructError> {
        let value = self.required(index)?;
        value
            .as_bool()
            .ok_or_else(|| invalid(index, "a boolean", value))
    }

    /// Deserialize argument `index` into any serde type.
    pub fn parse<T: DeserializeOwned>(&self, index: usize) -> Result<T, ConstructError> {
        let value = self.required(index)?;
        serde_json::from_value(value.clone()).map_err(|e| ConstructError::InvalidArgument {
            index,
            reason: e.to_string(),
        })
    }

    fn required(&self, index: usize) -> Result<&'a Value, ConstructError> {
        self.values
            .get(index)
            .ok_or_else(|| ConstructError::InvalidArgument {
                index,
                reason: "missing".to_string(),
            })
    }
}

fn invalid(index: usize, expected: &str, value: &Value) -> ConstructError {
    ConstructError::InvalidArgument {
        index,
        reason: format!("expected {}, got {}", expected, value),
    }
}

/// Builds instances of one class.
pub trait ClassFactory: Send + Sync {
    fn construct(&self, class_name: &str, args: ConstructArgs<'_>) -> Result<Instance, ConstructError>;

    /// Rust type produced by this factory (for diagnostics).
    fn type_name(&self) -> &'static str;
}

/// Closure-backed factory.
pub struct FnClassFactory<F, T> {
    factory_fn: F,
    _phantom: std::marker::PhantomData<fn() -> T>,
}

impl<F, T> FnClassFactory<F, T> {
    pub fn new(factory_fn: F) -> Self {
        Self {
            factory_fn,
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<F, T> ClassFactory for FnClassFactory<F, T>
where
    F: Fn(ConstructArgs<'_>) -> Result<T, ConstructError> + Send + Sync,
    T: Send + Sync + 'static,
{
    fn construct(&self, class_name: &str, args: ConstructArgs<'_>) -> Result<Instance, ConstructError> {
        let value = (self.factory_fn)(args)?;
        Ok(Instance::new(value, class_name))
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// Class name → factory table.
#[derive(Clone, Default)]
pub struct ClassTable {
    factories: HashMap<String, Arc<dyn ClassFactory>>,
}

impl ClassTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `factory` under `class_name`, replacing any previous entry.
    pub fn register<T, F>(&mut self, class_name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(ConstructArgs<'_>) -> Result<T, ConstructError> + Send + Sync + 'static,
        T: Send + Sync + 'static,
    {
        self.factories
            .insert(class_name.into(), Arc::new(FnClassFactory::new(factory)));
        self
    }

    /// Builder-style [`ClassTable::register`].
    pub fn with<T, F>(mut self, class_name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(ConstructArgs<'_>) -> Result<T, ConstructError> + Send + Sync + 'static,
        T: Send + Sync + 'static,
    {
        self.register(class_name, factory);
        self
    }

    pub fn contains(&self, class_name: &str) -> bool {
        self.factories.contains_key(class_name)
    }

    pub fn class_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Build `class_name` from `args`.
    pub fn construct(&self, class_name: &str, args: &[Value]) -> Result<Instance, ConstructError> {
        let factory = self
            .factories
            .get(class_name)
            .ok_or_else(|| ConstructError::NoConstructor(class_name.to_string()))?;
        factory.construct(class_name, ConstructArgs::new(args))
    }
}

impl fmt::Debug for ClassTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassTable")
            .field("classes", &self.class_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, PartialEq)]
    struct Widget {
        label: Option<String>,
    }

    fn table() -> ClassTable {
        ClassTable::new().with("Widget", |args: ConstructArgs<'_>| {
            args.expect_len(0..=1)?;
            Ok(Widget {
                label: args.opt_str(0)?.map(str::to_string),
            })
        })
    }

    #[test]
    fn test_construct_passes_positional_args() {
        let instance = table().construct("Widget", &[json!("success")]).unwrap();
        assert_eq!(instance.class_name(), "Widget");
        assert!(instance.is::<Widget>());

        let widget = instance.downcast::<Widget>().unwrap();
        assert_eq!(widget.label.as_deref(), Some("success"));
    }

    #[test]
    fn test_construct_arity_mismatch() {
        let err = table()
            .construct("Widget", &[json!("a"), json!("b")])
            .unwrap_err();
        assert_eq!(
            err,
            ConstructError::Arity {
                expected: "0 to 1".to_string(),
                actual: 2
            }
        );
    }

    #[test]
    fn test_construct_unknown_class() {
        let err = table().construct("Gadget", &[]).unwrap_err();
        assert_eq!(err, ConstructError::NoConstructor("Gadget".to_string()));
    }

    #[test]
    fn test_instance_identity() {
        let table = table();
        let a = table.construct("Widget", &[]).unwrap();
        let b = table.construct("Widget", &[]).unwrap();

        assert!(a.ptr_eq(&a.clone()));
        assert!(!a.ptr_eq(&b));
        assert!(a.downcast::<String>().is_none());
    }

    #[test]
    fn test_args_accessors() {
        let values = vec![json!("x"), json!(7), json!(true), json!({"retries": 3})];
        let args = ConstructArgs::new(&values);

        assert_eq!(args.len(), 4);
        assert_eq!(args.str(0).unwrap(), "x");
        assert_eq!(args.i64(1).unwrap(), 7);
        assert!(args.bool(2).unwrap());
        assert_eq!(
            args.parse::<HashMap<String, u32>>(3).unwrap().get("retries"),
            Some(&3)
        );
        assert!(matches!(
            args.str(1),
            Err(ConstructError::InvalidArgument { index: 1, .. })
        ));
        assert!(matches!(
            args.i64(9),
            Err(ConstructError::InvalidArgument { index: 9, .. })
        ));
        assert_eq!(args.opt_str(9).unwrap(), None);
    }

    #[test]
    fn test_class_names_sorted() {
        let table = table().with("Alpha", |_args: ConstructArgs<'_>| Ok(()));
        assert_eq!(table.class_names(), vec!["Alpha", "Widget"]);
        assert!(table.contains("Alpha"));
    }
}
