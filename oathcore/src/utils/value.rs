use std::ops::{Deref, DerefMut};

/// A plain value wrapper with one-argument transforms.
///
/// `map` borrows the wrapped value and leaves `self` usable; `map_into` consumes it.
///
/// ```
/// use oathcore::utils::value::Value;
///
/// let v = Value::new(20);
/// let doubled = v.map(|x| x * 2);
/// let text = doubled.map_into(|x| format!("{x}!"));
/// assert_eq!(*v, 20);
/// assert_eq!(text.get(), "40!");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Value<T>(T);

impl<T> Value<T> {
    pub const fn new(value: T) -> Self {
        Self(value)
    }

    pub fn get(&self) -> &T {
        &self.0
    }

    pub fn get_mut(&mut self) -> &mut T {
        &mut self.0
    }

    pub fn into_inner(self) -> T {
        self.0
    }

    pub fn map<U>(&self, func: impl FnOnce(&T) -> U) -> Value<U> {
        Value(func(&self.0))
    }

    pub fn map_into<U>(self, func: impl FnOnce(T) -> U) -> Value<U> {
        Value(func(self.0))
    }
}

impl<T> From<T> for Value<T> {
    fn from(value: T) -> Self {
        Self(value)
    }
}

impl<T> AsRef<T> for Value<T> {
    fn as_ref(&self) -> &T {
        &self.0
    }
}

impl<T> Deref for Value<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> DerefMut for Value<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}
