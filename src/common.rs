use std::borrow::{Borrow, Cow};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// The key part of a [`Field`].
///
/// Keys are cheap to clone: static and reference-counted strings are shared
/// rather than copied.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Key(LogString);

impl Key {
    /// Create a new `Key`.
    ///
    /// # Examples
    ///
    /// ```
    /// use spanlog::Key;
    /// use std::sync::Arc;
    ///
    /// let key1 = Key::new("my_static_str");
    /// let key2 = Key::new(String::from("my_owned_string"));
    /// let key3 = Key::new(Arc::from("my_ref_counted_str"));
    /// ```
    pub fn new(value: impl Into<Key>) -> Self {
        value.into()
    }

    /// Create a new const `Key`.
    pub const fn from_static_str(value: &'static str) -> Self {
        Key(LogString::Static(value))
    }

    /// Returns a reference to the underlying key name.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<&'static str> for Key {
    fn from(key_str: &'static str) -> Self {
        Key(LogString::Static(key_str))
    }
}

impl From<String> for Key {
    fn from(string: String) -> Self {
        Key(LogString::Owned(string.into_boxed_str()))
    }
}

impl From<Arc<str>> for Key {
    fn from(string: Arc<str>) -> Self {
        Key(LogString::RefCounted(string))
    }
}

impl From<Cow<'static, str>> for Key {
    fn from(string: Cow<'static, str>) -> Self {
        match string {
            Cow::Borrowed(s) => Key(LogString::Static(s)),
            Cow::Owned(s) => Key(LogString::Owned(s.into_boxed_str())),
        }
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(fmt)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.write_str(self.0.as_str())
    }
}

impl Borrow<str> for Key {
    fn borrow(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for Key {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

#[derive(Clone, Debug, Eq)]
enum LogString {
    Owned(Box<str>),
    Static(&'static str),
    RefCounted(Arc<str>),
}

impl LogString {
    fn as_str(&self) -> &str {
        match self {
            LogString::Owned(s) => s.as_ref(),
            LogString::Static(s) => s,
            LogString::RefCounted(s) => s.as_ref(),
        }
    }
}

impl PartialEq for LogString {
    fn eq(&self, other: &Self) -> bool {
        self.as_str().eq(other.as_str())
    }
}

impl std::hash::Hash for LogString {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.as_str().hash(state)
    }
}

/// Wrapper for string-like values.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct StringValue(LogString);

impl fmt::Debug for StringValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Display for StringValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl AsRef<str> for StringValue {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl StringValue {
    /// Returns a string slice to this value.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<&'static str> for StringValue {
    fn from(s: &'static str) -> Self {
        StringValue(LogString::Static(s))
    }
}

impl From<String> for StringValue {
    fn from(s: String) -> Self {
        StringValue(LogString::Owned(s.into_boxed_str()))
    }
}

impl From<Arc<str>> for StringValue {
    fn from(s: Arc<str>) -> Self {
        StringValue(LogString::RefCounted(s))
    }
}

impl From<Cow<'static, str>> for StringValue {
    fn from(s: Cow<'static, str>) -> Self {
        match s {
            Cow::Owned(s) => StringValue(LogString::Owned(s.into_boxed_str())),
            Cow::Borrowed(s) => StringValue(LogString::Static(s)),
        }
    }
}

/// The value part of a [`Field`].
///
/// The rendering of each variant is left to the sink; [`Value::Duration`]
/// exists because span completion records always carry an elapsed time.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// bool values
    Bool(bool),
    /// i64 values
    I64(i64),
    /// f64 values
    F64(f64),
    /// String values
    String(StringValue),
    /// Elapsed-time values
    Duration(Duration),
}

impl Value {
    /// String representation of the `Value`.
    ///
    /// This will allocate iff the underlying value is not a `String`.
    pub fn as_str(&self) -> Cow<'_, str> {
        match self {
            Value::Bool(v) => format!("{v}").into(),
            Value::I64(v) => format!("{v}").into(),
            Value::F64(v) => format!("{v}").into(),
            Value::String(v) => Cow::Borrowed(v.as_str()),
            Value::Duration(v) => format!("{v:?}").into(),
        }
    }
}

macro_rules! from_values {
   (
        $(
            ($t:ty, $val:expr);
        )+
    ) => {
        $(
            impl From<$t> for Value {
                fn from(t: $t) -> Self {
                    $val(t)
                }
            }
        )+
    }
}

from_values!(
    (bool, Value::Bool);
    (i64, Value::I64);
    (f64, Value::F64);
    (StringValue, Value::String);
    (Duration, Value::Duration);
);

impl From<&'static str> for Value {
    fn from(s: &'static str) -> Self {
        Value::String(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s.into())
    }
}

impl From<Arc<str>> for Value {
    fn from(s: Arc<str>) -> Self {
        Value::String(s.into())
    }
}

impl From<Cow<'static, str>> for Value {
    fn from(s: Cow<'static, str>) -> Self {
        Value::String(s.into())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => v.fmt(fmt),
            Value::I64(v) => v.fmt(fmt),
            Value::F64(v) => v.fmt(fmt),
            Value::String(v) => fmt.write_str(v.as_str()),
            Value::Duration(v) => write!(fmt, "{v:?}"),
        }
    }
}

/// A key-value pair attached to a log record or span.
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    /// The field name
    pub key: Key,

    /// The field value
    pub value: Value,
}

impl Field {
    /// Create a new `Field` pair.
    pub fn new<K, V>(key: K, value: V) -> Self
    where
        K: Into<Key>,
        V: Into<Value>,
    {
        Field {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Create a field carrying an elapsed time.
    pub fn duration<K: Into<Key>>(key: K, value: Duration) -> Self {
        Field {
            key: key.into(),
            value: Value::Duration(value),
        }
    }

    /// Create an `error` field from any displayable error value.
    ///
    /// Only the textual rendering is kept; the error's type is never
    /// inspected.
    pub fn error<E: fmt::Display + ?Sized>(err: &E) -> Self {
        Field {
            key: Key::from_static_str("error"),
            value: Value::String(err.to_string().into()),
        }
    }
}
