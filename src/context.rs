//! Request-scoped context propagation.
//!
//! A [`Context`] is an immutable, chainable carrier of request identity.
//! Reads are always by type; writes always produce a new derived carrier and
//! never mutate an existing one, which makes a carrier safe to hand to
//! concurrently-spawned sub-operations without synchronization.
//!
//! Three well-known entries form the public contract with upstream
//! middleware: the request id ([`Context::with_request_id`]), the active
//! span id (bound by [`start_span`]), and an optional logger override
//! ([`Context::with_logger`]).
//!
//! [`start_span`]: crate::start_span

use crate::Logger;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::hash::{BuildHasherDefault, Hasher};
use std::sync::Arc;

/// An immutable carrier of execution-scoped values.
///
/// `Context`s are immutable, and their write operations result in the
/// creation of a new context containing the original values and the new
/// specified values. Deriving adds or shadows an entry, never removes one.
///
/// # Examples
///
/// ```
/// use spanlog::Context;
///
/// let cx = Context::new();
/// let derived = cx.with_request_id("req-1");
///
/// // The original carrier is unaffected
/// assert_eq!(cx.request_id(), None);
/// assert_eq!(derived.request_id(), Some("req-1"));
/// ```
#[derive(Clone, Default)]
pub struct Context {
    entries: Option<Arc<EntryMap>>,
}

type EntryMap = HashMap<TypeId, Arc<dyn Any + Sync + Send>, BuildHasherDefault<IdHasher>>;

struct RequestId(String);
struct ActiveSpanId(String);
struct LoggerOverride(Logger);

impl Context {
    /// Creates an empty `Context`.
    ///
    /// The context is initially created with a capacity of 0, so it will not
    /// allocate until the first derivation.
    pub fn new() -> Self {
        Context::default()
    }

    /// Returns a reference to the entry for the corresponding value type.
    ///
    /// # Examples
    ///
    /// ```
    /// use spanlog::Context;
    ///
    /// #[derive(Debug, PartialEq)]
    /// struct TenantId(&'static str);
    ///
    /// let cx = Context::new().with_value(TenantId("acme"));
    ///
    /// assert_eq!(cx.get::<TenantId>(), Some(&TenantId("acme")));
    /// assert_eq!(Context::new().get::<TenantId>(), None);
    /// ```
    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.entries
            .as_ref()?
            .get(&TypeId::of::<T>())?
            .downcast_ref()
    }

    /// Returns a copy of the context with the new value included.
    ///
    /// # Examples
    ///
    /// ```
    /// use spanlog::Context;
    ///
    /// #[derive(Debug, PartialEq)]
    /// struct ValueA(&'static str);
    /// #[derive(Debug, PartialEq)]
    /// struct ValueB(u64);
    ///
    /// let cx_with_a = Context::new().with_value(ValueA("a"));
    /// let cx_with_a_and_b = cx_with_a.with_value(ValueB(42));
    ///
    /// // The first context is still available and unmodified
    /// assert_eq!(cx_with_a.get::<ValueA>(), Some(&ValueA("a")));
    /// assert_eq!(cx_with_a.get::<ValueB>(), None);
    ///
    /// // The second context now contains both values
    /// assert_eq!(cx_with_a_and_b.get::<ValueA>(), Some(&ValueA("a")));
    /// assert_eq!(cx_with_a_and_b.get::<ValueB>(), Some(&ValueB(42)));
    /// ```
    pub fn with_value<T: 'static + Send + Sync>(&self, value: T) -> Self {
        let entries = if let Some(current_entries) = &self.entries {
            let mut inner_entries = (**current_entries).clone();
            inner_entries.insert(TypeId::of::<T>(), Arc::new(value));
            Some(Arc::new(inner_entries))
        } else {
            let mut entries = EntryMap::default();
            entries.insert(TypeId::of::<T>(), Arc::new(value));
            Some(Arc::new(entries))
        };
        Context { entries }
    }

    /// Returns a copy of the context with the given request id bound.
    ///
    /// The id is not validated; an empty string is accepted and remains
    /// distinguishable from an unbound id.
    pub fn with_request_id(&self, request_id: impl Into<String>) -> Self {
        self.with_value(RequestId(request_id.into()))
    }

    /// Returns the bound request id, if any.
    pub fn request_id(&self) -> Option<&str> {
        self.get::<RequestId>().map(|id| id.0.as_str())
    }

    /// Returns the id of the span that started most recently on this
    /// carrier chain, if any.
    ///
    /// This is not necessarily the span active at call time: a caller that
    /// does not propagate the carrier returned by [`start_span`] keeps the
    /// ancestor's binding.
    ///
    /// [`start_span`]: crate::start_span
    pub fn span_id(&self) -> Option<&str> {
        self.get::<ActiveSpanId>().map(|id| id.0.as_str())
    }

    pub(crate) fn with_span_id(&self, span_id: String) -> Self {
        self.with_value(ActiveSpanId(span_id))
    }

    /// Returns a copy of the context with the given logger bound as the
    /// base for [`Logger::from_context`] resolution.
    pub fn with_logger(&self, logger: Logger) -> Self {
        self.with_value(LoggerOverride(logger))
    }

    /// Returns the bound logger override, if any.
    pub fn logger_override(&self) -> Option<&Logger> {
        self.get::<LoggerOverride>().map(|l| &l.0)
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("request_id", &self.request_id())
            .field("span_id", &self.span_id())
            .field(
                "entries count",
                &self.entries.as_ref().map_or(0, |e| e.len()),
            )
            .finish()
    }
}

/// With TypeIds as keys, there's no need to hash them. They are already
/// hashes themselves, coming from the compiler. The IdHasher holds the u64
/// of the TypeId, and then returns it, instead of doing any bit fiddling.
#[derive(Clone, Default, Debug)]
struct IdHasher(u64);

impl Hasher for IdHasher {
    fn write(&mut self, _: &[u8]) {
        unreachable!("TypeId calls write_u64");
    }

    #[inline]
    fn write_u64(&mut self, id: u64) {
        self.0 = id;
    }

    #[inline]
    fn finish(&self) -> u64 {
        self.0
    }
}
