//! Span lifecycle.
//!
//! A [`Span`] represents one traced operation. It is created by
//! [`start_span`], accumulates tags while open, and emits exactly one
//! structured record when finished, classifying the outcome as success,
//! slow, or error:
//!
//! ```
//! use spanlog::{start_span, Context};
//!
//! fn lookup_user(cx: &Context, id: u64) -> Result<String, std::io::Error> {
//!     let (span, cx) = start_span(cx, "lookup_user");
//!     span.set_tag("user_id", id as i64);
//!
//!     let result = fetch(&cx, id);
//!     span.finish_result(&result);
//!     result
//! }
//! # fn fetch(_cx: &Context, _id: u64) -> Result<String, std::io::Error> { Ok("ok".into()) }
//! # lookup_user(&Context::new(), 7).unwrap();
//! ```

use crate::common::Field;
use crate::context::Context;
use crate::global;
use crate::logger::{
    Level, Logger, DURATION_FIELD, REQUEST_ID_FIELD, SPAN_FIELD, SPAN_ID_FIELD,
};
use std::borrow::Cow;
use std::fmt;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Elapsed time beyond which an error-free span is reported as slow.
const SLOW_THRESHOLD: Duration = Duration::from_secs(1);

const FINISHED_OK: &str = "span finished successfully";
const FINISHED_SLOW: &str = "span finished slowly";
const FINISHED_ERR: &str = "span finished with error";

/// Starts a span named `name` and returns it together with a carrier
/// derived from `cx` that binds the new span id.
///
/// The span's bound logger is built from the process-wide default — never
/// from a logger override bound in `cx` — augmented with `span`, `spanID`,
/// and, when resolvable, `requestID` fields. The caller is responsible for
/// threading the returned carrier through all work inside the span's scope
/// so that nested spans and logs see the right lineage.
pub fn start_span(cx: &Context, name: impl Into<Cow<'static, str>>) -> (Span, Context) {
    let name = name.into();
    let span_id = Uuid::new_v4().to_string();

    let mut fields = vec![
        Field::new(SPAN_FIELD, name.clone()),
        Field::new(SPAN_ID_FIELD, span_id.clone()),
    ];
    // An empty request id is treated as unbound on this path.
    match cx.request_id() {
        Some(request_id) if !request_id.is_empty() => {
            fields.push(Field::new(REQUEST_ID_FIELD, request_id.to_owned()));
        }
        _ => {}
    }

    let span = Span {
        name,
        id: span_id.clone(),
        logger: global::default_logger().with_fields(fields),
        start: Instant::now(),
        tags: Mutex::new(Vec::new()),
    };
    (span, cx.with_span_id(span_id))
}

/// One traced operation.
///
/// Tags may be appended from multiple threads through a shared reference;
/// finishing requires ownership, so a span finishes at most once and no
/// tag can be appended after the completion record was emitted. A span
/// that is dropped without finishing emits nothing.
pub struct Span {
    name: Cow<'static, str>,
    id: String,
    logger: Logger,
    start: Instant,
    tags: Mutex<Vec<Field>>,
}

impl Span {
    /// Returns the span's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the span's globally-unique id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Appends a tag to the span.
    ///
    /// Tags are not deduplicated: repeated keys produce repeated entries in
    /// emission order.
    pub fn set_tag(&self, key: impl Into<crate::Key>, value: impl Into<crate::Value>) {
        if let Ok(mut tags) = self.tags.lock() {
            tags.push(Field::new(key, value));
        }
    }

    /// Finishes the span as error-free and emits its completion record.
    ///
    /// The outcome is info-level, or warn-level when the span ran longer
    /// than one second.
    pub fn finish(self) {
        self.complete(None);
    }

    /// Finishes the span with the final outcome of the operation it
    /// wrapped.
    ///
    /// An `Err` outcome is reported at error level with an `error` field
    /// rendering the error's message, taking precedence over the slow
    /// classification. An `Ok` outcome behaves like [`finish`].
    ///
    /// [`finish`]: Span::finish
    pub fn finish_result<T, E: fmt::Display>(self, result: &Result<T, E>) {
        match result {
            Ok(_) => self.complete(None),
            Err(err) => self.complete(Some(Field::error(err))),
        }
    }

    /// Finishes the span as failed with the given error.
    pub fn finish_error<E: fmt::Display + ?Sized>(self, err: &E) {
        self.complete(Some(Field::error(err)));
    }

    fn complete(self, error: Option<Field>) {
        let elapsed = self.start.elapsed();
        // Consuming the span means no reference can still append; a
        // poisoned lock only means a tagging thread panicked, so keep
        // whatever was recorded.
        let mut fields = self.tags.into_inner().unwrap_or_else(|e| e.into_inner());
        fields.push(Field::duration(DURATION_FIELD, elapsed));

        let (level, message) = classify(elapsed, error.is_some());
        if let Some(error) = error {
            fields.push(error);
        }
        self.logger.log(level, message, fields);
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Span")
            .field("name", &self.name)
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// Outcome classification, first match wins: error, then slow, then
/// success. Exactly one second is still a success.
fn classify(elapsed: Duration, has_error: bool) -> (Level, &'static str) {
    if has_error {
        (Level::Error, FINISHED_ERR)
    } else if elapsed > SLOW_THRESHOLD {
        (Level::Warn, FINISHED_SLOW)
    } else {
        (Level::Info, FINISHED_OK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{InMemorySink, Record};
    use crate::Value;

    fn records_for(sink: &InMemorySink, span_name: &str) -> Vec<Record> {
        sink.emitted()
            .into_iter()
            .filter(|record| {
                record.fields.iter().any(|field| {
                    field.key.as_str() == SPAN_FIELD
                        && field.value == Value::String(span_name.to_owned().into())
                })
            })
            .collect()
    }

    fn field_value<'a>(record: &'a Record, key: &str) -> Option<&'a Value> {
        record
            .fields
            .iter()
            .find(|field| field.key.as_str() == key)
            .map(|field| &field.value)
    }

    #[test]
    fn classification_boundaries() {
        assert_eq!(
            classify(Duration::from_millis(10), false),
            (Level::Info, FINISHED_OK)
        );
        // Exactly one second is not slow; one nanosecond more is.
        assert_eq!(
            classify(SLOW_THRESHOLD, false),
            (Level::Info, FINISHED_OK)
        );
        assert_eq!(
            classify(SLOW_THRESHOLD + Duration::from_nanos(1), false),
            (Level::Warn, FINISHED_SLOW)
        );
        // An error takes precedence over any elapsed time.
        assert_eq!(
            classify(Duration::from_millis(10), true),
            (Level::Error, FINISHED_ERR)
        );
        assert_eq!(
            classify(Duration::from_secs(5), true),
            (Level::Error, FINISHED_ERR)
        );
    }

    #[test]
    fn derived_context_binds_the_new_span_id() {
        global::install_test_sink();
        let root = Context::new();
        let (outer, cx) = start_span(&root, "outer-span");

        assert_eq!(root.span_id(), None);
        assert_eq!(cx.span_id(), Some(outer.id()));

        let (inner, inner_cx) = start_span(&cx, "inner-span");
        assert_eq!(inner_cx.span_id(), Some(inner.id()));
        assert_ne!(inner.id(), outer.id());
        // The outer carrier still sees the outer span.
        assert_eq!(cx.span_id(), Some(outer.id()));
    }

    #[test]
    fn finish_emits_one_success_record() {
        let sink = global::install_test_sink();
        let (span, _cx) = start_span(&Context::new(), "quick-span");
        span.set_tag("k", "v");
        span.finish();

        let records = records_for(&sink, "quick-span");
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.level, Level::Info);
        assert_eq!(record.message, FINISHED_OK);
        assert_eq!(field_value(record, "k"), Some(&Value::String("v".into())));
        assert!(matches!(
            field_value(record, DURATION_FIELD),
            Some(Value::Duration(_))
        ));
        assert_eq!(field_value(record, "error"), None);
    }

    #[test]
    fn slow_span_emits_warn_with_duration() {
        let sink = global::install_test_sink();
        let (mut span, _cx) = start_span(&Context::new(), "slow-span");
        span.set_tag("k", "v");
        span.start = Instant::now() - Duration::from_millis(1200);
        span.finish();

        let records = records_for(&sink, "slow-span");
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.level, Level::Warn);
        assert_eq!(record.message, FINISHED_SLOW);
        assert_eq!(field_value(record, "k"), Some(&Value::String("v".into())));
        match field_value(record, DURATION_FIELD) {
            Some(Value::Duration(elapsed)) => {
                assert!(*elapsed >= Duration::from_millis(1200))
            }
            other => panic!("expected duration field, got {other:?}"),
        }
        assert_eq!(field_value(record, "error"), None);
    }

    #[test]
    fn failed_span_emits_error_record() {
        let sink = global::install_test_sink();
        let (span, _cx) = start_span(&Context::new(), "error-span");
        let result: Result<(), std::io::Error> = Err(std::io::Error::other("boom"));
        span.finish_result(&result);

        let records = records_for(&sink, "error-span");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].level, Level::Error);
        assert_eq!(records[0].message, FINISHED_ERR);
        assert_eq!(
            field_value(&records[0], "error"),
            Some(&Value::String("boom".into()))
        );
    }

    #[test]
    fn error_takes_precedence_over_slow() {
        let sink = global::install_test_sink();
        let (mut span, _cx) = start_span(&Context::new(), "slow-error-span");
        span.start = Instant::now() - Duration::from_secs(3);
        span.finish_error("late and broken");

        let records = records_for(&sink, "slow-error-span");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].level, Level::Error);
        assert_eq!(records[0].message, FINISHED_ERR);
    }

    #[test]
    fn ok_result_finishes_successfully() {
        let sink = global::install_test_sink();
        let (span, _cx) = start_span(&Context::new(), "ok-result-span");
        let result: Result<u32, std::io::Error> = Ok(7);
        span.finish_result(&result);

        let records = records_for(&sink, "ok-result-span");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].level, Level::Info);
    }

    #[test]
    fn bound_logger_carries_request_identity() {
        let sink = global::install_test_sink();
        let cx = Context::new().with_request_id("req-included");
        let (span, _cx) = start_span(&cx, "request-id-span");
        span.finish();

        let records = records_for(&sink, "request-id-span");
        assert_eq!(records.len(), 1);
        assert_eq!(
            field_value(&records[0], REQUEST_ID_FIELD),
            Some(&Value::String("req-included".into()))
        );
        assert!(matches!(
            field_value(&records[0], SPAN_ID_FIELD),
            Some(Value::String(_))
        ));
    }

    #[test]
    fn empty_request_id_is_not_attached_to_spans() {
        let sink = global::install_test_sink();
        let cx = Context::new().with_request_id("");
        let (span, _cx) = start_span(&cx, "empty-request-id-span");
        span.finish();

        let records = records_for(&sink, "empty-request-id-span");
        assert_eq!(records.len(), 1);
        assert_eq!(field_value(&records[0], REQUEST_ID_FIELD), None);
    }

    #[test]
    fn start_span_ignores_context_logger_override() {
        let global_sink = global::install_test_sink();
        let override_sink = InMemorySink::new();
        let cx = Context::new().with_logger(Logger::new(override_sink.clone()));

        let (span, _cx) = start_span(&cx, "override-bypass-span");
        span.finish();

        // The completion record goes to the process default, not the
        // injected logger.
        assert!(override_sink.emitted().is_empty());
        assert_eq!(records_for(&global_sink, "override-bypass-span").len(), 1);
    }

    #[test]
    fn repeated_tag_keys_are_all_emitted() {
        let sink = global::install_test_sink();
        let (span, _cx) = start_span(&Context::new(), "duplicate-tag-span");
        span.set_tag("k", "first");
        span.set_tag("k", "second");
        span.finish();

        let records = records_for(&sink, "duplicate-tag-span");
        let values: Vec<_> = records[0]
            .fields
            .iter()
            .filter(|field| field.key.as_str() == "k")
            .map(|field| field.value.clone())
            .collect();
        assert_eq!(
            values,
            vec![
                Value::String("first".into()),
                Value::String("second".into())
            ]
        );
    }

    #[test]
    fn concurrent_tagging_loses_nothing() {
        const THREADS: usize = 8;
        const TAGS_PER_THREAD: i64 = 50;

        let sink = global::install_test_sink();
        let (span, _cx) = start_span(&Context::new(), "concurrent-tag-span");

        std::thread::scope(|scope| {
            for thread in 0..THREADS {
                let span = &span;
                scope.spawn(move || {
                    for i in 0..TAGS_PER_THREAD {
                        span.set_tag(format!("t{thread}"), i);
                    }
                });
            }
        });
        span.finish();

        let records = records_for(&sink, "concurrent-tag-span");
        assert_eq!(records.len(), 1);
        let record = &records[0];
        for thread in 0..THREADS {
            let values: Vec<_> = record
                .fields
                .iter()
                .filter(|field| field.key.as_str() == format!("t{thread}"))
                .map(|field| field.value.clone())
                .collect();
            // Per-thread appends stay in order and none are torn or lost.
            let expected: Vec<_> = (0..TAGS_PER_THREAD).map(Value::I64).collect();
            assert_eq!(values, expected);
        }
        // bound fields (span, spanID) + tags + duration
        assert_eq!(
            record.fields.len(),
            2 + THREADS * TAGS_PER_THREAD as usize + 1
        );
    }

    #[test]
    fn unfinished_span_emits_nothing() {
        let sink = global::install_test_sink();
        {
            let (span, _cx) = start_span(&Context::new(), "never-finished-span");
            span.set_tag("k", "v");
        }
        assert!(records_for(&sink, "never-finished-span").is_empty());
    }
}
