//! Calls through delegates

use std::fmt;

use conform_core::{Binder, CallError, MethodError, TypeRef, TypeSurface, Value};

struct Journal {
    entries: Vec<(String, i64)>,
    limit: usize,
}

#[derive(Debug, PartialEq)]
struct JournalFull {
    limit: usize,
}

impl fmt::Display for JournalFull {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "journal holds at most {} entries", self.limit)
    }
}

impl std::error::Error for JournalFull {}

impl Journal {
    fn new(limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            limit,
        }
    }

    fn record(&mut self, text: &str, priority: i64) -> Result<i64, JournalFull> {
        if self.entries.len() >= self.limit {
            return Err(JournalFull { limit: self.limit });
        }
        self.entries.push((text.to_string(), priority));
        Ok(self.entries.len() as i64)
    }
}

fn journal_binder() -> Binder {
    let binder = Binder::new();
    binder
        .define_interface(
            "Log",
            [
                "record(string, int = 1) -> int",
                "count() -> int readonly nothrow",
                "last() -> string readonly",
            ],
        )
        .unwrap();
    binder
        .define_interface("Counter", ["count() -> int readonly nothrow"])
        .unwrap();
    binder
        .declare(
            TypeSurface::<Journal>::new("Journal")
                .method("record(string, int) -> int", |this, args| -> Result<i64, MethodError> {
                    let text = args[0].as_str().unwrap_or_default();
                    let priority = args[1].as_int().unwrap_or_default();
                    Ok(this.record(text, priority)?)
                })
                .const_method("count() -> int readonly nothrow", |this, _| {
                    this.entries.len() as i64
                })
                .const_method("last() -> string readonly", |this, _| {
                    this.entries
                        .last()
                        .map(|(text, _)| text.clone())
                        .unwrap_or_default()
                }),
        )
        .unwrap();
    binder.register("Log", "Journal");
    binder.register("Counter", "Journal");
    binder
}

#[test]
fn test_calls_match_direct_calls() {
    let binder = journal_binder();
    let mut through_delegate = Journal::new(10);
    let mut direct = Journal::new(10);

    let mut log = binder.bind_mut("Log", &mut through_delegate).unwrap();
    let record = log.resolve("record", &[TypeRef::STRING, TypeRef::INT]).unwrap();
    let result = log
        .call(record, &[Value::str("boot"), Value::Int(3)])
        .unwrap()
        .unwrap();

    assert_eq!(result, Value::Int(direct.record("boot", 3).unwrap()));
    drop(log);
    assert_eq!(through_delegate.entries, direct.entries);
}

#[test]
fn test_trailing_default_is_filled() {
    let binder = journal_binder();
    let mut journal = Journal::new(10);

    let mut log = binder.bind_mut("Log", &mut journal).unwrap();
    let record = log.resolve("record", &[TypeRef::STRING, TypeRef::INT]).unwrap();
    log.call(record, &[Value::str("start")]).unwrap().unwrap();
    drop(log);

    assert_eq!(journal.entries, vec![("start".to_string(), 1)]);
}

#[test]
fn test_method_error_is_returned_untouched() {
    let binder = journal_binder();
    let mut journal = Journal::new(0);

    let mut log = binder.bind_mut("Log", &mut journal).unwrap();
    let record = log.resolve("record", &[TypeRef::STRING, TypeRef::INT]).unwrap();
    let err = log
        .call(record, &[Value::str("x"), Value::Int(1)])
        .unwrap()
        .unwrap_err();

    assert_eq!(err.downcast_ref::<JournalFull>(), Some(&JournalFull { limit: 0 }));
}

#[test]
fn test_read_only_delegate_refuses_exclusive_methods() {
    let binder = journal_binder();
    let journal = Journal::new(10);

    let log = binder.bind("Log", &journal).unwrap();
    let record = log.resolve("record", &[TypeRef::STRING, TypeRef::INT]).unwrap();
    assert!(matches!(
        log.call(record, &[Value::str("x")]),
        Err(CallError::ReadOnlyReceiver { .. })
    ));

    let count = log.resolve("count", &[]).unwrap();
    assert_eq!(log.call(count, &[]).unwrap().unwrap(), Value::Int(0));
}

#[test]
fn test_shared_view_of_exclusive_delegate() {
    let binder = journal_binder();
    let mut journal = Journal::new(10);

    let mut log = binder.bind_mut("Log", &mut journal).unwrap();
    let record = log.resolve("record", &[TypeRef::STRING, TypeRef::INT]).unwrap();
    log.call(record, &[Value::str("one")]).unwrap().unwrap();
    log.reborrow()
        .call(record, &[Value::str("two")])
        .unwrap()
        .unwrap();

    let view = log.as_delegate();
    let last = view.resolve("last", &[]).unwrap();
    assert_eq!(view.call(last, &[]).unwrap().unwrap(), Value::str("two"));
}

#[test]
fn test_caller_misuse_is_reported() {
    let binder = journal_binder();
    let journal = Journal::new(10);

    let log = binder.bind("Log", &journal).unwrap();
    let counter = binder.bind("Counter", &journal).unwrap();
    let last = log.resolve("last", &[]).unwrap();
    let count = counter.resolve("count", &[]).unwrap();

    assert!(matches!(
        counter.call(last, &[]),
        Err(CallError::ForeignSlot { .. })
    ));
    assert!(matches!(
        log.call(last, &[Value::Int(1)]),
        Err(CallError::Arity { min: 0, max: 0, got: 1, .. })
    ));
    assert_eq!(counter.call(count, &[]).unwrap().unwrap(), Value::Int(0));
}

#[test]
fn test_argument_types_are_exact() {
    let binder = journal_binder();
    let mut journal = Journal::new(10);

    let mut log = binder.bind_mut("Log", &mut journal).unwrap();
    let record = log.resolve("record", &[TypeRef::STRING, TypeRef::INT]).unwrap();
    let err = log
        .call(record, &[Value::str("x"), Value::Float(1.0)])
        .unwrap_err();
    assert_eq!(
        err,
        CallError::ArgumentType {
            method: "record(string, int = 1) -> int".to_string(),
            index: 1,
            expected: TypeRef::INT,
            got: TypeRef::FLOAT,
        }
    );
}

#[test]
fn test_delegate_crosses_threads() {
    let binder = journal_binder();
    let mut journal = Journal::new(10);
    journal.record("a", 1).unwrap();

    let counter = binder.bind("Counter", &journal).unwrap();
    let count = counter.resolve("count", &[]).unwrap();
    let seen: Vec<Value> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| s.spawn(move || counter.call(count, &[]).unwrap().unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert!(seen.iter().all(|v| *v == Value::Int(1)));
}
