//! Tests for suite generation

use super::*;
use crate::callable::RaisedException;
use crate::value::Instance;

fn dummy() -> CallableRef {
    CallableRef::new("test_main", "dummy")
}

fn fib() -> CallableRef {
    CallableRef::new("mylib", "fib")
}

fn equal(callable: CallableRef, args: Arguments, value: impl Into<Value>) -> InvocationRecord {
    InvocationRecord::equal(callable, args, value.into())
}

#[test]
fn test_record_to_assertion() {
    let record = equal(dummy(), Arguments::new().arg(1).arg(2).arg(3).kwarg("verbose", true), 42);
    assert_eq!(
        record_to_assertion(&record).unwrap(),
        "self.assertEqual(test_main.dummy(1, 2, 3, verbose=True), 42)"
    );

    let record = InvocationRecord::not_equal(
        dummy(),
        Arguments::new().arg("abc").arg(true),
        Value::Bytes(b"abc".to_vec()),
    );
    assert_eq!(
        record_to_assertion(&record).unwrap(),
        "self.assertNotEqual(test_main.dummy('abc', True), b'abc')"
    );

    let record = InvocationRecord::raised(
        fib(),
        Arguments::new().arg(-1),
        RaisedException::new("mylib", "FibonacciError"),
    );
    assert_eq!(
        record_to_assertion(&record).unwrap(),
        "with self.assertRaises(mylib.FibonacciError):\n    mylib.fib(-1)"
    );
}

#[test]
fn test_argument_combinations() {
    let record = equal(dummy(), Arguments::new(), 0);
    assert_eq!(record_to_assertion(&record).unwrap(), "self.assertEqual(test_main.dummy(), 0)");

    let record = equal(dummy(), Arguments::new().kwarg("whatever", 42), vec![6, 7]);
    assert_eq!(
        record_to_assertion(&record).unwrap(),
        "self.assertEqual(test_main.dummy(whatever=42), [6, 7])"
    );

    let record = equal(dummy(), Arguments::new().kwarg("b", 2).kwarg("a", 1), Value::None);
    assert_eq!(
        record_to_assertion(&record).unwrap(),
        "self.assertEqual(test_main.dummy(b=2, a=1), None)"
    );
}

#[test]
fn test_method_and_main_names() {
    let method = CallableRef::new("test_main", "DummyClass.dummy_method");
    let record = equal(method, Arguments::new(), "");
    assert_eq!(
        record_to_assertion(&record).unwrap(),
        "self.assertEqual(test_main.DummyClass.dummy_method(), '')"
    );

    let local = CallableRef::new("__main__", "square");
    let record = equal(local, Arguments::new().arg(3), 9);
    assert_eq!(record_to_assertion(&record).unwrap(), "self.assertEqual(square(3), 9)");
}

#[test]
fn test_unrenderable_argument_fails_record() {
    let no_repr = Value::object(Instance::new("test_main", "NoRepr"));
    let record = equal(dummy(), Arguments::new().arg(no_repr.clone()), Value::None);
    assert!(matches!(record_to_assertion(&record), Err(SkipReason::Unrenderable(_))));

    let record = equal(dummy(), Arguments::new().kwarg("x", no_repr), Value::None);
    assert!(record_to_assertion(&record).is_err());
}

#[test]
fn test_pending_record_is_skipped() {
    let record = InvocationRecord::pending(dummy(), Arguments::new(), Outcome::Returned(Value::None));
    assert_eq!(record_to_assertion(&record), Err(SkipReason::Pending));
}

#[test]
fn test_generate_concrete_suite() {
    let records = vec![
        equal(dummy(), Arguments::new().arg(1).arg(2).arg(3), 42),
        InvocationRecord::raised(dummy(), Arguments::new().arg(-1), RaisedException::builtin("ValueError")),
    ];
    assert_eq!(
        SuiteGenerator::new().generate(&records),
        "\
import unittest

import test_main

class Tester(unittest.TestCase):
    def test_all(self):
        self.assertEqual(test_main.dummy(1, 2, 3), 42)
        with self.assertRaises(ValueError):
            test_main.dummy(-1)
"
    );
}

#[test]
fn test_generate_without_imports() {
    let records = vec![equal(CallableRef::new("__main__", "square"), Arguments::new().arg(2), 4)];
    assert_eq!(
        SuiteGenerator::new().generate(&records),
        "\
import unittest

class Tester(unittest.TestCase):
    def test_all(self):
        self.assertEqual(square(2), 4)
"
    );
}

#[test]
fn test_empty_and_unrenderable_suites_are_empty() {
    assert_eq!(SuiteGenerator::new().generate(&[]), "");

    let records = vec![equal(
        dummy(),
        Arguments::new().arg(Value::object(Instance::new("test_main", "NoRepr"))),
        Value::None,
    )];
    assert_eq!(SuiteGenerator::new().generate(&records), "");
}

#[test]
fn test_skipped_record_does_not_contribute_imports() {
    let records = vec![
        equal(CallableRef::new("__main__", "square"), Arguments::new().arg(2), 4),
        equal(
            CallableRef::new("othermod", "f"),
            Arguments::new().arg(Value::object(Instance::new("othermod", "Opaque"))),
            1,
        ),
    ];
    let source = SuiteGenerator::new().generate(&records);
    assert!(!source.contains("import othermod"));
    assert!(source.contains("self.assertEqual(square(2), 4)"));
}

#[test]
fn test_generate_imports() {
    let records = vec![
        equal(dummy(), Arguments::new().arg(1), 1),
        equal(fib(), Arguments::new().arg(2), 1),
        InvocationRecord::raised(fib(), Arguments::new().arg(-1), RaisedException::new("errors", "FibonacciError")),
        equal(dummy(), Arguments::new().arg(5), 5),
        InvocationRecord::raised(dummy(), Arguments::new(), RaisedException::builtin("ValueError")),
    ];
    assert_eq!(generate_imports(&records), vec!["errors", "mylib", "test_main"]);
}

#[test]
fn test_object_values_contribute_imports() {
    let point = Value::object(Instance::new("geometry", "Point").with_repr("geometry.Point(1, 2)"));
    let records = vec![equal(CallableRef::new("__main__", "norm"), Arguments::new().arg(point), 5)];
    assert_eq!(generate_imports(&records), vec!["geometry"]);
}

#[test]
fn test_custom_layout() {
    let generator = SuiteGenerator::with_config(SuiteConfig {
        class_name: "Regression".to_string(),
        method_name: "test_recorded".to_string(),
        indent: 4,
        output: None,
    });
    let records = vec![InvocationRecord::raised(
        fib(),
        Arguments::new().arg(-1),
        RaisedException::new("mylib", "FibonacciError"),
    )];
    let source = generator.generate(&records);
    assert!(source.contains("class Regression(unittest.TestCase):\n    def test_recorded(self):\n"));
    assert!(source.ends_with("    with self.assertRaises(mylib.FibonacciError):\n        mylib.fib(-1)\n"));
}

#[test]
fn test_generation_is_idempotent() {
    let records = vec![
        equal(fib(), Arguments::new().arg(10), 55),
        equal(dummy(), Arguments::new().kwarg("s", "x"), "x"),
    ];
    let generator = SuiteGenerator::new();
    assert_eq!(generator.generate(&records), generator.generate(&records));
}

#[test]
fn test_write_to_writer_and_file() {
    let records = vec![equal(fib(), Arguments::new().arg(1), 1)];
    let generator = SuiteGenerator::new();

    let mut printed: Vec<u8> = Vec::new();
    assert!(generator.write(&records, SuiteSink::Writer(&mut printed)).unwrap());
    let printed = String::from_utf8(printed).unwrap();
    assert_eq!(printed, format!("{}\n", generator.generate(&records)));

    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("test_suite.py");
    std::fs::write(&path, "stale content that is much longer than anything generated here ......").unwrap();
    assert!(generator.write(&records, SuiteSink::Path(path.clone())).unwrap());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), generator.generate(&records));
}

#[test]
fn test_write_nothing_for_empty_suite() {
    let mut printed: Vec<u8> = Vec::new();
    assert!(!SuiteGenerator::new().write(&[], SuiteSink::Writer(&mut printed)).unwrap());
    assert!(printed.is_empty());
}
