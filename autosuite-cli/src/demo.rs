//! Built-in demo library available in the shell
//!
//! `mylib` is registered with a loader so `:reload mylib` exercises the
//! rebind path, and `square` lives in `__main__` like a function typed at
//! the prompt.

use autosuite_core::prelude::*;

/// Register the demo modules
pub fn register(registry: &ModuleRegistry) -> Result<()> {
    registry.register_module("mylib", |m| {
        m.function("fib", fib);
        m.function("reverse", reverse);
        m.function("mean", mean);
        m.function("make_point", make_point);
        m.function("make_blob", |_| Ok(Value::object(Instance::new("mylib", "Blob"))));
    })?;
    registry.define_main("square", |args| match args.lookup(0, "n") {
        Some(Value::Int(n)) => n
            .checked_mul(*n)
            .map(Value::Int)
            .ok_or_else(|| RaisedException::builtin("OverflowError").with_message("result too large")),
        Some(Value::Float(x)) => Ok(Value::Float(x * x)),
        _ => Err(type_error("square() expects a number")),
    })?;
    Ok(())
}

fn type_error(message: &str) -> RaisedException {
    RaisedException::builtin("TypeError").with_message(message)
}

fn fib(args: &Arguments) -> CallResult {
    let n = match args.lookup(0, "n") {
        Some(Value::Int(n)) => *n,
        _ => return Err(type_error("fib() expects an int")),
    };
    if n < 0 {
        return Err(RaisedException::new("mylib", "FibonacciError")
            .with_message(format!("negative input: {}", n))
            .with_frame(Frame::new("mylib.py", 4, "fib")));
    }
    let (mut a, mut b) = (0i64, 1i64);
    for _ in 0..n {
        let next = a.checked_add(b).ok_or_else(|| {
            RaisedException::builtin("OverflowError").with_message("result too large")
        })?;
        a = b;
        b = next;
    }
    Ok(Value::Int(a))
}

fn reverse(args: &Arguments) -> CallResult {
    match args.lookup(0, "items") {
        Some(Value::Str(s)) => Ok(Value::Str(s.chars().rev().collect())),
        Some(Value::List(items)) => Ok(Value::List(items.iter().rev().cloned().collect())),
        Some(Value::Tuple(items)) => Ok(Value::Tuple(items.iter().rev().cloned().collect())),
        _ => Err(type_error("reverse() expects a str, list or tuple")),
    }
}

fn mean(args: &Arguments) -> CallResult {
    let items = match args.lookup(0, "values") {
        Some(Value::List(items)) | Some(Value::Tuple(items)) => items,
        _ => return Err(type_error("mean() expects a list of numbers")),
    };
    if items.is_empty() {
        return Err(RaisedException::builtin("ZeroDivisionError").with_message("division by zero")
            .with_frame(Frame::new("mylib.py", 18, "mean")));
    }
    let mut total = 0.0;
    for item in items {
        total += match item {
            Value::Int(n) => *n as f64,
            Value::Float(x) => *x,
            _ => return Err(type_error("mean() expects a list of numbers")),
        };
    }
    Ok(Value::Float(total / items.len() as f64))
}

fn make_point(args: &Arguments) -> CallResult {
    match (args.lookup(0, "x"), args.lookup(1, "y")) {
        (Some(x), Some(y)) => Ok(Value::object(
            Instance::new("mylib", "Point").with_repr(format!("mylib.Point({}, {})", x.repr(), y.repr())),
        )),
        _ => Err(type_error("make_point() missing required arguments: 'x' and 'y'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo() -> ModuleRegistry {
        let registry = ModuleRegistry::new();
        register(&registry).unwrap();
        registry
    }

    #[test]
    fn test_demo_functions() {
        let registry = demo();
        let call = |name: &str, args: Arguments| registry.resolve(name).unwrap().invoke(&args);

        assert_eq!(call("fib", Arguments::new().arg(10)).unwrap(), Value::Int(55));
        assert_eq!(call("mylib.reverse", Arguments::new().arg("abc")).unwrap(), Value::from("cba"));
        assert_eq!(call("mean", Arguments::new().arg(vec![1, 2])).unwrap(), Value::Float(1.5));
        assert_eq!(call("square", Arguments::new().kwarg("n", 4)).unwrap(), Value::Int(16));
        assert_eq!(
            call("make_point", Arguments::new().arg(1).arg(2)).unwrap().repr(),
            "mylib.Point(1, 2)"
        );
    }

    #[test]
    fn test_demo_errors() {
        let registry = demo();
        let err = registry.resolve("fib").unwrap().invoke(&Arguments::new().arg(-1)).unwrap_err();
        assert_eq!(err.type_name(), "mylib.FibonacciError");

        let err = registry
            .resolve("mean")
            .unwrap()
            .invoke(&Arguments::new().arg(Value::List(Vec::new())))
            .unwrap_err();
        assert_eq!(err.type_name(), "ZeroDivisionError");

        let blob = registry.resolve("make_blob").unwrap().invoke(&Arguments::new()).unwrap();
        assert!(render_literal(&blob).is_err());
    }
}
