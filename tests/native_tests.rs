use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

use civet::{tokenize, Cursor, FuncDef, Interpreter, StatementRunner, Value};
use pretty_assertions::assert_eq;

fn native_abs(interp: &mut Interpreter, ret: &Value, args: &[Value]) -> civet::Result<()> {
    let n = interp.read_scalar(&args[0])?.as_int();
    interp.write_int(ret, n.abs())
}

fn native_max(interp: &mut Interpreter, ret: &Value, args: &[Value]) -> civet::Result<()> {
    let a = interp.read_scalar(&args[0])?.as_int();
    let b = interp.read_scalar(&args[1])?.as_int();
    interp.write_int(ret, a.max(b))
}

fn native_half(interp: &mut Interpreter, ret: &Value, args: &[Value]) -> civet::Result<()> {
    let x = interp.read_scalar(&args[0])?.as_fp();
    interp.write_fp(ret, x / 2.0)
}

fn native_clobber(interp: &mut Interpreter, ret: &Value, args: &[Value]) -> civet::Result<()> {
    interp.write_int(&args[0], 0)?;
    interp.write_int(ret, 0)
}

fn native_distinct(interp: &mut Interpreter, ret: &Value, args: &[Value]) -> civet::Result<()> {
    let fresh = interp.value_addr(&args[0]) != interp.value_addr(&args[1]);
    interp.write_int(ret, fresh as i64)
}

fn run_int(interp: &mut Interpreter, src: &str) -> i64 {
    interp
        .run(src, "test.c")
        .expect("evaluation failed")
        .expect("expected a scalar result")
        .as_int()
}

#[test]
fn natives_read_arguments_and_fill_the_return_slot() {
    let mut interp = Interpreter::default();
    interp
        .register_native("int abs(int n)", native_abs)
        .expect("registration failed");
    assert_eq!(run_int(&mut interp, "int x; x = 7 - 20; abs(x);"), 13);
    // the argument slot is a copy; the caller's variable is untouched
    assert_eq!(run_int(&mut interp, "x;"), -13);
}

#[test]
fn natives_take_multiple_arguments() {
    let mut interp = Interpreter::default();
    interp
        .register_native("int max(int a, int b)", native_max)
        .expect("registration failed");
    assert_eq!(run_int(&mut interp, "max(3, 9);"), 9);
    assert_eq!(run_int(&mut interp, "max(3 * 4, 9);"), 12);
}

#[test]
fn float_natives() {
    let mut interp = Interpreter::default();
    interp
        .register_native("double half(double x)", native_half)
        .expect("registration failed");
    let result = interp
        .run("half(7.0);", "test.c")
        .expect("evaluation failed")
        .expect("expected a scalar result");
    assert_eq!(result.as_fp(), 3.5);
}

#[test]
fn arguments_bind_by_value() {
    let mut interp = Interpreter::default();
    interp
        .register_native("int clobber(int n)", native_clobber)
        .expect("registration failed");
    assert_eq!(run_int(&mut interp, "int x; x = 5; clobber(x); x;"), 5);
}

#[test]
fn each_argument_gets_a_fresh_stack_slot() {
    let mut interp = Interpreter::default();
    interp
        .register_native("int distinct(int a, int b)", native_distinct)
        .expect("registration failed");
    assert_eq!(run_int(&mut interp, "int x; x = 4; distinct(x, x);"), 1);
}

#[test]
fn argument_counts_are_checked() {
    let mut interp = Interpreter::default();
    interp
        .register_native("int abs(int n)", native_abs)
        .expect("registration failed");
    let err = interp.run("abs(1, 2);", "test.c").unwrap_err();
    assert!(err.to_string().contains("too many arguments to abs()"));
    let err = interp.run("abs();", "test.c").unwrap_err();
    assert!(err.to_string().contains("too few arguments to abs()"));
    let err = interp.run("abs(1 2);", "test.c").unwrap_err();
    assert!(err.to_string().contains("comma expected"));
}

#[test]
fn varargs_accept_extra_arguments() {
    let mut interp = Interpreter::default();
    interp
        .register_native("int first(int a, ...)", native_abs)
        .expect("registration failed");
    assert_eq!(run_int(&mut interp, "first(0 - 5, 6, 7);"), 5);
}

static AND_CALLS: AtomicUsize = AtomicUsize::new(0);

fn bump_and(interp: &mut Interpreter, ret: &Value, _args: &[Value]) -> civet::Result<()> {
    AND_CALLS.fetch_add(1, Ordering::SeqCst);
    interp.write_int(ret, 1)
}

#[test]
fn logical_and_skips_the_rhs_when_the_lhs_is_false() {
    let mut interp = Interpreter::default();
    interp
        .register_native("int bump(void)", bump_and)
        .expect("registration failed");
    assert_eq!(run_int(&mut interp, "0 && bump();"), 0);
    assert_eq!(AND_CALLS.load(Ordering::SeqCst), 0);
    assert_eq!(run_int(&mut interp, "1 && bump();"), 1);
    assert_eq!(AND_CALLS.load(Ordering::SeqCst), 1);
}

static OR_CALLS: AtomicUsize = AtomicUsize::new(0);

fn bump_or(interp: &mut Interpreter, ret: &Value, _args: &[Value]) -> civet::Result<()> {
    OR_CALLS.fetch_add(1, Ordering::SeqCst);
    interp.write_int(ret, 1)
}

#[test]
fn logical_or_skips_the_rhs_when_the_lhs_is_true() {
    let mut interp = Interpreter::default();
    interp
        .register_native("int bump(void)", bump_or)
        .expect("registration failed");
    assert_eq!(run_int(&mut interp, "1 || bump();"), 1);
    assert_eq!(OR_CALLS.load(Ordering::SeqCst), 0);
    assert_eq!(run_int(&mut interp, "0 || bump();"), 1);
    assert_eq!(OR_CALLS.load(Ordering::SeqCst), 1);
}

#[test]
fn calling_an_unknown_name_is_an_error() {
    let mut interp = Interpreter::default();
    let err = interp.run("foo(1);", "test.c").unwrap_err();
    assert!(err.to_string().contains("'foo' is undefined"));
}

#[test]
fn calling_a_variable_is_an_error() {
    let mut interp = Interpreter::default();
    let err = interp.run("int x; x(1);", "test.c").unwrap_err();
    assert!(err.to_string().contains("is not a function"));
}

#[test]
fn redefining_a_native_is_an_error() {
    let mut interp = Interpreter::default();
    interp
        .register_native("int abs(int n)", native_abs)
        .expect("registration failed");
    let err = interp.register_native("int abs(int n)", native_abs).unwrap_err();
    assert!(err.to_string().contains("'abs' is already defined"));
}

/// Runs every interpreted body as the single expression `n + n`, standing
/// in for a full statement executor.
struct Doubler;

impl StatementRunner for Doubler {
    fn run_body(
        &self,
        interp: &mut Interpreter,
        _body: &mut Cursor,
        ret: &Value,
    ) -> civet::Result<()> {
        let n = interp.evaluate_integer_expression("n + n", "twice-body.c")?;
        interp.write_int(ret, n)
    }
}

fn define_twice(interp: &mut Interpreter) {
    let int_t = interp.types().int_t;
    let name = interp.interner_mut().intern("twice");
    let param = interp.interner_mut().intern("n");
    let buffer = tokenize("0", "twice.c", interp.interner_mut()).expect("scan failed");
    let mut c = Cursor::new(Rc::new(buffer));
    let def = FuncDef {
        return_type: int_t,
        params: vec![(param, int_t)],
        varargs: false,
        native: None,
        body: Some(c.clone()),
    };
    interp.define_function(&mut c, name, def).expect("definition failed");
}

#[test]
fn interpreted_bodies_run_through_the_statement_runner() {
    let mut interp = Interpreter::default();
    interp.set_statement_runner(Rc::new(Doubler));
    define_twice(&mut interp);
    assert_eq!(run_int(&mut interp, "twice(21);"), 42);
    // parameters resolve in the callee scope, not the caller's globals
    assert_eq!(run_int(&mut interp, "int n; n = 1; twice(8) + n;"), 17);
}

/// Runs every interpreted body as a counter bumping a function-local
/// static.
struct Tally;

impl StatementRunner for Tally {
    fn run_body(
        &self,
        interp: &mut Interpreter,
        _body: &mut Cursor,
        ret: &Value,
    ) -> civet::Result<()> {
        let n = interp
            .run("static int s; s = s + 1; s;", "tally-body.c")?
            .expect("counter body yields a scalar")
            .as_int();
        interp.write_int(ret, n)
    }
}

fn define_tally(interp: &mut Interpreter) {
    let int_t = interp.types().int_t;
    let name = interp.interner_mut().intern("tally");
    let buffer = tokenize("0", "tally.c", interp.interner_mut()).expect("scan failed");
    let mut c = Cursor::new(Rc::new(buffer));
    let def = FuncDef {
        return_type: int_t,
        params: Vec::new(),
        varargs: false,
        native: None,
        body: Some(c.clone()),
    };
    interp.define_function(&mut c, name, def).expect("definition failed");
}

#[test]
fn function_local_statics_persist_across_calls() {
    let mut interp = Interpreter::default();
    interp.set_statement_runner(Rc::new(Tally));
    define_tally(&mut interp);
    assert_eq!(run_int(&mut interp, "tally();"), 1);
    assert_eq!(run_int(&mut interp, "tally(); tally();"), 3);
    // the static is only nameable inside the function that declared it
    let err = interp.run("s;", "test.c").unwrap_err();
    assert!(err.to_string().contains("'s' is undefined"));
}

#[test]
fn bodies_without_a_runner_are_an_error() {
    let mut interp = Interpreter::default();
    define_twice(&mut interp);
    let err = interp.run("twice(21);", "test.c").unwrap_err();
    assert!(err
        .to_string()
        .contains("can't call 'twice': no statement runner installed"));
}
