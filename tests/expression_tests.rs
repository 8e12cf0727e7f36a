use civet::{Interpreter, Scalar};
use pretty_assertions::assert_eq;

fn eval(src: &str) -> i64 {
    let mut interp = Interpreter::default();
    interp
        .run(src, "test.c")
        .expect("evaluation failed")
        .expect("expected a scalar result")
        .as_int()
}

fn eval_fp(src: &str) -> f64 {
    let mut interp = Interpreter::default();
    interp
        .run(src, "test.c")
        .expect("evaluation failed")
        .expect("expected a scalar result")
        .as_fp()
}

fn eval_err(src: &str) -> String {
    let mut interp = Interpreter::default();
    interp.run(src, "test.c").unwrap_err().to_string()
}

#[test]
fn multiplication_binds_tighter_than_addition() {
    assert_eq!(eval("2 + 3 * 4;"), 14);
    assert_eq!(eval("(2 + 3) * 4;"), 20);
    assert_eq!(eval("2 * 3 + 4 * 5;"), 26);
}

#[test]
fn division_and_modulus() {
    assert_eq!(eval("7 / 2;"), 3);
    assert_eq!(eval("7 % 3;"), 1);
    assert_eq!(eval("100 / 10 / 5;"), 2);
}

#[test]
fn unary_operators() {
    assert_eq!(eval("-3;"), -3);
    assert_eq!(eval("-3 + 10;"), 7);
    assert_eq!(eval("!0;"), 1);
    assert_eq!(eval("!5;"), 0);
    assert_eq!(eval("~0;"), -1);
    assert_eq!(eval("-16 >> 2;"), -4);
}

#[test]
fn comparisons_yield_zero_or_one() {
    assert_eq!(eval("1 < 2;"), 1);
    assert_eq!(eval("2 <= 1;"), 0);
    assert_eq!(eval("3 == 3;"), 1);
    assert_eq!(eval("3 != 3;"), 0);
    assert_eq!(eval("1 < 2 == 1;"), 1);
}

#[test]
fn bitwise_operators() {
    assert_eq!(eval("6 & 3;"), 2);
    assert_eq!(eval("6 | 1;"), 7);
    assert_eq!(eval("6 ^ 3;"), 5);
    assert_eq!(eval("1 << 4;"), 16);
}

#[test]
fn assignment_chains_reduce_right_to_left() {
    assert_eq!(eval("int a; int b; int c; c = 5; a = b = c; a;"), 5);
    assert_eq!(eval("int a; int b; a = b = 3; b;"), 3);
}

#[test]
fn compound_assignment() {
    assert_eq!(eval("int x; x = 10; x += 5; x;"), 15);
    assert_eq!(eval("int x; x = 10; x -= 3; x;"), 7);
    assert_eq!(eval("int x; x = 15; x <<= 2; x;"), 60);
    assert_eq!(eval("int x; x = 60; x %= 7; x;"), 4);
    assert_eq!(eval("int x; x = 6; x &= 3; x;"), 2);
}

#[test]
fn increment_and_decrement() {
    assert_eq!(eval("int i; i = 5; i++;"), 5);
    assert_eq!(eval("int i; i = 5; i++; i;"), 6);
    assert_eq!(eval("int i; i = 5; ++i;"), 6);
    assert_eq!(eval("int i; i = 5; i--; i;"), 4);
    assert_eq!(eval("int i; i = 5; --i;"), 4);
}

#[test]
fn ternary_selects_by_condition() {
    assert_eq!(eval("1 ? 2 : 3;"), 2);
    assert_eq!(eval("0 ? 2 : 3;"), 3);
    assert_eq!(eval("(0 ? 2 : 3) + (1 ? 10 : 20);"), 13);
    assert_eq!(eval("int x; x = 5; x > 3 ? x : 0;"), 5);
}

#[test]
fn character_constants_are_bytes() {
    assert_eq!(eval("'A';"), 65);
    assert_eq!(eval("'A' + 1;"), 66);
    assert_eq!(eval("'\\n';"), 10);
}

#[test]
fn integer_arithmetic_wraps_at_slot_width() {
    assert_eq!(eval("2147483647 + 1;"), -2147483648);
}

#[test]
fn wide_literals_keep_long_width() {
    let mut interp = Interpreter::default();
    let result = interp
        .run("4294967296;", "test.c")
        .expect("evaluation failed")
        .expect("expected a scalar result");
    assert_eq!(result, Scalar::Long(4294967296));
}

#[test]
fn float_arithmetic() {
    assert_eq!(eval_fp("1 + 2.5;"), 3.5);
    assert_eq!(eval_fp("7.0 / 2;"), 3.5);
    assert_eq!(eval("2.5 == 2.5;"), 1);
    assert_eq!(eval("2.5 < 2.0;"), 0);
    assert_eq!(eval_fp("double d; d = 1.5; d *= 2.0; d;"), 3.0);
}

#[test]
fn float_division_by_zero_is_infinite() {
    assert!(eval_fp("1.0 / 0.0;").is_infinite());
}

#[test]
fn casts_convert_between_kinds() {
    assert_eq!(eval_fp("(double)3;"), 3.0);
    assert_eq!(eval("(int)2.9;"), 2);
    assert_eq!(eval("(char)321;"), 65);
    assert_eq!(eval("(long)7 + 1;"), 8);
}

#[test]
fn sizeof_reports_compact_sizes() {
    assert_eq!(eval("sizeof(char);"), 1);
    assert_eq!(eval("sizeof(short);"), 2);
    assert_eq!(eval("sizeof(int);"), 4);
    assert_eq!(eval("sizeof(long);"), 8);
    assert_eq!(eval("sizeof(double);"), 8);
    assert_eq!(eval("sizeof(int *);"), 8);
    assert_eq!(eval("sizeof(char *);"), 8);
}

#[test]
fn sizeof_array_scales_by_element() {
    assert_eq!(eval("int a[3]; sizeof(a);"), 12);
    assert_eq!(eval("char c[10]; sizeof(c);"), 10);
}

#[test]
fn sizeof_pointer_is_independent_of_pointee() {
    assert_eq!(
        eval("struct big { long a; long b; long c; }; struct big *p; sizeof(p);"),
        8
    );
}

#[test]
fn division_by_zero_is_an_error() {
    assert!(eval_err("1 / 0;").contains("division by zero"));
    assert!(eval_err("5 % 0;").contains("division by zero"));
    assert!(eval_err("int x; x = 3; x /= 0;").contains("division by zero"));
}

#[test]
fn assigning_to_a_literal_is_an_error() {
    assert!(eval_err("3 = 4;").contains("can't assign to this"));
}

#[test]
fn unclosed_brackets_are_an_error() {
    assert!(eval_err("(1 + 2;").contains("brackets not closed"));
}

#[test]
fn undefined_names_report_their_position() {
    let message = eval_err("int x;\nx = y;");
    assert!(message.contains("'y' is undefined"));
    assert!(message.starts_with("test.c:2:"));
}

#[test]
fn evaluate_expression_entry_point() {
    let mut interp = Interpreter::default();
    let result = interp
        .evaluate_expression("2 * (3 + 4)", "host")
        .expect("evaluation failed");
    assert_eq!(result, Some(Scalar::Int(14)));
    assert_eq!(
        interp
            .evaluate_integer_expression("1 << 10", "host")
            .expect("evaluation failed"),
        1024
    );
}

#[test]
fn empty_expression_is_an_error() {
    let mut interp = Interpreter::default();
    let err = interp.evaluate_expression("", "host").unwrap_err();
    assert!(err.to_string().contains("expression expected"));
}
