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
fn declarations_with_initializers() {
    assert_eq!(eval("int a = 5; a;"), 5);
    assert_eq!(eval("int a = 5, b = a + 1; b;"), 6);
    assert_eq!(eval("int a, b, c; b = 2; a + b + c;"), 2);
    assert_eq!(eval("double d = 0.5; d == 0.5;"), 1);
}

#[test]
fn globals_survive_across_runs() {
    let mut interp = Interpreter::default();
    interp.run("int counter; counter = 41;", "a.c").expect("first run failed");
    let result = interp
        .run("counter + 1;", "b.c")
        .expect("second run failed")
        .expect("expected a scalar result");
    assert_eq!(result.as_int(), 42);
}

#[test]
fn redeclaring_a_name_is_an_error() {
    assert!(eval_err("int x;\nlong x;").contains("'x' is already defined"));
}

#[test]
fn array_elements_are_lvalues() {
    assert_eq!(eval("int a[3]; a[1] = 5; a[1];"), 5);
    assert_eq!(eval("int a[3]; a[0] = 1; a[2] = 3; a[0] + a[2];"), 4);
}

#[test]
fn array_index_must_be_an_integer() {
    let message = eval_err("int a[3]; struct s { int x; }; struct s v; a[v];");
    assert!(message.contains("array index must be an integer"));
}

#[test]
fn indexing_a_non_array_is_an_error() {
    assert!(eval_err("int x; x[0];").contains("is not an array"));
}

#[test]
fn pointers_and_element_arithmetic() {
    let src = "
        int a[3];
        a[0] = 10; a[1] = 20; a[2] = 30;
        int *p;
        p = a;
        *p;
    ";
    assert_eq!(eval(src), 10);
    assert_eq!(eval("int a[3]; a[2] = 7; int *p; p = a; p[2];"), 7);
    assert_eq!(eval("int a[3]; a[1] = 9; int *p; p = a; p = p + 1; *p;"), 9);
    assert_eq!(eval("int a[3]; &a[2] - &a[0];"), 2);
    assert_eq!(eval("int a[3]; a[1] = 4; int *p; p = &a[0]; p++; *p;"), 4);
}

#[test]
fn writes_through_pointers_hit_the_array() {
    assert_eq!(eval("int a[2]; int *p; p = a; *p = 6; a[0];"), 6);
    assert_eq!(eval("int a[2]; int *p; p = a; p[1] = 8; a[1];"), 8);
}

#[test]
fn null_pointer_checks() {
    assert_eq!(eval("int *q; q == 0;"), 1);
    assert_eq!(eval("int a[1]; int *q; q = a; q != 0;"), 1);
    assert!(eval_err("int *q; *q;").contains("NULL pointer dereference"));
    assert!(eval_err("int *q; q + 1;").contains("invalid use of a NULL pointer"));
}

#[test]
fn pointers_only_compare_against_literal_zero() {
    assert!(eval_err("int *q; q == 5;").contains("invalid operation"));
}

#[test]
fn struct_members_are_independent() {
    let src = "
        struct point { int x; int y; };
        struct point p;
        p.x = 3;
        p.y = 4;
        p.x + p.y;
    ";
    assert_eq!(eval(src), 7);
}

#[test]
fn struct_access_through_a_pointer() {
    let src = "
        struct point { int x; int y; };
        struct point p;
        p.y = 11;
        struct point *q;
        q = &p;
        q->y;
    ";
    assert_eq!(eval(src), 11);
}

#[test]
fn struct_assignment_copies_the_payload() {
    let src = "
        struct point { int x; int y; };
        struct point a;
        struct point b;
        a.x = 1; a.y = 2;
        b = a;
        b.x = 9;
        a.x * 10 + b.y;
    ";
    assert_eq!(eval(src), 12);
}

#[test]
fn struct_size_includes_padding() {
    assert_eq!(
        eval("struct rec { int a; char b; int c; }; struct rec r; sizeof(r);"),
        12
    );
}

#[test]
fn unknown_member_is_an_error() {
    let message = eval_err("struct point { int x; }; struct point p; p.z;");
    assert!(message.contains("doesn't have a member called 'z'"));
}

#[test]
fn member_access_on_a_number_is_an_error() {
    assert!(eval_err("int x; x.y;").contains("can't use"));
}

#[test]
fn union_members_share_storage() {
    let src = "
        union mix { int i; char c; };
        union mix v;
        v.i = 65;
        v.c;
    ";
    assert_eq!(eval(src), 65);
    assert_eq!(eval("union mix { int i; double d; }; union mix v; sizeof(v);"), 8);
}

#[test]
fn enum_constants_count_up_from_assignments() {
    let src = "enum color { RED, GREEN = 5, BLUE }; BLUE;";
    assert_eq!(eval(src), 6);
    assert_eq!(eval("enum color { RED, GREEN }; RED;"), 0);
}

#[test]
fn enum_constants_are_not_assignable() {
    let message = eval_err("enum color { RED }; RED = 3;");
    assert!(message.contains("can't assign to this"));
}

#[test]
fn typedef_names_act_as_types() {
    assert_eq!(eval("typedef int number; number n; n = 9; n;"), 9);
    assert_eq!(eval("typedef int *ip; int x; x = 3; ip p; p = &x; *p;"), 3);
    assert_eq!(eval("typedef long wide; sizeof(wide);"), 8);
}

#[test]
fn object_macros_expand_in_place() {
    assert_eq!(eval("#define TWO 2\nTWO + 1;"), 3);
    assert_eq!(eval("#define TEN 2 * 5\nTEN + 1;"), 11);
}

#[test]
fn function_macros_bind_evaluated_arguments() {
    assert_eq!(eval_fp("#define SQ(x) x * x\nSQ(3);"), 9.0);
    // arguments are values, not token pastes
    assert_eq!(eval_fp("#define SQ(x) x * x\nSQ(1 + 2);"), 9.0);
    assert_eq!(eval_fp("#define ADD(a, b) a + b\nADD(2, 3);"), 5.0);
}

#[test]
fn macro_argument_count_is_checked() {
    assert!(eval_err("#define ADD(a, b) a + b\nADD(2);").contains("too few arguments"));
    assert!(eval_err("#define SQ(x) x * x\nSQ(1, 2);").contains("too many arguments"));
    assert!(eval_err("#define SQ(x) x * x\nSQ + 1;").contains("macro arguments missing"));
}

#[test]
fn hash_if_selects_a_branch() {
    let on = "
        #define ON 1
        int x;
        #if ON
        x = 10;
        #else
        x = 20;
        #endif
        x;
    ";
    assert_eq!(eval(on), 10);
    let off = "
        #define OFF 0
        int x;
        #if OFF
        x = 10;
        #else
        x = 20;
        #endif
        x;
    ";
    assert_eq!(eval(off), 20);
}

#[test]
fn hash_ifdef_checks_definition() {
    let src = "
        #define FLAG 1
        int x;
        #ifdef FLAG
        x = 1;
        #endif
        #ifdef MISSING
        x = 99;
        #endif
        x;
    ";
    assert_eq!(eval(src), 1);
    let src = "
        int y;
        #ifndef MISSING
        y = 3;
        #endif
        y;
    ";
    assert_eq!(eval(src), 3);
}

#[test]
fn unbalanced_endif_is_an_error() {
    assert!(eval_err("#endif\n1;").contains("#endif without #if"));
}

#[test]
fn include_lines_are_ignored() {
    assert_eq!(eval("#include <stdio.h>\n1 + 1;"), 2);
}

#[test]
fn string_literals_decay_to_char_pointers() {
    assert_eq!(eval("char *s; s = \"Hi\"; s[0];"), 72);
    assert_eq!(eval("char *s; s = \"Hi\"; s[1];"), 105);
    assert_eq!(eval("char *s; s = \"Hi\"; *s;"), 72);
}

#[test]
fn identical_string_literals_share_storage() {
    let mut interp = Interpreter::default();
    let a = interp
        .run("\"same\";", "test.c")
        .expect("evaluation failed")
        .expect("expected a scalar result");
    let b = interp
        .run("\"same\";", "test.c")
        .expect("evaluation failed")
        .expect("expected a scalar result");
    match (a, b) {
        (Scalar::Pointer(x), Scalar::Pointer(y)) => assert_eq!(x, y),
        other => panic!("expected pointer results, got {:?}", other),
    }
}

#[test]
fn top_level_statics_behave_like_globals() {
    assert_eq!(eval("static int s; s = 1; s;"), 1);
}

#[test]
fn array_assignment_requires_identical_types() {
    assert_eq!(eval("int a[3]; int b[3]; a[0] = 7; b = a; b[0];"), 7);
    assert!(eval_err("int a[3]; int b[4]; b = a;").contains("can't assign"));
}

#[test]
fn statements_without_scalar_results_keep_the_last_scalar() {
    let src = "
        struct point { int x; int y; };
        struct point a;
        struct point b;
        a.x = 5;
        5 + 5;
        b = a;
    ";
    let mut interp = Interpreter::default();
    let result = interp
        .run(src, "test.c")
        .expect("evaluation failed")
        .expect("expected a scalar result");
    assert_eq!(result.as_int(), 10);
}

#[test]
fn tiny_arenas_run_out_of_memory() {
    let mut interp = Interpreter::new(128);
    let err = interp.run("int a[100];", "test.c").unwrap_err();
    assert_eq!(err.kind, civet::ErrorKind::Resource);
    assert!(err.to_string().contains("out of memory"));
}

#[test]
fn negative_array_sizes_are_rejected() {
    assert!(eval_err("int a[0 - 1];").contains("array size must not be negative"));
}
