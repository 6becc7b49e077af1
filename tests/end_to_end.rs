//! End-to-end pipeline tests covering the scenarios pascalc is expected to
//! handle, asserting on substrings/subsequences of the emitted instruction
//! list rather than full golden-file equality (label numbering is
//! deterministic but not pinned to an exact sequence).

fn lines_contain_in_order(asm: &str, needles: &[&str]) -> bool {
    let mut it = asm.lines();
    for needle in needles {
        loop {
            match it.next() {
                Some(line) if line == *needle => break,
                Some(_) => continue,
                None => return false,
            }
        }
    }
    true
}

#[test]
fn hello_world() {
    let asm = pascalc::compile("program H; begin writeln('hello') end.").unwrap();
    assert!(asm.starts_with("START\n"));
    assert!(asm.contains("PUSHS \"hello\""));
    assert!(asm.contains("WRITES"));
    assert!(asm.contains("WRITELN"));
    assert!(asm.contains("STOP"));
}

#[test]
fn integer_arithmetic_and_output() {
    let asm = pascalc::compile("program A; var x: integer; begin x := 2+3*4; writeln(x) end.").unwrap();
    assert!(lines_contain_in_order(
        &asm,
        &["PUSHI 2", "PUSHI 3", "PUSHI 4", "MUL", "ADD", "STOREG 0", "PUSHG 0", "WRITEI", "WRITELN"]
    ));
}

#[test]
fn array_bounds_check() {
    let asm =
        pascalc::compile("program B; const n=5; var a: array[1..n] of integer; begin a[1]:=7; writeln(a[1]) end.")
            .unwrap();
    assert!(asm.contains("ALLOCN"));
    assert!(lines_contain_in_order(&asm, &["PUSHI 1", "SUB", "CHECK 0,4"]));
}

#[test]
fn for_loop_descending() {
    let asm = pascalc::compile("program C; var i: integer; begin for i:=10 downto 1 do writeln(i) end.").unwrap();
    assert!(asm.contains("SUPEQ"));
    assert!(asm.contains("SUB"));
}

#[test]
fn undeclared_variable_fails_and_produces_no_output() {
    let result = pascalc::compile("program D; begin x := 1 end.");
    assert!(result.is_err());
}

#[test]
fn function_with_return() {
    let asm = pascalc::compile(
        "program E; function f(x:integer):integer; begin f := x+1 end; var y:integer; begin y := f(41); writeln(y) end.",
    )
    .unwrap();
    assert!(lines_contain_in_order(&asm, &["PUSHI 0", "PUSHI 41", "PUSHA F", "CALL"]));
    assert!(asm.contains("F:"));
    let f_pos = asm.find("F:").unwrap();
    let tail = &asm[f_pos..];
    assert!(tail.contains("RETURN"));
}

#[test]
fn case_insensitivity_is_irrelevant_to_output() {
    let lower = pascalc::compile("program p; var x: integer; begin x := 1; writeln(x) end.").unwrap();
    let upper = pascalc::compile("PROGRAM P; VAR X: INTEGER; BEGIN X := 1; WRITELN(X) END.").unwrap();
    assert_eq!(lower, upper);
}
