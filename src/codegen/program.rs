//! Top-level code-generation entry point, tying the symbol-population pass
//! to the emission walk.

use crate::ast::Program;
use crate::error::CompileError;

use super::control_flow::emit_stmt;
use super::globals::{populate_locals, populate_top_level};
use super::state::CodeGen;

pub fn generate(program: &Program) -> Result<String, CompileError> {
    let mut cg = CodeGen::new();
    let mut alloc_instrs = Vec::new();
    populate_top_level(&mut cg, &program.block, &mut alloc_instrs)?;

    cg.emit("START");
    for instr in alloc_instrs {
        cg.emit(instr);
    }
    for stmt in &program.block.body {
        emit_stmt(&mut cg, stmt)?;
    }
    cg.emit("STOP");

    for sub in &program.block.subroutines {
        populate_locals(&mut cg, sub)?;
        let info = cg
            .subroutines
            .get(&sub.name)
            .cloned()
            .ok_or_else(|| CompileError::internal(format!("subroutine '{}' was not registered", sub.name)))?;
        cg.emit_label(&info.label);
        cg.current_function = sub.return_type.as_ref().map(|_| sub.name.clone());
        for stmt in &sub.block.body {
            emit_stmt(&mut cg, stmt)?;
        }
        cg.current_function = None;
        cg.emit("RETURN");
    }

    Ok(cg.output())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;
    use crate::parser::parse;
    use crate::sema::analyze;

    fn compile_ok(src: &str) -> String {
        let program = parse(lex(src).unwrap()).unwrap();
        analyze(&program).unwrap();
        generate(&program).unwrap()
    }

    #[test]
    fn program_is_bracketed_by_start_and_stop() {
        let asm = compile_ok("program p; begin writeln('hi') end.");
        assert!(asm.starts_with("START\n"));
        assert!(asm.contains("STOP"));
    }

    #[test]
    fn array_access_emits_check_before_loadn() {
        let asm = compile_ok(
            r#"program p;
            var a: array[1..10] of integer;
            var x: integer;
            begin
              x := a[5]
            end."#,
        );
        let lines: Vec<&str> = asm.lines().collect();
        let loadn = lines.iter().position(|l| *l == "LOADN").unwrap();
        assert!(lines[loadn - 1].starts_with("CHECK 0,9"));
    }

    #[test]
    fn for_downto_uses_supeq_and_sub() {
        let asm = compile_ok(
            r#"program p;
            var i: integer;
            begin
              for i := 10 downto 1 do
                writeln(i)
            end."#,
        );
        assert!(asm.contains("SUPEQ"));
        assert!(asm.contains("SUB"));
        assert!(!asm.contains("INFEQ"));
    }

    #[test]
    fn for_to_uses_infeq_and_add() {
        let asm = compile_ok(
            r#"program p;
            var i: integer;
            begin
              for i := 1 to 10 do
                writeln(i)
            end."#,
        );
        assert!(asm.contains("INFEQ"));
    }

    #[test]
    fn function_assigning_its_own_name_leaves_value_on_stack() {
        let asm = compile_ok(
            r#"program p;
            function square(n: integer): integer;
            begin
              square := n * n
            end;
            var x: integer;
            begin
              x := square(3)
            end."#,
        );
        // assigning to the function's own name must not emit a STORE for it
        assert!(asm.contains("MUL"));
        assert!(asm.contains("RETURN"));
    }

    #[test]
    fn case_insensitivity_produces_identical_assembly() {
        let lower = compile_ok("program p; var x: integer; begin x := 1; writeln(x) end.");
        let upper = compile_ok("PROGRAM P; VAR X: INTEGER; BEGIN X := 1; WRITELN(X) END.");
        assert_eq!(lower, upper);
    }

    #[test]
    fn boolean_and_char_casts_are_pass_through_with_no_conversion_opcode() {
        let asm = compile_ok(
            r#"program p;
            var x: integer;
            var b: boolean;
            var c: char;
            begin
              x := 65;
              b := boolean(x);
              c := char(x)
            end."#,
        );
        assert!(!asm.contains("ITOF"));
        assert!(!asm.contains("FTOI"));
    }

    #[test]
    fn in_operator_lowers_to_ored_equality_chain() {
        let asm = compile_ok(
            r#"program p;
            var x: integer;
            var b: boolean;
            begin
              b := x in [1, 2, 3]
            end."#,
        );
        assert_eq!(asm.matches("EQUAL").count(), 3);
        assert_eq!(asm.matches("OR").count(), 2);
    }
}
