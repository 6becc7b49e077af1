//! Statement and expression emission. Control structures (if/while/for/case)
//! each follow a label-pair scheme: a fresh numeric suffix ties together the
//! labels belonging to one construct.

use crate::ast::{BinOpKind, CaseArm, Expr, LValue, Stmt};
use crate::constexpr::{ConstValue, eval_const};
use crate::error::CompileError;
use crate::types::Type;

use super::state::CodeGen;
use super::types::field_offset;

pub fn emit_stmt(cg: &mut CodeGen, stmt: &Stmt) -> Result<(), CompileError> {
    match stmt {
        Stmt::Empty => Ok(()),
        Stmt::Compound(stmts) => {
            for s in stmts {
                emit_stmt(cg, s)?;
            }
            Ok(())
        }
        Stmt::Assign { lvalue, expr, line } => emit_assign(cg, lvalue, expr, *line),
        Stmt::Call { name, args, line } => emit_call_stmt(cg, name, args, *line),
        Stmt::If { cond, then_branch, else_branch, .. } => emit_if(cg, cond, then_branch, else_branch.as_deref()),
        Stmt::While { cond, body, .. } => emit_while(cg, cond, body),
        Stmt::Repeat { body, cond, .. } => emit_repeat(cg, body, cond),
        Stmt::For { var, start, end, downto, body, line } => emit_for(cg, var, start, end, *downto, body, *line),
        Stmt::Case { scrutinee, arms, line } => emit_case(cg, scrutinee, arms, *line),
        Stmt::With { body, .. } => emit_stmt(cg, body),
        Stmt::Goto { label, .. } => {
            cg.emit(format!("JUMP LBL{label}"));
            Ok(())
        }
        Stmt::Labeled { label, stmt, .. } => {
            cg.emit_label(format!("LBL{label}"));
            emit_stmt(cg, stmt)
        }
    }
}

fn emit_assign(cg: &mut CodeGen, lvalue: &LValue, expr: &Expr, line: usize) -> Result<(), CompileError> {
    if let LValue::Var { name, .. } = lvalue {
        if cg.current_function.as_deref() == Some(name.as_str()) {
            // Assignment to the enclosing function's own name: the RHS value
            // is left on the stack in the slot RETURN treats as the result.
            return emit_expr(cg, expr);
        }
    }
    emit_expr(cg, expr)?;
    emit_lvalue_store(cg, lvalue, line)
}

fn emit_lvalue_store(cg: &mut CodeGen, lvalue: &LValue, line: usize) -> Result<(), CompileError> {
    match lvalue {
        LValue::Var { name, .. } => {
            let (scope, off) = cg
                .resolve_scalar(name)
                .ok_or_else(|| CompileError::internal(format!("unknown variable '{name}' in assignment")))?;
            cg.emit(format!("STORE{scope} {off}"));
            Ok(())
        }
        LValue::Array { base, index, .. } => {
            let name = array_base_name(base, line)?;
            let (scope, info) = cg
                .resolve_array(&name)
                .ok_or_else(|| CompileError::internal(format!("unknown array '{name}' in assignment")))?;
            cg.emit(format!("PUSH{scope} {}", info.offset));
            emit_expr(cg, index)?;
            if info.low != 0 {
                cg.emit(format!("PUSHI {}", info.low));
                cg.emit("SUB");
            }
            cg.emit(format!("CHECK 0,{}", info.size - 1));
            cg.emit("STOREN");
            Ok(())
        }
        LValue::Field { base, field, .. } => {
            let (scope, off) = field_base_address(cg, base, line)?;
            let field_off = resolve_field_offset(cg, base, field, line)?;
            cg.emit(format!("STORE{scope} {}", off + field_off));
            Ok(())
        }
    }
}

fn array_base_name(lvalue: &LValue, line: usize) -> Result<String, CompileError> {
    match lvalue {
        LValue::Var { name, .. } => Ok(name.clone()),
        _ => Err(CompileError::internal(format!("line {line}: only a plain variable can be indexed as an array"))),
    }
}

fn field_base_address(cg: &mut CodeGen, base: &LValue, line: usize) -> Result<(&'static str, i64), CompileError> {
    match base {
        LValue::Var { name, .. } => cg
            .resolve_scalar(name)
            .ok_or_else(|| CompileError::internal(format!("unknown record '{name}' at line {line}"))),
        _ => Err(CompileError::internal(format!("line {line}: only a plain record variable supports field access"))),
    }
}

fn resolve_field_offset(cg: &CodeGen, base: &LValue, field: &str, line: usize) -> Result<i64, CompileError> {
    let name = match base {
        LValue::Var { name, .. } => name,
        _ => return Err(CompileError::internal(format!("line {line}: unsupported record base"))),
    };
    let key = cg
        .var_record_type_key
        .get(name)
        .ok_or_else(|| CompileError::internal(format!("'{name}' has no known record layout")))?;
    field_offset(&cg.type_field_order, key, field)
        .ok_or_else(|| CompileError::internal(format!("unknown field '{field}' on '{name}'")))
}

fn emit_if(cg: &mut CodeGen, cond: &Expr, then_branch: &Stmt, else_branch: Option<&Stmt>) -> Result<(), CompileError> {
    let idx = cg.fresh_label_index();
    let else_label = format!("L{idx}ELSE");
    let end_label = format!("L{idx}ENDIF");
    emit_expr(cg, cond)?;
    cg.emit(format!("JZ {else_label}"));
    emit_stmt(cg, then_branch)?;
    cg.emit(format!("JUMP {end_label}"));
    cg.emit_label(&else_label);
    if let Some(else_branch) = else_branch {
        emit_stmt(cg, else_branch)?;
    }
    cg.emit_label(&end_label);
    Ok(())
}

fn emit_while(cg: &mut CodeGen, cond: &Expr, body: &Stmt) -> Result<(), CompileError> {
    let idx = cg.fresh_label_index();
    let start_label = format!("L{idx}WHILE");
    let end_label = format!("L{idx}ENDWHILE");
    cg.emit_label(&start_label);
    emit_expr(cg, cond)?;
    cg.emit(format!("JZ {end_label}"));
    emit_stmt(cg, body)?;
    cg.emit(format!("JUMP {start_label}"));
    cg.emit_label(&end_label);
    Ok(())
}

fn emit_repeat(cg: &mut CodeGen, body: &[Stmt], cond: &Expr) -> Result<(), CompileError> {
    let idx = cg.fresh_label_index();
    let start_label = format!("L{idx}REPEAT");
    cg.emit_label(&start_label);
    for s in body {
        emit_stmt(cg, s)?;
    }
    emit_expr(cg, cond)?;
    cg.emit(format!("JZ {start_label}"));
    Ok(())
}

fn emit_for(
    cg: &mut CodeGen,
    var: &str,
    start: &Expr,
    end: &Expr,
    downto: bool,
    body: &Stmt,
    line: usize,
) -> Result<(), CompileError> {
    let (scope, off) =
        cg.resolve_scalar(var).ok_or_else(|| CompileError::internal(format!("unknown for-variable '{var}'")))?;
    emit_expr(cg, start)?;
    cg.emit(format!("STORE{scope} {off}"));

    let idx = cg.fresh_label_index();
    let start_label = format!("L{idx}FOR");
    let end_label = format!("L{idx}ENDFOR");
    cg.emit_label(&start_label);
    cg.emit(format!("PUSH{scope} {off}"));
    emit_expr(cg, end)?;
    cg.emit(if downto { "SUPEQ" } else { "INFEQ" });
    cg.emit(format!("JZ {end_label}"));
    emit_stmt(cg, body)?;
    let _ = line;
    cg.emit(format!("PUSH{scope} {off}"));
    cg.emit("PUSHI 1");
    cg.emit(if downto { "SUB" } else { "ADD" });
    cg.emit(format!("STORE{scope} {off}"));
    cg.emit(format!("JUMP {start_label}"));
    cg.emit_label(&end_label);
    Ok(())
}

fn emit_case(cg: &mut CodeGen, scrutinee: &Expr, arms: &[CaseArm], line: usize) -> Result<(), CompileError> {
    let _ = line;
    let idx = cg.fresh_label_index();
    let end_label = format!("L{idx}ENDCASE");
    let tmp = cg.allocate_global(&format!("__case_tmp_{idx}"));
    emit_expr(cg, scrutinee)?;
    cg.emit(format!("STOREG {tmp}"));

    for (arm_idx, arm) in arms.iter().enumerate() {
        let body_label = format!("L{idx}CASE{arm_idx}BODY");
        let next_label = format!("L{idx}CASE{arm_idx}NEXT");
        for (label_idx, label) in arm.labels.iter().enumerate() {
            let skip_label = format!("L{idx}CASE{arm_idx}OR{label_idx}");
            cg.emit(format!("PUSHG {tmp}"));
            emit_expr(cg, label)?;
            cg.emit("EQUAL");
            cg.emit(format!("JZ {skip_label}"));
            cg.emit(format!("JUMP {body_label}"));
            cg.emit_label(&skip_label);
        }
        cg.emit(format!("JUMP {next_label}"));
        cg.emit_label(&body_label);
        emit_stmt(cg, &arm.stmt)?;
        cg.emit(format!("JUMP {end_label}"));
        cg.emit_label(&next_label);
    }
    cg.emit_label(&end_label);
    Ok(())
}

fn emit_call_stmt(cg: &mut CodeGen, name: &str, args: &[Expr], line: usize) -> Result<(), CompileError> {
    match name {
        "write" | "writeln" => emit_write(cg, name, args),
        "read" | "readln" => emit_read(cg, name, args, line),
        _ => emit_user_call(cg, name, args, line),
    }
}

fn emit_write(cg: &mut CodeGen, name: &str, args: &[Expr]) -> Result<(), CompileError> {
    for arg in args {
        match arg {
            Expr::Fmt { expr, .. } => {
                emit_expr(cg, expr)?;
                cg.emit(writer_instr(expr));
            }
            other => {
                emit_expr(cg, other)?;
                cg.emit(writer_instr(other));
            }
        }
    }
    if name == "writeln" {
        cg.emit("WRITELN");
    }
    Ok(())
}

/// `WRITES` for text/char literals, `WRITEI` otherwise (spec's dispatch is
/// on the argument's syntactic literal-ness, mirroring the narrow real-vs-
/// integer literal dispatch used in `gen_binop`).
fn writer_instr(expr: &Expr) -> &'static str {
    match expr {
        Expr::StringLit(..) | Expr::CharLit(..) => "WRITES",
        _ => "WRITEI",
    }
}

fn emit_read(cg: &mut CodeGen, name: &str, args: &[Expr], line: usize) -> Result<(), CompileError> {
    for arg in args {
        let lvalue = expr_to_lvalue(arg)
            .ok_or_else(|| CompileError::internal(format!("line {line}: read target is not addressable")))?;
        cg.emit("READ");
        let target_is_char = lvalue_type(cg, &lvalue) == Some(Type::Char);
        if target_is_char {
            cg.emit("CHARAT");
        } else {
            cg.emit("ATOI");
        }
        emit_lvalue_store(cg, &lvalue, line)?;
    }
    let _ = name;
    Ok(())
}

fn lvalue_type(cg: &CodeGen, lvalue: &LValue) -> Option<Type> {
    match lvalue {
        LValue::Var { name, .. } => cg.var_type(name).cloned(),
        LValue::Array { base, .. } => {
            let name = array_base_name(base, 0).ok()?;
            match cg.var_type(&name)? {
                Type::Array(elem) => Some((**elem).clone()),
                _ => None,
            }
        }
        LValue::Field { .. } => None,
    }
}

fn expr_to_lvalue(expr: &Expr) -> Option<LValue> {
    match expr {
        Expr::Ident(name, line) => Some(LValue::Var { name: name.clone(), line: *line }),
        Expr::Index { base, index, line } => Some(LValue::Array {
            base: Box::new(expr_to_lvalue(base)?),
            index: (**index).clone(),
            line: *line,
        }),
        Expr::Field { base, field, line } => {
            Some(LValue::Field { base: Box::new(expr_to_lvalue(base)?), field: field.clone(), line: *line })
        }
        _ => None,
    }
}

fn emit_user_call(cg: &mut CodeGen, name: &str, args: &[Expr], line: usize) -> Result<(), CompileError> {
    let info = cg
        .subroutines
        .get(name)
        .cloned()
        .ok_or_else(|| CompileError::internal(format!("line {line}: unknown subroutine '{name}'")))?;
    cg.emit("PUSHI 0");
    for arg in args {
        emit_expr(cg, arg)?;
    }
    cg.emit(format!("PUSHA {}", info.label));
    cg.emit("CALL");
    Ok(())
}

pub fn emit_expr(cg: &mut CodeGen, expr: &Expr) -> Result<(), CompileError> {
    match expr {
        Expr::IntLit(v, _) => {
            cg.emit(format!("PUSHI {v}"));
            Ok(())
        }
        Expr::RealLit(v, _) => {
            cg.emit(format!("PUSHF {v}"));
            Ok(())
        }
        Expr::CharLit(c, _) => {
            cg.emit(format!("PUSHI {}", *c as u32));
            Ok(())
        }
        Expr::BoolLit(b, _) => {
            cg.emit(format!("PUSHI {}", if *b { 1 } else { 0 }));
            Ok(())
        }
        Expr::StringLit(s, _) => {
            cg.emit(format!("PUSHS \"{}\"", s.replace('"', "\"\"")));
            Ok(())
        }
        Expr::Ident(name, line) => emit_ident_read(cg, name, *line),
        Expr::Not { expr, .. } => {
            emit_expr(cg, expr)?;
            cg.emit("NOT");
            Ok(())
        }
        Expr::BinOp { op, lhs, rhs, line } => emit_binop(cg, *op, lhs, rhs, *line),
        Expr::SetLit { .. } => Err(CompileError::internal(
            "a set literal can only appear directly on the right of 'in'",
        )),
        Expr::Fmt { expr, .. } => emit_expr(cg, expr),
        Expr::Call { name, args, line } => emit_call_expr(cg, name, args, *line),
        Expr::Index { base, index, line } => emit_index_read(cg, base, index, *line),
        Expr::Field { base, field, line } => emit_field_read(cg, base, field, *line),
    }
}

fn emit_ident_read(cg: &mut CodeGen, name: &str, line: usize) -> Result<(), CompileError> {
    if let Some(expr) = cg.consts.get(name).cloned() {
        return match eval_const(&expr, &cg.consts)? {
            ConstValue::Int(i) => {
                cg.emit(format!("PUSHI {i}"));
                Ok(())
            }
            ConstValue::Real(r) => {
                cg.emit(format!("PUSHF {r}"));
                Ok(())
            }
        };
    }
    if let Some((scope, off)) = cg.resolve_scalar(name) {
        cg.emit(format!("PUSH{scope} {off}"));
        return Ok(());
    }
    Err(CompileError::internal(format!("line {line}: unknown identifier '{name}' during code generation")))
}

fn emit_index_read(cg: &mut CodeGen, base: &Expr, index: &Expr, line: usize) -> Result<(), CompileError> {
    let name = match base {
        Expr::Ident(name, _) => name.clone(),
        _ => return Err(CompileError::internal(format!("line {line}: only a plain variable can be indexed"))),
    };
    let (scope, info) = cg
        .resolve_array(&name)
        .ok_or_else(|| CompileError::internal(format!("line {line}: unknown array '{name}'")))?;
    cg.emit(format!("PUSH{scope} {}", info.offset));
    emit_expr(cg, index)?;
    if info.low != 0 {
        cg.emit(format!("PUSHI {}", info.low));
        cg.emit("SUB");
    }
    cg.emit(format!("CHECK 0,{}", info.size - 1));
    cg.emit("LOADN");
    Ok(())
}

fn emit_field_read(cg: &mut CodeGen, base: &Expr, field: &str, line: usize) -> Result<(), CompileError> {
    let name = match base {
        Expr::Ident(name, _) => name.clone(),
        _ => return Err(CompileError::internal(format!("line {line}: only a plain record variable supports field access"))),
    };
    let (scope, off) = cg
        .resolve_scalar(&name)
        .ok_or_else(|| CompileError::internal(format!("line {line}: unknown record '{name}'")))?;
    let key = cg
        .var_record_type_key
        .get(&name)
        .cloned()
        .ok_or_else(|| CompileError::internal(format!("'{name}' has no known record layout")))?;
    let field_off = field_offset(&cg.type_field_order, &key, field)
        .ok_or_else(|| CompileError::internal(format!("unknown field '{field}' on '{name}'")))?;
    cg.emit(format!("PUSH{scope} {}", off + field_off));
    Ok(())
}

fn emit_call_expr(cg: &mut CodeGen, name: &str, args: &[Expr], line: usize) -> Result<(), CompileError> {
    match name {
        "real" => {
            emit_expr(cg, &args[0])?;
            cg.emit("ITOF");
            Ok(())
        }
        "integer" => {
            emit_expr(cg, &args[0])?;
            cg.emit("FTOI");
            Ok(())
        }
        "boolean" | "char" => {
            // Both representations are plain integers on this VM; the cast
            // is a compile-time reinterpretation, not a runtime conversion.
            emit_expr(cg, &args[0])
        }
        _ => emit_user_call(cg, name, args, line),
    }
}

/// Whether either side of `op` is a real *literal* — a narrow literal-only
/// check, not a general static-type check.
fn is_real_literal(expr: &Expr) -> bool {
    matches!(expr, Expr::RealLit(..))
}

fn emit_binop(cg: &mut CodeGen, op: BinOpKind, lhs: &Expr, rhs: &Expr, line: usize) -> Result<(), CompileError> {
    if op == BinOpKind::In {
        return emit_in(cg, lhs, rhs, line);
    }
    emit_expr(cg, lhs)?;
    emit_expr(cg, rhs)?;
    let real = is_real_literal(lhs) || is_real_literal(rhs);
    let instr = match (op, real) {
        (BinOpKind::Add, false) => "ADD",
        (BinOpKind::Add, true) => "FADD",
        (BinOpKind::Sub, false) => "SUB",
        (BinOpKind::Sub, true) => "FSUB",
        (BinOpKind::Mul, false) => "MUL",
        (BinOpKind::Mul, true) => "FMUL",
        (BinOpKind::Div, false) => "DIV",
        (BinOpKind::Div, true) => "FDIV",
        (BinOpKind::IDiv, _) => "DIV",
        (BinOpKind::Mod, _) => "MOD",
        (BinOpKind::Lt, false) => "INF",
        (BinOpKind::Lt, true) => "FINF",
        (BinOpKind::Le, false) => "INFEQ",
        (BinOpKind::Le, true) => "FINFEQ",
        (BinOpKind::Gt, false) => "SUP",
        (BinOpKind::Gt, true) => "FSUP",
        (BinOpKind::Ge, false) => "SUPEQ",
        (BinOpKind::Ge, true) => "FSUPEQ",
        (BinOpKind::Eq, _) => "EQUAL",
        (BinOpKind::And, _) => "AND",
        (BinOpKind::Or, _) => "OR",
        (BinOpKind::Ne, _) => {
            cg.emit("EQUAL");
            cg.emit("NOT");
            return Ok(());
        }
        (BinOpKind::In, _) => unreachable!("handled in emit_binop before operand evaluation"),
    };
    cg.emit(instr);
    Ok(())
}

/// `x in [a, b, c]` lowers to a chain of equality tests or-ed together — the
/// set literal is never materialized as a value, only tested against.
fn emit_in(cg: &mut CodeGen, lhs: &Expr, rhs: &Expr, line: usize) -> Result<(), CompileError> {
    let elems = match rhs {
        Expr::SetLit { elems, .. } => elems,
        _ => {
            return Err(CompileError::internal(format!(
                "line {line}: 'in' against a named set is not supported by this code generator"
            )));
        }
    };
    if elems.is_empty() {
        cg.emit("PUSHI 0");
        return Ok(());
    }
    for (i, elem) in elems.iter().enumerate() {
        emit_expr(cg, lhs)?;
        emit_expr(cg, elem)?;
        cg.emit("EQUAL");
        if i > 0 {
            cg.emit("OR");
        }
    }
    Ok(())
}
