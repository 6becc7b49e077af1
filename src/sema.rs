//! Semantic analyzer: declaration checking, type checking, and
//! use-before-initialization tracking over a validated AST (see `DESIGN.md`
//! for the widening and printable-argument rules this enforces).

use crate::ast::*;
use crate::constexpr::{ConstValue, eval_const};
use crate::error::CompileError;
use crate::symtab::{ScopeStack, Symbol, SymbolKind};
use crate::types::{RecordLayout, Type, VariantLayout};
use std::collections::{BTreeMap, HashMap, HashSet};

pub struct Analyzer {
    scope: ScopeStack,
    types: HashMap<String, Type>,
    consts: HashMap<String, Expr>,
    init_stack: Vec<HashSet<String>>,
    current_function: Option<(String, Type)>,
    anon_enum_counter: usize,
}

type TResult = Result<Type, CompileError>;

impl Analyzer {
    pub fn new() -> Self {
        Analyzer {
            scope: ScopeStack::new(),
            types: HashMap::new(),
            consts: HashMap::new(),
            init_stack: vec![HashSet::new()],
            current_function: None,
            anon_enum_counter: 0,
        }
    }

    pub fn analyze_program(&mut self, program: &Program) -> Result<(), CompileError> {
        self.analyze_block(&program.block)
    }

    fn analyze_block(&mut self, block: &Block) -> Result<(), CompileError> {
        for c in &block.consts {
            let ty = self.infer_expr_type(&c.expr)?;
            if !self.scope.define(Symbol::simple(c.name.clone(), SymbolKind::Const, ty)) {
                return Err(CompileError::declaration(c.line, format!("duplicate declaration of '{}'", c.name)));
            }
            self.consts.insert(c.name.clone(), c.expr.clone());
            self.mark_initialized(&c.name);
        }

        for t in &block.types {
            if self.types.contains_key(&t.name) {
                return Err(CompileError::declaration(t.line, format!("duplicate type '{}'", t.name)));
            }
            let ty = self.normalize_type_expr(&t.ty, Some(&t.name))?;
            self.types.insert(t.name.clone(), ty);
        }

        for l in &block.labels {
            if !self.scope.define(Symbol::simple(l.to_string(), SymbolKind::Label, Type::Integer)) {
                return Err(CompileError::declaration(0, format!("duplicate label {l}")));
            }
        }

        for v in &block.vars {
            let ty = self.normalize_type_expr(&v.ty, None)?;
            for name in &v.names {
                if self.scope.declared_locally(name) {
                    if let Some(existing) = self.scope.resolve(name) {
                        if existing.kind == SymbolKind::Const {
                            return Err(CompileError::declaration(
                                v.line,
                                format!("'{name}' is already declared as a constant"),
                            ));
                        }
                    }
                }
                if !self.scope.define(Symbol::simple(name.clone(), SymbolKind::Var, ty.clone())) {
                    return Err(CompileError::declaration(v.line, format!("duplicate declaration of '{name}'")));
                }
            }
        }

        for sub in &block.subroutines {
            self.analyze_subroutine(sub)?;
        }

        for stmt in &block.body {
            self.analyze_stmt(stmt)?;
        }
        Ok(())
    }

    fn analyze_subroutine(&mut self, sub: &Subroutine) -> Result<(), CompileError> {
        let mut flat_params = Vec::new();
        for p in &sub.params {
            let pty = self.normalize_type_expr(&p.ty, None)?;
            for name in &p.names {
                flat_params.push((name.clone(), pty.clone()));
            }
        }
        let return_type = match &sub.return_type {
            Some(te) => Some(self.normalize_type_expr(te, None)?),
            None => None,
        };

        let mut symbol = Symbol::simple(
            sub.name.clone(),
            if return_type.is_some() { SymbolKind::Function } else { SymbolKind::Procedure },
            return_type.clone().unwrap_or(Type::Boolean),
        );
        symbol.params = flat_params.clone();
        symbol.return_type = return_type.clone();
        if !self.scope.define(symbol) {
            return Err(CompileError::declaration(sub.line, format!("duplicate declaration of '{}'", sub.name)));
        }

        self.scope.push_scope();
        self.init_stack.push(HashSet::new());
        for (name, ty) in &flat_params {
            self.scope.define(Symbol::simple(name.clone(), SymbolKind::Var, ty.clone()));
            self.mark_initialized(name);
        }

        let saved_function = self.current_function.take();
        if let Some(rt) = &return_type {
            self.current_function = Some((sub.name.clone(), rt.clone()));
        }

        let result = self.analyze_block(&sub.block);

        self.current_function = saved_function;
        self.init_stack.pop();
        self.scope.pop_scope();
        result
    }

    fn normalize_type_expr(&mut self, te: &TypeExpr, name_hint: Option<&str>) -> TResult {
        match te {
            TypeExpr::Named(n) => match n.as_str() {
                "integer" => Ok(Type::Integer),
                "real" => Ok(Type::Real),
                "boolean" => Ok(Type::Boolean),
                "char" => Ok(Type::Char),
                other => self.types.get(other).cloned().ok_or_else(|| {
                    CompileError::declaration(0, format!("undeclared type '{other}'"))
                }),
            },
            TypeExpr::Packed(inner) => self.normalize_type_expr(inner, name_hint),
            TypeExpr::Array { lower, upper, elem } => {
                let lo = eval_const(lower, &self.consts)?
                    .as_int()
                    .ok_or_else(|| CompileError::declaration(lower.line(), "array lower bound must be an integer"))?;
                let hi = eval_const(upper, &self.consts)?
                    .as_int()
                    .ok_or_else(|| CompileError::declaration(upper.line(), "array upper bound must be an integer"))?;
                if hi < lo {
                    return Err(CompileError::declaration(upper.line(), "array upper bound is below lower bound"));
                }
                let elem_ty = self.normalize_type_expr(elem, None)?;
                Ok(Type::Array(Box::new(elem_ty)))
            }
            TypeExpr::Subrange { lower, upper } => {
                eval_const(lower, &self.consts)?
                    .as_int()
                    .ok_or_else(|| CompileError::declaration(lower.line(), "subrange bound must be an integer"))?;
                eval_const(upper, &self.consts)?
                    .as_int()
                    .ok_or_else(|| CompileError::declaration(upper.line(), "subrange bound must be an integer"))?;
                Ok(Type::Integer)
            }
            TypeExpr::Enum(members) => {
                let name = name_hint.map(|s| s.to_string()).unwrap_or_else(|| {
                    self.anon_enum_counter += 1;
                    format!("anon_enum_{}", self.anon_enum_counter)
                });
                for m in members {
                    self.scope.define(Symbol::simple(m.clone(), SymbolKind::EnumMember, Type::Enum(name.clone())));
                }
                Ok(Type::Enum(name))
            }
            TypeExpr::Set(inner) => Ok(Type::Set(Box::new(self.normalize_type_expr(inner, None)?))),
            TypeExpr::FileOf(inner) => Ok(Type::File(Box::new(self.normalize_type_expr(inner, None)?))),
            TypeExpr::Record { fields, variant } => {
                let mut map = BTreeMap::new();
                for f in fields {
                    let fty = self.normalize_type_expr(&f.ty, None)?;
                    for name in &f.names {
                        if map.insert(name.clone(), fty.clone()).is_some() {
                            return Err(CompileError::declaration(f.line, format!("duplicate field '{name}'")));
                        }
                    }
                }
                let variant_layout = match variant {
                    None => None,
                    Some(v) => {
                        let disc_type = match &v.discriminant_type {
                            Some(n) => self.normalize_type_expr(&TypeExpr::Named(n.clone()), None)?,
                            None => map
                                .get(&v.discriminant_name)
                                .cloned()
                                .ok_or_else(|| CompileError::declaration(0, "unknown variant discriminant field"))?,
                        };
                        if !disc_type.is_ordinal() {
                            return Err(CompileError::declaration(0, "variant discriminant must be an ordinal type"));
                        }
                        let mut branches = Vec::new();
                        for b in &v.branches {
                            let mut labels = Vec::new();
                            for label in &b.labels {
                                let lt = self.infer_expr_type(label)?;
                                if lt != disc_type {
                                    return Err(CompileError::typing(
                                        label.line(),
                                        "variant label type does not match discriminant",
                                    ));
                                }
                                labels.push(format!("{label:?}"));
                            }
                            let mut branch_fields = BTreeMap::new();
                            for f in &b.fields {
                                let fty = self.normalize_type_expr(&f.ty, None)?;
                                for name in &f.names {
                                    branch_fields.insert(name.clone(), fty.clone());
                                }
                            }
                            branches.push((labels, branch_fields));
                        }
                        Some(Box::new(VariantLayout {
                            discriminant_name: v.discriminant_name.clone(),
                            discriminant_type: disc_type,
                            branches,
                        }))
                    }
                };
                Ok(Type::Record(RecordLayout { fields: map, variant: variant_layout }))
            }
        }
    }

    fn analyze_stmt(&mut self, stmt: &Stmt) -> Result<(), CompileError> {
        match stmt {
            Stmt::Empty => Ok(()),
            Stmt::Assign { lvalue, expr, line } => {
                let expr_ty = self.infer_expr_type(expr)?;
                if let LValue::Var { name, .. } = lvalue {
                    if let Some((fname, rty)) = self.current_function.clone() {
                        if *name == fname {
                            if !assignable(&expr_ty, &rty) {
                                return Err(CompileError::typing(
                                    *line,
                                    format!("cannot return {} as {}", expr_ty.display_name(), rty.display_name()),
                                ));
                            }
                            return Ok(());
                        }
                    }
                }
                let (lv_ty, is_const) = self.resolve_lvalue(lvalue)?;
                if is_const {
                    return Err(CompileError::declaration(*line, "cannot assign to a constant"));
                }
                if !assignable(&expr_ty, &lv_ty) {
                    return Err(CompileError::typing(
                        *line,
                        format!("cannot assign {} to {}", expr_ty.display_name(), lv_ty.display_name()),
                    ));
                }
                self.mark_lvalue_initialized(lvalue);
                Ok(())
            }
            Stmt::Compound(stmts) => {
                for s in stmts {
                    self.analyze_stmt(s)?;
                }
                Ok(())
            }
            Stmt::Call { name, args, line } => {
                self.analyze_call(name, args, *line)?;
                Ok(())
            }
            Stmt::If { cond, then_branch, else_branch, line } => {
                self.require_boolean(cond, *line)?;
                self.analyze_stmt(then_branch)?;
                if let Some(e) = else_branch {
                    self.analyze_stmt(e)?;
                }
                Ok(())
            }
            Stmt::While { cond, body, line } => {
                self.require_boolean(cond, *line)?;
                self.analyze_stmt(body)
            }
            Stmt::Repeat { body, cond, line } => {
                for s in body {
                    self.analyze_stmt(s)?;
                }
                self.require_boolean(cond, *line)
            }
            Stmt::For { var, start, end, body, line, .. } => {
                let sym = self
                    .scope
                    .resolve(var)
                    .cloned()
                    .ok_or_else(|| CompileError::declaration(*line, format!("undeclared variable '{var}'")))?;
                if sym.ty != Type::Integer {
                    return Err(CompileError::typing(*line, "for-loop control variable must be integer"));
                }
                if self.infer_expr_type(start)? != Type::Integer {
                    return Err(CompileError::typing(start.line(), "for-loop bound must be integer"));
                }
                if self.infer_expr_type(end)? != Type::Integer {
                    return Err(CompileError::typing(end.line(), "for-loop bound must be integer"));
                }
                self.mark_initialized(var);
                self.analyze_stmt(body)
            }
            Stmt::Case { scrutinee, arms, line } => {
                let sty = self.infer_expr_type(scrutinee)?;
                if !sty.is_ordinal() {
                    return Err(CompileError::typing(*line, "case scrutinee must be an ordinal type"));
                }
                let mut seen_labels = HashSet::new();
                for arm in arms {
                    for label in &arm.labels {
                        let lt = self.infer_expr_type(label)?;
                        if lt != sty {
                            return Err(CompileError::typing(label.line(), "case label type mismatch"));
                        }
                        let key = self.case_label_key(label)?;
                        if !seen_labels.insert(key) {
                            return Err(CompileError::declaration(label.line(), "duplicate case label"));
                        }
                    }
                    self.analyze_stmt(&arm.stmt)?;
                }
                Ok(())
            }
            Stmt::With { vars, body, line } => {
                self.scope.push_scope();
                self.init_stack.push(HashSet::new());
                for v in vars {
                    let sym = self
                        .scope
                        .resolve(v)
                        .cloned()
                        .ok_or_else(|| CompileError::declaration(*line, format!("undeclared variable '{v}'")))?;
                    match &sym.ty {
                        Type::Record(layout) => {
                            for (fname, fty) in &layout.fields {
                                self.scope.define(Symbol::simple(fname.clone(), SymbolKind::Var, fty.clone()));
                                self.mark_initialized(fname);
                            }
                        }
                        _ => {
                            self.init_stack.pop();
                            self.scope.pop_scope();
                            return Err(CompileError::typing(*line, "'with' requires a record variable"));
                        }
                    }
                }
                let result = self.analyze_stmt(body);
                self.init_stack.pop();
                self.scope.pop_scope();
                result
            }
            Stmt::Goto { label, line } => {
                if self.scope.resolve(&label.to_string()).is_none() {
                    return Err(CompileError::declaration(*line, format!("undeclared label {label}")));
                }
                Ok(())
            }
            Stmt::Labeled { stmt, .. } => self.analyze_stmt(stmt),
        }
    }

    fn require_boolean(&mut self, expr: &Expr, line: usize) -> Result<(), CompileError> {
        if self.infer_expr_type(expr)? != Type::Boolean {
            return Err(CompileError::typing(line, "condition must be boolean"));
        }
        Ok(())
    }

    fn resolve_lvalue(&mut self, lvalue: &LValue) -> Result<(Type, bool), CompileError> {
        match lvalue {
            LValue::Var { name, line } => {
                let sym = self
                    .scope
                    .resolve(name)
                    .cloned()
                    .ok_or_else(|| CompileError::declaration(*line, format!("undeclared variable '{name}'")))?;
                Ok((sym.ty, sym.kind == SymbolKind::Const))
            }
            LValue::Array { base, index, line } => {
                let (base_ty, is_const) = self.resolve_lvalue(base)?;
                let elem = match base_ty {
                    Type::Array(e) => *e,
                    _ => return Err(CompileError::typing(*line, "indexing a non-array value")),
                };
                if self.infer_expr_type(index)? != Type::Integer {
                    return Err(CompileError::typing(index.line(), "array index must be integer"));
                }
                Ok((elem, is_const))
            }
            LValue::Field { base, field, line } => {
                let (base_ty, is_const) = self.resolve_lvalue(base)?;
                match base_ty {
                    Type::Record(layout) => {
                        let fty = lookup_field(&layout, field)
                            .ok_or_else(|| CompileError::declaration(*line, format!("unknown field '{field}'")))?;
                        Ok((fty, is_const))
                    }
                    _ => Err(CompileError::typing(*line, "field access on a non-record value")),
                }
            }
        }
    }

    fn mark_lvalue_initialized(&mut self, lvalue: &LValue) {
        match lvalue {
            LValue::Var { name, .. } => self.mark_initialized(name),
            LValue::Array { base, .. } | LValue::Field { base, .. } => self.mark_lvalue_initialized(base),
        }
    }

    fn mark_initialized(&mut self, name: &str) {
        self.init_stack.last_mut().unwrap().insert(name.to_string());
    }

    fn is_initialized(&self, name: &str) -> bool {
        self.init_stack.iter().any(|frame| frame.contains(name))
    }

    /// Canonical key for a case label's constant value, used to detect
    /// duplicate labels across the arms of one `case` statement. Folds
    /// through named constants via `eval_const`; char/bool literals and bare
    /// enum-member identifiers are keyed directly since they aren't
    /// arithmetic constant expressions.
    fn case_label_key(&self, label: &Expr) -> Result<String, CompileError> {
        match label {
            Expr::CharLit(c, _) => Ok(format!("char:{}", *c as u32)),
            Expr::BoolLit(b, _) => Ok(format!("bool:{b}")),
            Expr::Ident(name, _) if !self.consts.contains_key(name) => Ok(format!("enum:{name}")),
            _ => match eval_const(label, &self.consts)? {
                ConstValue::Int(v) => Ok(format!("int:{v}")),
                ConstValue::Real(v) => Ok(format!("real:{v}")),
            },
        }
    }

    fn expr_to_lvalue(&self, expr: &Expr) -> Option<LValue> {
        match expr {
            Expr::Ident(name, line) => Some(LValue::Var { name: name.clone(), line: *line }),
            Expr::Index { base, index, line } => Some(LValue::Array {
                base: Box::new(self.expr_to_lvalue(base)?),
                index: (**index).clone(),
                line: *line,
            }),
            Expr::Field { base, field, line } => Some(LValue::Field {
                base: Box::new(self.expr_to_lvalue(base)?),
                field: field.clone(),
                line: *line,
            }),
            _ => None,
        }
    }

    fn analyze_call(&mut self, name: &str, args: &[Expr], line: usize) -> TResult {
        match name {
            "write" | "writeln" => {
                for arg in args {
                    self.check_write_arg(arg)?;
                }
                Ok(Type::Boolean)
            }
            "read" | "readln" => {
                for arg in args {
                    let lv = self
                        .expr_to_lvalue(arg)
                        .ok_or_else(|| CompileError::typing(arg.line(), "read target must be a variable"))?;
                    let (ty, is_const) = self.resolve_lvalue(&lv)?;
                    if is_const {
                        return Err(CompileError::declaration(arg.line(), "cannot read into a constant"));
                    }
                    if !matches!(ty, Type::Char | Type::Integer | Type::Real) {
                        return Err(CompileError::typing(arg.line(), "read target must be char, integer, or real"));
                    }
                    self.mark_lvalue_initialized(&lv);
                }
                Ok(Type::Boolean)
            }
            "real" => {
                if args.len() != 1 {
                    return Err(CompileError::typing(line, "real() takes exactly one argument"));
                }
                let t = self.infer_expr_type(&args[0])?;
                if !t.is_numeric() {
                    return Err(CompileError::typing(line, "real() requires a numeric argument"));
                }
                Ok(Type::Real)
            }
            "integer" => {
                if args.len() != 1 {
                    return Err(CompileError::typing(line, "integer() takes exactly one argument"));
                }
                let t = self.infer_expr_type(&args[0])?;
                if !t.is_numeric() {
                    return Err(CompileError::typing(line, "integer() requires a numeric argument"));
                }
                Ok(Type::Integer)
            }
            "boolean" => {
                if args.len() != 1 {
                    return Err(CompileError::typing(line, "boolean() takes exactly one argument"));
                }
                let t = self.infer_expr_type(&args[0])?;
                if t != Type::Integer {
                    return Err(CompileError::typing(line, "boolean() requires an integer argument"));
                }
                Ok(Type::Boolean)
            }
            "char" => {
                if args.len() != 1 {
                    return Err(CompileError::typing(line, "char() takes exactly one argument"));
                }
                let t = self.infer_expr_type(&args[0])?;
                if t != Type::Integer {
                    return Err(CompileError::typing(line, "char() requires an integer argument"));
                }
                Ok(Type::Char)
            }
            _ => {
                let sym = self
                    .scope
                    .resolve(name)
                    .cloned()
                    .ok_or_else(|| CompileError::declaration(line, format!("undeclared subroutine '{name}'")))?;
                if !matches!(sym.kind, SymbolKind::Function | SymbolKind::Procedure) {
                    return Err(CompileError::declaration(line, format!("'{name}' is not callable")));
                }
                if sym.params.len() != args.len() {
                    return Err(CompileError::typing(
                        line,
                        format!("'{name}' expects {} argument(s), got {}", sym.params.len(), args.len()),
                    ));
                }
                for (i, (_, pty)) in sym.params.iter().enumerate() {
                    let aty = self.infer_expr_type(&args[i])?;
                    if !assignable_call_arg(&aty, pty) {
                        return Err(CompileError::typing(
                            args[i].line(),
                            format!("argument {} to '{}' has the wrong type", i + 1, name),
                        ));
                    }
                }
                Ok(sym.return_type.unwrap_or(Type::Boolean))
            }
        }
    }

    fn check_write_arg(&mut self, expr: &Expr) -> Result<(), CompileError> {
        match expr {
            Expr::Fmt { expr, width, precision, line } => {
                if self.infer_expr_type(width)? != Type::Integer {
                    return Err(CompileError::typing(*line, "format width must be integer"));
                }
                if let Some(p) = precision {
                    if self.infer_expr_type(p)? != Type::Integer {
                        return Err(CompileError::typing(*line, "format precision must be integer"));
                    }
                }
                self.check_write_arg(expr)
            }
            other => {
                let t = self.infer_expr_type(other)?;
                if !scalar_printable(&t) {
                    return Err(CompileError::typing(other.line(), "write/writeln argument is not printable"));
                }
                Ok(())
            }
        }
    }

    fn infer_expr_type(&mut self, expr: &Expr) -> TResult {
        match expr {
            Expr::IntLit(..) => Ok(Type::Integer),
            Expr::RealLit(..) => Ok(Type::Real),
            Expr::CharLit(..) => Ok(Type::Char),
            Expr::StringLit(..) => Ok(Type::Texto),
            Expr::BoolLit(..) => Ok(Type::Boolean),
            Expr::Ident(name, line) => {
                let sym = self
                    .scope
                    .resolve(name)
                    .cloned()
                    .ok_or_else(|| CompileError::declaration(*line, format!("undeclared identifier '{name}'")))?;
                if sym.kind == SymbolKind::Var && !self.is_initialized(name) {
                    return Err(CompileError::use_before_init(*line, name));
                }
                Ok(sym.ty)
            }
            Expr::BinOp { op, lhs, rhs, line } => {
                let lt = self.infer_expr_type(lhs)?;
                let rt = self.infer_expr_type(rhs)?;
                binop_result_type(*op, &lt, &rt, *line)
            }
            Expr::Not { expr, line } => {
                if self.infer_expr_type(expr)? != Type::Boolean {
                    return Err(CompileError::typing(*line, "'not' requires a boolean operand"));
                }
                Ok(Type::Boolean)
            }
            Expr::Fmt { expr, width, precision, line } => {
                if self.infer_expr_type(width)? != Type::Integer {
                    return Err(CompileError::typing(*line, "format width must be integer"));
                }
                if let Some(p) = precision {
                    if self.infer_expr_type(p)? != Type::Integer {
                        return Err(CompileError::typing(*line, "format precision must be integer"));
                    }
                }
                self.infer_expr_type(expr)
            }
            Expr::SetLit { elems, line } => {
                if elems.is_empty() {
                    return Ok(Type::Set(Box::new(Type::Integer)));
                }
                let first = self.infer_expr_type(&elems[0])?;
                for e in &elems[1..] {
                    if self.infer_expr_type(e)? != first {
                        return Err(CompileError::typing(*line, "set elements must share a type"));
                    }
                }
                Ok(Type::Set(Box::new(first)))
            }
            Expr::Call { name, args, line } => self.analyze_call(name, args, *line),
            Expr::Field { base, field, line } => match self.infer_expr_type(base)? {
                Type::Record(layout) => lookup_field(&layout, field)
                    .ok_or_else(|| CompileError::declaration(*line, format!("unknown field '{field}'"))),
                _ => Err(CompileError::typing(*line, "field access on a non-record value")),
            },
            Expr::Index { base, index, line } => match self.infer_expr_type(base)? {
                Type::Array(elem) => {
                    if self.infer_expr_type(index)? != Type::Integer {
                        return Err(CompileError::typing(index.line(), "array index must be integer"));
                    }
                    Ok(*elem)
                }
                _ => Err(CompileError::typing(*line, "indexing a non-array value")),
            },
        }
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}

fn lookup_field(layout: &RecordLayout, field: &str) -> Option<Type> {
    if let Some(t) = layout.fields.get(field) {
        return Some(t.clone());
    }
    if let Some(variant) = &layout.variant {
        for (_, fields) in &variant.branches {
            if let Some(t) = fields.get(field) {
                return Some(t.clone());
            }
        }
    }
    None
}

fn scalar_printable(t: &Type) -> bool {
    matches!(t, Type::Boolean | Type::Char | Type::Integer | Type::Real | Type::Texto)
}

fn assignable(src: &Type, dst: &Type) -> bool {
    src == dst || (*src == Type::Integer && *dst == Type::Real)
}

fn assignable_call_arg(src: &Type, dst: &Type) -> bool {
    if assignable(src, dst) {
        return true;
    }
    matches!(
        (src, dst),
        (Type::Texto, Type::Array(e)) | (Type::Array(e), Type::Texto) if **e == Type::Char
    )
}

fn binop_result_type(op: BinOpKind, lt: &Type, rt: &Type, line: usize) -> TResult {
    use BinOpKind::*;
    match op {
        Add | Sub | Mul => {
            if lt.is_numeric() && rt.is_numeric() {
                Ok(if *lt == Type::Real || *rt == Type::Real { Type::Real } else { Type::Integer })
            } else {
                Err(CompileError::typing(line, "arithmetic requires numeric operands"))
            }
        }
        Div => {
            if lt.is_numeric() && rt.is_numeric() {
                Ok(Type::Real)
            } else {
                Err(CompileError::typing(line, "'/' requires numeric operands"))
            }
        }
        IDiv | Mod => {
            if *lt == Type::Integer && *rt == Type::Integer {
                Ok(Type::Integer)
            } else {
                Err(CompileError::typing(line, "'div'/'mod' require integer operands"))
            }
        }
        Eq | Ne => {
            if (lt.is_numeric() && rt.is_numeric()) || lt == rt {
                Ok(Type::Boolean)
            } else {
                Err(CompileError::typing(line, "'='/'<>' require comparable operands"))
            }
        }
        Lt | Le | Gt | Ge => {
            if (lt.is_numeric() && rt.is_numeric()) || (lt == rt && (lt.is_ordinal() || *lt == Type::Texto)) {
                Ok(Type::Boolean)
            } else {
                Err(CompileError::typing(line, "ordering operator requires comparable operands"))
            }
        }
        And | Or => {
            if *lt == Type::Boolean && *rt == Type::Boolean {
                Ok(Type::Boolean)
            } else {
                Err(CompileError::typing(line, "'and'/'or' require boolean operands"))
            }
        }
        In => match rt {
            Type::Set(elem) if **elem == *lt => Ok(Type::Boolean),
            _ => Err(CompileError::typing(line, "'in' requires a matching set operand")),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;
    use crate::parser::parse;

    fn check(src: &str) -> Result<(), CompileError> {
        let program = parse(lex(src).unwrap()).unwrap();
        analyze(&program)
    }

    #[test]
    fn well_typed_program_passes() {
        check(
            r#"program p;
            var x: integer;
            begin
              x := 1;
              writeln(x)
            end."#,
        )
        .unwrap();
    }

    #[test]
    fn undeclared_variable_is_rejected() {
        let err = check(
            r#"program p;
            begin
              x := 1
            end."#,
        )
        .unwrap_err();
        assert!(matches!(err, CompileError::Declaration { .. }));
    }

    #[test]
    fn use_before_init_is_rejected() {
        let err = check(
            r#"program p;
            var x, y: integer;
            begin
              y := x
            end."#,
        )
        .unwrap_err();
        assert!(matches!(err, CompileError::UseBeforeInit { .. }));
    }

    #[test]
    fn integer_widens_to_real_on_assignment() {
        check(
            r#"program p;
            var r: real;
            begin
              r := 1
            end."#,
        )
        .unwrap();
    }

    #[test]
    fn real_does_not_narrow_to_integer() {
        let err = check(
            r#"program p;
            var i: integer;
            begin
              i := 1.5
            end."#,
        )
        .unwrap_err();
        assert!(matches!(err, CompileError::Typing { .. }));
    }

    #[test]
    fn non_boolean_if_condition_is_rejected() {
        let err = check(
            r#"program p;
            var x: integer;
            begin
              if x then x := 1
            end."#,
        )
        .unwrap_err();
        assert!(matches!(err, CompileError::Typing { .. }));
    }

    #[test]
    fn case_with_distinct_labels_passes() {
        check(
            r#"program p;
            var x: integer;
            begin
              case x of
                1: writeln(1);
                2: writeln(2);
                3: writeln(3)
              end
            end."#,
        )
        .unwrap();
    }

    #[test]
    fn case_with_duplicate_integer_label_is_rejected() {
        let err = check(
            r#"program p;
            var x: integer;
            begin
              case x of
                1: writeln(1);
                2: writeln(2);
                1: writeln(3)
              end
            end."#,
        )
        .unwrap_err();
        assert!(matches!(err, CompileError::Declaration { .. }));
    }

    #[test]
    fn case_with_duplicate_char_label_is_rejected() {
        let err = check(
            r#"program p;
            var x: char;
            begin
              case x of
                'a': writeln(1);
                'b': writeln(2);
                'a': writeln(3)
              end
            end."#,
        )
        .unwrap_err();
        assert!(matches!(err, CompileError::Declaration { .. }));
    }

    #[test]
    fn boolean_cast_of_integer_succeeds() {
        check(
            r#"program p;
            var x: integer;
            var b: boolean;
            begin
              b := boolean(x)
            end."#,
        )
        .unwrap();
    }

    #[test]
    fn char_cast_of_integer_succeeds() {
        check(
            r#"program p;
            var x: integer;
            var c: char;
            begin
              c := char(x)
            end."#,
        )
        .unwrap();
    }

    #[test]
    fn boolean_cast_of_real_is_rejected() {
        let err = check(
            r#"program p;
            var r: real;
            var b: boolean;
            begin
              r := 1.5;
              b := boolean(r)
            end."#,
        )
        .unwrap_err();
        assert!(matches!(err, CompileError::Typing { .. }));
    }

    #[test]
    fn char_cast_of_real_is_rejected() {
        let err = check(
            r#"program p;
            var r: real;
            var c: char;
            begin
              r := 1.5;
              c := char(r)
            end."#,
        )
        .unwrap_err();
        assert!(matches!(err, CompileError::Typing { .. }));
    }
}

pub fn analyze(program: &Program) -> Result<(), CompileError> {
    Analyzer::new().analyze_program(program)
}
