//! Abstract syntax tree: one enum variant per grammar production, an
//! exhaustive Rust enum rather than a dynamically tagged tuple.
//!
//! Every node carries the 1-based source line of its leading token.

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub name: String,
    pub block: Block,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub consts: Vec<ConstDecl>,
    pub types: Vec<TypeDecl>,
    pub labels: Vec<i64>,
    pub vars: Vec<VarDecl>,
    pub subroutines: Vec<Subroutine>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstDecl {
    pub name: String,
    pub expr: Expr,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeDecl {
    pub name: String,
    pub ty: TypeExpr,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub names: Vec<String>,
    pub ty: TypeExpr,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParamKind {
    Val,
    Var,
    Const,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub names: Vec<String>,
    pub ty: TypeExpr,
    pub kind: ParamKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Subroutine {
    pub name: String,
    pub params: Vec<Param>,
    /// `None` for a procedure, `Some(type)` for a function.
    pub return_type: Option<TypeExpr>,
    pub block: Block,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    Named(String),
    Array { lower: Expr, upper: Expr, elem: Box<TypeExpr> },
    Enum(Vec<String>),
    Subrange { lower: Expr, upper: Expr },
    Record { fields: Vec<VarDecl>, variant: Option<VariantPart> },
    Set(Box<TypeExpr>),
    FileOf(Box<TypeExpr>),
    Packed(Box<TypeExpr>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariantPart {
    pub discriminant_name: String,
    pub discriminant_type: Option<String>,
    pub branches: Vec<VariantBranch>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariantBranch {
    pub labels: Vec<Expr>,
    pub fields: Vec<VarDecl>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LValue {
    Var { name: String, line: usize },
    Array { base: Box<LValue>, index: Expr, line: usize },
    Field { base: Box<LValue>, field: String, line: usize },
}

impl LValue {
    pub fn line(&self) -> usize {
        match self {
            LValue::Var { line, .. } => *line,
            LValue::Array { line, .. } => *line,
            LValue::Field { line, .. } => *line,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Empty,
    Assign { lvalue: LValue, expr: Expr, line: usize },
    Compound(Vec<Stmt>),
    Call { name: String, args: Vec<Expr>, line: usize },
    If { cond: Expr, then_branch: Box<Stmt>, else_branch: Option<Box<Stmt>>, line: usize },
    While { cond: Expr, body: Box<Stmt>, line: usize },
    Repeat { body: Vec<Stmt>, cond: Expr, line: usize },
    For { var: String, start: Expr, end: Expr, downto: bool, body: Box<Stmt>, line: usize },
    Case { scrutinee: Expr, arms: Vec<CaseArm>, line: usize },
    With { vars: Vec<String>, body: Box<Stmt>, line: usize },
    Goto { label: i64, line: usize },
    Labeled { label: i64, stmt: Box<Stmt>, line: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaseArm {
    pub labels: Vec<Expr>,
    pub stmt: Stmt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOpKind {
    Add,
    Sub,
    Mul,
    Div,
    IDiv,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    In,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    IntLit(i64, usize),
    RealLit(f64, usize),
    CharLit(char, usize),
    StringLit(String, usize),
    BoolLit(bool, usize),
    Ident(String, usize),
    BinOp { op: BinOpKind, lhs: Box<Expr>, rhs: Box<Expr>, line: usize },
    Not { expr: Box<Expr>, line: usize },
    Fmt { expr: Box<Expr>, width: Box<Expr>, precision: Option<Box<Expr>>, line: usize },
    SetLit { elems: Vec<Expr>, line: usize },
    Call { name: String, args: Vec<Expr>, line: usize },
    Field { base: Box<Expr>, field: String, line: usize },
    Index { base: Box<Expr>, index: Box<Expr>, line: usize },
}

impl Expr {
    pub fn line(&self) -> usize {
        match self {
            Expr::IntLit(_, l)
            | Expr::RealLit(_, l)
            | Expr::CharLit(_, l)
            | Expr::StringLit(_, l)
            | Expr::BoolLit(_, l)
            | Expr::Ident(_, l) => *l,
            Expr::BinOp { line, .. }
            | Expr::Not { line, .. }
            | Expr::Fmt { line, .. }
            | Expr::SetLit { line, .. }
            | Expr::Call { line, .. }
            | Expr::Field { line, .. }
            | Expr::Index { line, .. } => *line,
        }
    }
}
