//! Recursive-descent parser over a `Token` stream with a cursor position.

use crate::ast::*;
use crate::error::CompileError;
use crate::token::{Token, TokenKind};

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

type PResult<T> = Result<T, CompileError>;

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, pos: 0 }
    }

    fn cur(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn line(&self) -> usize {
        self.cur().line
    }

    fn at(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.cur().kind) == std::mem::discriminant(kind)
    }

    fn bump(&mut self) -> Token {
        let t = self.tokens[self.pos.min(self.tokens.len() - 1)].clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        t
    }

    fn expect(&mut self, kind: TokenKind) -> PResult<Token> {
        if self.at(&kind) {
            Ok(self.bump())
        } else {
            Err(CompileError::syntax(
                self.line(),
                format!("expected {:?}, found {:?}", kind, self.cur().kind),
            ))
        }
    }

    fn expect_ident(&mut self) -> PResult<String> {
        match &self.cur().kind {
            TokenKind::Ident(s) => {
                let s = s.clone();
                self.bump();
                Ok(s)
            }
            other => Err(CompileError::syntax(self.line(), format!("expected identifier, found {other:?}"))),
        }
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    pub fn parse_program(&mut self) -> PResult<Program> {
        self.expect(TokenKind::Program)?;
        let name = self.expect_ident()?;
        self.expect(TokenKind::Semicolon)?;
        let block = self.parse_block()?;
        self.expect(TokenKind::Dot)?;
        Ok(Program { name, block })
    }

    fn parse_block(&mut self) -> PResult<Block> {
        let mut block = Block::default();
        loop {
            match &self.cur().kind {
                TokenKind::Const => self.parse_const_section(&mut block)?,
                TokenKind::Type => self.parse_type_section(&mut block)?,
                TokenKind::Label => self.parse_label_section(&mut block)?,
                TokenKind::Var => self.parse_var_section(&mut block)?,
                TokenKind::Function => {
                    let sub = self.parse_subroutine(true)?;
                    block.subroutines.push(sub);
                }
                TokenKind::Procedure => {
                    let sub = self.parse_subroutine(false)?;
                    block.subroutines.push(sub);
                }
                _ => break,
            }
        }
        self.expect(TokenKind::Begin)?;
        block.body = self.parse_stmt_list()?;
        self.expect(TokenKind::End)?;
        Ok(block)
    }

    fn parse_const_section(&mut self, block: &mut Block) -> PResult<()> {
        self.expect(TokenKind::Const)?;
        loop {
            let line = self.line();
            let name = self.expect_ident()?;
            self.expect(TokenKind::Eq)?;
            let expr = self.parse_expr()?;
            self.expect(TokenKind::Semicolon)?;
            block.consts.push(ConstDecl { name, expr, line });
            if !matches!(self.cur().kind, TokenKind::Ident(_)) {
                break;
            }
        }
        Ok(())
    }

    fn parse_type_section(&mut self, block: &mut Block) -> PResult<()> {
        self.expect(TokenKind::Type)?;
        loop {
            let line = self.line();
            let name = self.expect_ident()?;
            self.expect(TokenKind::Eq)?;
            let ty = self.parse_type_expr()?;
            self.expect(TokenKind::Semicolon)?;
            block.types.push(TypeDecl { name, ty, line });
            if !matches!(self.cur().kind, TokenKind::Ident(_)) {
                break;
            }
        }
        Ok(())
    }

    fn parse_label_section(&mut self, block: &mut Block) -> PResult<()> {
        self.expect(TokenKind::Label)?;
        loop {
            match &self.cur().kind {
                TokenKind::IntLiteral(n) => {
                    block.labels.push(*n);
                    self.bump();
                }
                other => return Err(CompileError::syntax(self.line(), format!("expected label, found {other:?}"))),
            }
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::Semicolon)?;
        Ok(())
    }

    fn parse_var_section(&mut self, block: &mut Block) -> PResult<()> {
        self.expect(TokenKind::Var)?;
        loop {
            let line = self.line();
            let names = self.parse_ident_list()?;
            self.expect(TokenKind::Colon)?;
            let ty = self.parse_type_expr()?;
            self.expect(TokenKind::Semicolon)?;
            block.vars.push(VarDecl { names, ty, line });
            if !matches!(self.cur().kind, TokenKind::Ident(_)) {
                break;
            }
        }
        Ok(())
    }

    fn parse_ident_list(&mut self) -> PResult<Vec<String>> {
        let mut names = vec![self.expect_ident()?];
        while self.eat(&TokenKind::Comma) {
            names.push(self.expect_ident()?);
        }
        Ok(names)
    }

    fn parse_subroutine(&mut self, is_function: bool) -> PResult<Subroutine> {
        let line = self.line();
        self.bump(); // FUNCTION | PROCEDURE
        let name = self.expect_ident()?;
        let params = if self.eat(&TokenKind::LParen) {
            let params = self.parse_param_list()?;
            self.expect(TokenKind::RParen)?;
            params
        } else {
            Vec::new()
        };
        let return_type = if is_function {
            self.expect(TokenKind::Colon)?;
            Some(self.parse_type_name()?)
        } else {
            None
        };
        self.expect(TokenKind::Semicolon)?;
        let block = self.parse_block()?;
        self.expect(TokenKind::Semicolon)?;
        Ok(Subroutine { name, params, return_type, block, line })
    }

    fn parse_param_list(&mut self) -> PResult<Vec<Param>> {
        let mut params = Vec::new();
        loop {
            let kind = if self.eat(&TokenKind::Var) {
                ParamKind::Var
            } else {
                ParamKind::Val
            };
            let names = self.parse_ident_list()?;
            self.expect(TokenKind::Colon)?;
            let ty = self.parse_type_name()?;
            params.push(Param { names, ty, kind });
            if !self.eat(&TokenKind::Semicolon) {
                break;
            }
        }
        Ok(params)
    }

    fn parse_type_name(&mut self) -> PResult<TypeExpr> {
        match &self.cur().kind {
            TokenKind::KwInteger => {
                self.bump();
                Ok(TypeExpr::Named("integer".into()))
            }
            TokenKind::KwReal => {
                self.bump();
                Ok(TypeExpr::Named("real".into()))
            }
            TokenKind::KwBoolean => {
                self.bump();
                Ok(TypeExpr::Named("boolean".into()))
            }
            TokenKind::KwChar => {
                self.bump();
                Ok(TypeExpr::Named("char".into()))
            }
            TokenKind::Ident(s) => {
                let s = s.clone();
                self.bump();
                Ok(TypeExpr::Named(s))
            }
            other => Err(CompileError::syntax(self.line(), format!("expected type name, found {other:?}"))),
        }
    }

    fn parse_type_expr(&mut self) -> PResult<TypeExpr> {
        match &self.cur().kind {
            TokenKind::Packed => {
                self.bump();
                Ok(TypeExpr::Packed(Box::new(self.parse_type_expr()?)))
            }
            TokenKind::Array => {
                self.bump();
                self.expect(TokenKind::LBracket)?;
                let lower = self.parse_expr()?;
                self.expect(TokenKind::DotDot)?;
                let upper = self.parse_expr()?;
                self.expect(TokenKind::RBracket)?;
                self.expect(TokenKind::Of)?;
                let elem = Box::new(self.parse_type_expr()?);
                Ok(TypeExpr::Array { lower, upper, elem })
            }
            TokenKind::Set => {
                self.bump();
                self.expect(TokenKind::Of)?;
                Ok(TypeExpr::Set(Box::new(self.parse_type_expr()?)))
            }
            TokenKind::File => {
                self.bump();
                self.expect(TokenKind::Of)?;
                Ok(TypeExpr::FileOf(Box::new(self.parse_type_expr()?)))
            }
            TokenKind::Record => {
                self.bump();
                let (fields, variant) = self.parse_field_list()?;
                self.expect(TokenKind::End)?;
                Ok(TypeExpr::Record { fields, variant })
            }
            TokenKind::LParen => {
                self.bump();
                let members = self.parse_ident_list()?;
                self.expect(TokenKind::RParen)?;
                Ok(TypeExpr::Enum(members))
            }
            _ => {
                let lower = self.parse_expr()?;
                if self.eat(&TokenKind::DotDot) {
                    let upper = self.parse_expr()?;
                    Ok(TypeExpr::Subrange { lower, upper })
                } else if let Expr::Ident(name, _) = lower {
                    Ok(TypeExpr::Named(name))
                } else {
                    Err(CompileError::syntax(self.line(), "expected a type"))
                }
            }
        }
    }

    fn parse_field_list(&mut self) -> PResult<(Vec<VarDecl>, Option<VariantPart>)> {
        let mut fields = Vec::new();
        let mut variant = None;
        loop {
            if self.at(&TokenKind::Case) {
                variant = Some(self.parse_variant_part()?);
                break;
            }
            if self.at(&TokenKind::End) {
                break;
            }
            let line = self.line();
            let names = self.parse_ident_list()?;
            self.expect(TokenKind::Colon)?;
            let ty = self.parse_type_expr()?;
            fields.push(VarDecl { names, ty, line });
            if !self.eat(&TokenKind::Semicolon) {
                break;
            }
        }
        Ok((fields, variant))
    }

    fn parse_variant_part(&mut self) -> PResult<VariantPart> {
        self.expect(TokenKind::Case)?;
        let discriminant_name = self.expect_ident()?;
        let discriminant_type = if self.eat(&TokenKind::Colon) {
            Some(match self.parse_type_name()? {
                TypeExpr::Named(n) => n,
                _ => unreachable!(),
            })
        } else {
            None
        };
        self.expect(TokenKind::Of)?;
        let mut branches = Vec::new();
        loop {
            let mut labels = vec![self.parse_expr()?];
            while self.eat(&TokenKind::Comma) {
                labels.push(self.parse_expr()?);
            }
            self.expect(TokenKind::Colon)?;
            self.expect(TokenKind::LParen)?;
            let (fields, _) = self.parse_field_list()?;
            self.expect(TokenKind::RParen)?;
            branches.push(VariantBranch { labels, fields });
            if !self.eat(&TokenKind::Semicolon) || self.at(&TokenKind::End) {
                break;
            }
        }
        Ok(VariantPart { discriminant_name, discriminant_type, branches })
    }

    fn parse_stmt_list(&mut self) -> PResult<Vec<Stmt>> {
        let mut stmts = vec![self.parse_stmt()?];
        while self.eat(&TokenKind::Semicolon) {
            if self.at(&TokenKind::End) || self.at(&TokenKind::Until) {
                break;
            }
            stmts.push(self.parse_stmt()?);
        }
        Ok(stmts)
    }

    fn parse_stmt(&mut self) -> PResult<Stmt> {
        if let TokenKind::IntLiteral(n) = self.cur().kind {
            if matches!(self.tokens.get(self.pos + 1).map(|t| &t.kind), Some(TokenKind::Colon)) {
                let line = self.line();
                self.bump();
                self.bump();
                let stmt = self.parse_stmt()?;
                return Ok(Stmt::Labeled { label: n, stmt: Box::new(stmt), line });
            }
        }
        match &self.cur().kind {
            TokenKind::Begin => {
                self.bump();
                let stmts = self.parse_stmt_list()?;
                self.expect(TokenKind::End)?;
                Ok(Stmt::Compound(stmts))
            }
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::Repeat => self.parse_repeat(),
            TokenKind::For => self.parse_for(),
            TokenKind::Case => self.parse_case(),
            TokenKind::With => self.parse_with(),
            TokenKind::Goto => {
                let line = self.line();
                self.bump();
                match self.cur().kind {
                    TokenKind::IntLiteral(n) => {
                        self.bump();
                        Ok(Stmt::Goto { label: n, line })
                    }
                    _ => Err(CompileError::syntax(self.line(), "expected label after 'goto'")),
                }
            }
            TokenKind::Ident(_) => self.parse_assign_or_call(),
            TokenKind::End | TokenKind::Until | TokenKind::Semicolon => Ok(Stmt::Empty),
            other => Err(CompileError::syntax(self.line(), format!("unexpected token {other:?} in statement"))),
        }
    }

    fn parse_if(&mut self) -> PResult<Stmt> {
        let line = self.line();
        self.expect(TokenKind::If)?;
        let cond = self.parse_expr()?;
        self.expect(TokenKind::Then)?;
        let then_branch = Box::new(self.parse_stmt()?);
        let else_branch = if self.eat(&TokenKind::Else) {
            Some(Box::new(self.parse_stmt()?))
        } else {
            None
        };
        Ok(Stmt::If { cond, then_branch, else_branch, line })
    }

    fn parse_while(&mut self) -> PResult<Stmt> {
        let line = self.line();
        self.expect(TokenKind::While)?;
        let cond = self.parse_expr()?;
        self.expect(TokenKind::Do)?;
        let body = Box::new(self.parse_stmt()?);
        Ok(Stmt::While { cond, body, line })
    }

    fn parse_repeat(&mut self) -> PResult<Stmt> {
        let line = self.line();
        self.expect(TokenKind::Repeat)?;
        let body = self.parse_stmt_list()?;
        self.expect(TokenKind::Until)?;
        let cond = self.parse_expr()?;
        Ok(Stmt::Repeat { body, cond, line })
    }

    fn parse_for(&mut self) -> PResult<Stmt> {
        let line = self.line();
        self.expect(TokenKind::For)?;
        let var = self.expect_ident()?;
        self.expect(TokenKind::Assign)?;
        let start = self.parse_expr()?;
        let downto = if self.eat(&TokenKind::To) {
            false
        } else {
            self.expect(TokenKind::Downto)?;
            true
        };
        let end = self.parse_expr()?;
        self.expect(TokenKind::Do)?;
        let body = Box::new(self.parse_stmt()?);
        Ok(Stmt::For { var, start, end, downto, body, line })
    }

    fn parse_case(&mut self) -> PResult<Stmt> {
        let line = self.line();
        self.expect(TokenKind::Case)?;
        let scrutinee = self.parse_expr()?;
        self.expect(TokenKind::Of)?;
        let mut arms = Vec::new();
        loop {
            let mut labels = vec![self.parse_expr()?];
            while self.eat(&TokenKind::Comma) {
                labels.push(self.parse_expr()?);
            }
            self.expect(TokenKind::Colon)?;
            let stmt = self.parse_stmt()?;
            arms.push(CaseArm { labels, stmt });
            if !self.eat(&TokenKind::Semicolon) || self.at(&TokenKind::End) {
                break;
            }
        }
        self.expect(TokenKind::End)?;
        Ok(Stmt::Case { scrutinee, arms, line })
    }

    fn parse_with(&mut self) -> PResult<Stmt> {
        let line = self.line();
        self.expect(TokenKind::With)?;
        let vars = self.parse_ident_list()?;
        self.expect(TokenKind::Do)?;
        let body = Box::new(self.parse_stmt()?);
        Ok(Stmt::With { vars, body, line })
    }

    fn parse_assign_or_call(&mut self) -> PResult<Stmt> {
        let line = self.line();
        let name = self.expect_ident()?;
        if self.eat(&TokenKind::LParen) {
            let args = self.parse_expr_list()?;
            self.expect(TokenKind::RParen)?;
            if self.eat(&TokenKind::Assign) {
                // A call-shaped lvalue only arises as `f(...) := ...`, which
                // this dialect never produces; reject explicitly.
                return Err(CompileError::syntax(line, "cannot assign to a call expression"));
            }
            return Ok(Stmt::Call { name, args, line });
        }
        let mut lvalue = LValue::Var { name, line };
        loop {
            if self.eat(&TokenKind::LBracket) {
                let index = self.parse_expr()?;
                self.expect(TokenKind::RBracket)?;
                lvalue = LValue::Array { base: Box::new(lvalue), index, line };
            } else if self.eat(&TokenKind::Dot) {
                let field = self.expect_ident()?;
                lvalue = LValue::Field { base: Box::new(lvalue), field, line };
            } else {
                break;
            }
        }
        if self.eat(&TokenKind::Assign) {
            let expr = self.parse_expr()?;
            Ok(Stmt::Assign { lvalue, expr, line })
        } else if let LValue::Var { name, line } = lvalue {
            Ok(Stmt::Call { name, args: Vec::new(), line })
        } else {
            Err(CompileError::syntax(line, "expected ':=' after array or field access"))
        }
    }

    fn parse_expr_list(&mut self) -> PResult<Vec<Expr>> {
        if self.at(&TokenKind::RParen) {
            return Ok(Vec::new());
        }
        let mut exprs = vec![self.parse_expr()?];
        while self.eat(&TokenKind::Comma) {
            exprs.push(self.parse_expr()?);
        }
        Ok(exprs)
    }

    // --- expressions, precedence climbing low to high ---

    pub fn parse_expr(&mut self) -> PResult<Expr> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> PResult<Expr> {
        let mut lhs = self.parse_and()?;
        while self.at(&TokenKind::Or) {
            let line = self.line();
            self.bump();
            let rhs = self.parse_and()?;
            lhs = Expr::BinOp { op: BinOpKind::Or, lhs: Box::new(lhs), rhs: Box::new(rhs), line };
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> PResult<Expr> {
        let mut lhs = self.parse_not()?;
        while self.at(&TokenKind::And) {
            let line = self.line();
            self.bump();
            let rhs = self.parse_not()?;
            lhs = Expr::BinOp { op: BinOpKind::And, lhs: Box::new(lhs), rhs: Box::new(rhs), line };
        }
        Ok(lhs)
    }

    fn parse_not(&mut self) -> PResult<Expr> {
        if self.at(&TokenKind::Not) {
            let line = self.line();
            self.bump();
            let expr = Box::new(self.parse_not()?);
            return Ok(Expr::Not { expr, line });
        }
        self.parse_rel()
    }

    fn parse_rel(&mut self) -> PResult<Expr> {
        let lhs = self.parse_add()?;
        let op = match &self.cur().kind {
            TokenKind::Eq => BinOpKind::Eq,
            TokenKind::Ne => BinOpKind::Ne,
            TokenKind::Lt => BinOpKind::Lt,
            TokenKind::Le => BinOpKind::Le,
            TokenKind::Gt => BinOpKind::Gt,
            TokenKind::Ge => BinOpKind::Ge,
            TokenKind::In => BinOpKind::In,
            _ => return Ok(lhs),
        };
        let line = self.line();
        self.bump();
        let rhs = self.parse_add()?;
        Ok(Expr::BinOp { op, lhs: Box::new(lhs), rhs: Box::new(rhs), line })
    }

    fn parse_add(&mut self) -> PResult<Expr> {
        let mut lhs = self.parse_mul()?;
        loop {
            let op = match &self.cur().kind {
                TokenKind::Plus => BinOpKind::Add,
                TokenKind::Minus => BinOpKind::Sub,
                _ => break,
            };
            let line = self.line();
            self.bump();
            let rhs = self.parse_mul()?;
            lhs = Expr::BinOp { op, lhs: Box::new(lhs), rhs: Box::new(rhs), line };
        }
        Ok(lhs)
    }

    fn parse_mul(&mut self) -> PResult<Expr> {
        let mut lhs = self.parse_fmt()?;
        loop {
            let op = match &self.cur().kind {
                TokenKind::Star => BinOpKind::Mul,
                TokenKind::Slash => BinOpKind::Div,
                TokenKind::Div => BinOpKind::IDiv,
                TokenKind::Mod => BinOpKind::Mod,
                _ => break,
            };
            let line = self.line();
            self.bump();
            let rhs = self.parse_fmt()?;
            lhs = Expr::BinOp { op, lhs: Box::new(lhs), rhs: Box::new(rhs), line };
        }
        Ok(lhs)
    }

    /// `E : W` and `(E : W) : P`, folded into a single `Fmt` node: a second
    /// `:` re-applied to an already-folded width-only node adds precision.
    fn parse_fmt(&mut self) -> PResult<Expr> {
        let mut lhs = self.parse_unary()?;
        while self.at(&TokenKind::Colon) {
            let line = self.line();
            self.bump();
            let rhs = self.parse_unary()?;
            lhs = match lhs {
                Expr::Fmt { expr, width, precision: None, .. } => {
                    Expr::Fmt { expr, width, precision: Some(Box::new(rhs)), line }
                }
                other => Expr::Fmt { expr: Box::new(other), width: Box::new(rhs), precision: None, line },
            };
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> PResult<Expr> {
        match &self.cur().kind {
            TokenKind::Minus => {
                let line = self.line();
                self.bump();
                let operand = self.parse_unary()?;
                Ok(Expr::BinOp {
                    op: BinOpKind::Sub,
                    lhs: Box::new(Expr::IntLit(0, line)),
                    rhs: Box::new(operand),
                    line,
                })
            }
            TokenKind::Plus => {
                self.bump();
                self.parse_unary()
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> PResult<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            if self.eat(&TokenKind::LBracket) {
                let line = self.line();
                let index = self.parse_expr()?;
                self.expect(TokenKind::RBracket)?;
                expr = Expr::Index { base: Box::new(expr), index: Box::new(index), line };
            } else if self.at(&TokenKind::Dot) {
                // Range operator `..` is lexed distinctly, so a bare `.` here
                // is always field access.
                let line = self.line();
                self.bump();
                let field = self.expect_ident()?;
                expr = Expr::Field { base: Box::new(expr), field, line };
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> PResult<Expr> {
        let line = self.line();
        match self.cur().kind.clone() {
            TokenKind::IntLiteral(v) => {
                self.bump();
                Ok(Expr::IntLit(v, line))
            }
            TokenKind::RealLiteral(v) => {
                self.bump();
                Ok(Expr::RealLit(v, line))
            }
            TokenKind::CharLiteral(c) => {
                self.bump();
                Ok(Expr::CharLit(c, line))
            }
            TokenKind::StringLiteral(s) => {
                self.bump();
                Ok(Expr::StringLit(s, line))
            }
            TokenKind::BoolLiteral(b) => {
                self.bump();
                Ok(Expr::BoolLit(b, line))
            }
            TokenKind::LParen => {
                self.bump();
                let expr = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                Ok(expr)
            }
            TokenKind::LBracket => {
                self.bump();
                let elems = self.parse_expr_list()?;
                self.expect(TokenKind::RBracket)?;
                Ok(Expr::SetLit { elems, line })
            }
            TokenKind::Ident(name) => {
                self.bump();
                if self.eat(&TokenKind::LParen) {
                    let args = self.parse_expr_list()?;
                    self.expect(TokenKind::RParen)?;
                    Ok(Expr::Call { name, args, line })
                } else {
                    Ok(Expr::Ident(name, line))
                }
            }
            TokenKind::KwInteger | TokenKind::KwReal | TokenKind::KwBoolean | TokenKind::KwChar => {
                // Type-name cast applied like a call: `real(x)`.
                let name = match self.bump().kind {
                    TokenKind::KwInteger => "integer",
                    TokenKind::KwReal => "real",
                    TokenKind::KwBoolean => "boolean",
                    TokenKind::KwChar => "char",
                    _ => unreachable!(),
                }
                .to_string();
                self.expect(TokenKind::LParen)?;
                let args = self.parse_expr_list()?;
                self.expect(TokenKind::RParen)?;
                Ok(Expr::Call { name, args, line })
            }
            other => Err(CompileError::syntax(line, format!("unexpected token {other:?} in expression"))),
        }
    }
}

pub fn parse(tokens: Vec<Token>) -> PResult<Program> {
    Parser::new(tokens).parse_program()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;

    fn parse_src(src: &str) -> Program {
        parse(lex(src).unwrap()).unwrap()
    }

    #[test]
    fn hello_world() {
        let program = parse_src(
            r#"program hello;
            begin
              writeln('hi')
            end."#,
        );
        assert_eq!(program.name, "hello");
        assert_eq!(program.block.body.len(), 1);
    }

    #[test]
    fn dangling_else_binds_to_nearest_if() {
        let program = parse_src(
            r#"program p;
            var x: integer;
            begin
              if x > 0 then
                if x > 1 then
                  x := 1
                else
                  x := 2
            end."#,
        );
        let Stmt::If { then_branch, else_branch: outer_else, .. } = &program.block.body[0] else {
            panic!("expected an outer if statement");
        };
        assert!(outer_else.is_none(), "the else must bind to the inner if, not the outer one");
        let Stmt::If { else_branch: inner_else, .. } = then_branch.as_ref() else {
            panic!("expected the outer if's then-branch to be the inner if");
        };
        assert!(inner_else.is_some());
    }

    #[test]
    fn colon_format_folds_into_fmt_node() {
        let program = parse_src(
            r#"program p;
            begin
              writeln(1:5:2)
            end."#,
        );
        let Stmt::Call { args, .. } = &program.block.body[0] else {
            panic!("expected a call statement");
        };
        assert!(matches!(args[0], Expr::Fmt { precision: Some(_), .. }));
    }

    #[test]
    fn unexpected_token_is_a_syntax_error() {
        let err = parse(lex("program p; begin := end.").unwrap()).unwrap_err();
        assert!(matches!(err, CompileError::Syntax { .. }));
    }
}
