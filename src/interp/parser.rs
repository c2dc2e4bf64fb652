//! Recursive-descent parser for the snippet language.
//!
//! Statements and patterns are parsed directly; expressions use precedence
//! climbing. Arrow-function parameter lists are disambiguated from
//! parenthesized expressions by attempting a parameter parse and restoring
//! the token position when no `=>` follows.
//!
//! The parser also performs the one static check the engine guarantees at
//! parse time: a binding declared twice in the same block is rejected here,
//! so redeclaration faults are load-time `Syntax` faults, never execution
//! faults.

use std::collections::HashSet;

use crate::interp::ast::*;
use crate::interp::lexer::{lex, Keyword, Punct, Token, TplPart};
use crate::interp::RuntimeError;

pub fn parse(source: &str) -> Result<Vec<Stmt>, RuntimeError> {
    let tokens = lex(source)?;
    let mut parser = Parser { tokens, pos: 0 };
    parser.parse_program()
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn check_punct(&self, punct: Punct) -> bool {
        matches!(self.peek(), Some(Token::Punct(p)) if *p == punct)
    }

    fn eat_punct(&mut self, punct: Punct) -> bool {
        if self.check_punct(punct) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_punct(&mut self, punct: Punct) -> Result<(), RuntimeError> {
        if self.eat_punct(punct) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("expected `{punct:?}`")))
        }
    }

    fn check_keyword(&self, keyword: Keyword) -> bool {
        matches!(self.peek(), Some(Token::Keyword(k)) if *k == keyword)
    }

    fn eat_keyword(&mut self, keyword: Keyword) -> bool {
        if self.check_keyword(keyword) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_ident(&mut self) -> Result<String, RuntimeError> {
        match self.bump() {
            Some(Token::Ident(name)) => Ok(name),
            _ => Err(RuntimeError::syntax("expected an identifier")),
        }
    }

    /// Property names may be keywords (`promise.catch`).
    fn expect_property_name(&mut self) -> Result<String, RuntimeError> {
        match self.bump() {
            Some(Token::Ident(name)) => Ok(name),
            Some(Token::Keyword(k)) => Ok(k.as_str().to_string()),
            _ => Err(RuntimeError::syntax("expected a property name")),
        }
    }

    fn unexpected(&self, context: &str) -> RuntimeError {
        match self.peek() {
            Some(token) => RuntimeError::syntax(format!("{context}, found {token:?}")),
            None => RuntimeError::syntax(format!("{context}, found end of input")),
        }
    }

    // ============================================================
    // Statements
    // ============================================================

    fn parse_program(&mut self) -> Result<Vec<Stmt>, RuntimeError> {
        let mut stmts = Vec::new();
        while !self.at_end() {
            if self.eat_punct(Punct::Semi) {
                continue;
            }
            stmts.push(self.parse_stmt()?);
        }
        check_redeclarations(&stmts)?;
        Ok(stmts)
    }

    fn parse_block(&mut self) -> Result<Vec<Stmt>, RuntimeError> {
        self.expect_punct(Punct::LBrace)?;
        let mut stmts = Vec::new();
        loop {
            if self.eat_punct(Punct::RBrace) {
                break;
            }
            if self.at_end() {
                return Err(RuntimeError::syntax("unterminated block, expected `}`"));
            }
            if self.eat_punct(Punct::Semi) {
                continue;
            }
            stmts.push(self.parse_stmt()?);
        }
        check_redeclarations(&stmts)?;
        Ok(stmts)
    }

    fn parse_stmt(&mut self) -> Result<Stmt, RuntimeError> {
        match self.peek() {
            Some(Token::Keyword(Keyword::Let)) => {
                self.pos += 1;
                self.parse_decl(true)
            }
            Some(Token::Keyword(Keyword::Const)) => {
                self.pos += 1;
                self.parse_decl(false)
            }
            Some(Token::Keyword(Keyword::Function)) => {
                self.pos += 1;
                self.parse_func_decl(false)
            }
            Some(Token::Keyword(Keyword::Async))
                if matches!(self.peek_at(1), Some(Token::Keyword(Keyword::Function))) =>
            {
                self.pos += 2;
                self.parse_func_decl(true)
            }
            Some(Token::Keyword(Keyword::Return)) => {
                self.pos += 1;
                let value = if self.at_end()
                    || self.check_punct(Punct::Semi)
                    || self.check_punct(Punct::RBrace)
                {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                Ok(Stmt::Return(value))
            }
            Some(Token::Keyword(Keyword::If)) => self.parse_if(),
            Some(Token::Keyword(Keyword::While)) => {
                self.pos += 1;
                self.expect_punct(Punct::LParen)?;
                let cond = self.parse_expr()?;
                self.expect_punct(Punct::RParen)?;
                let body = self.parse_block()?;
                Ok(Stmt::While { cond, body })
            }
            Some(Token::Keyword(Keyword::For)) => self.parse_for(),
            Some(Token::Keyword(Keyword::Try)) => self.parse_try(),
            Some(Token::Keyword(Keyword::Throw)) => {
                self.pos += 1;
                Ok(Stmt::Throw(self.parse_expr()?))
            }
            Some(Token::Keyword(Keyword::Break)) => {
                self.pos += 1;
                Ok(Stmt::Break)
            }
            Some(Token::Keyword(Keyword::Continue)) => {
                self.pos += 1;
                Ok(Stmt::Continue)
            }
            Some(Token::Punct(Punct::LBrace)) => Ok(Stmt::Block(self.parse_block()?)),
            _ => Ok(Stmt::Expr(self.parse_expr()?)),
        }
    }

    fn parse_decl(&mut self, mutable: bool) -> Result<Stmt, RuntimeError> {
        let pattern = self.parse_pattern()?;
        let init = if self.eat_punct(Punct::Assign) {
            Some(self.parse_expr()?)
        } else {
            None
        };
        if !mutable && init.is_none() {
            return Err(RuntimeError::syntax(
                "Missing initializer in const declaration",
            ));
        }
        Ok(Stmt::Decl {
            mutable,
            pattern,
            init,
        })
    }

    fn parse_func_decl(&mut self, is_async: bool) -> Result<Stmt, RuntimeError> {
        let name = self.expect_ident()?;
        let params = self.parse_params()?;
        let body = FuncBody::Block(self.parse_block()?);
        Ok(Stmt::Func {
            name: name.clone(),
            func: FuncLit {
                name: Some(name),
                params,
                body,
                is_async,
            },
        })
    }

    fn parse_if(&mut self) -> Result<Stmt, RuntimeError> {
        self.pos += 1;
        self.expect_punct(Punct::LParen)?;
        let cond = self.parse_expr()?;
        self.expect_punct(Punct::RParen)?;
        let then = self.parse_block()?;
        let otherwise = if self.eat_keyword(Keyword::Else) {
            if self.check_keyword(Keyword::If) {
                Some(Box::new(self.parse_if()?))
            } else {
                Some(Box::new(Stmt::Block(self.parse_block()?)))
            }
        } else {
            None
        };
        Ok(Stmt::If {
            cond,
            then,
            otherwise,
        })
    }

    fn parse_for(&mut self) -> Result<Stmt, RuntimeError> {
        self.pos += 1;
        self.expect_punct(Punct::LParen)?;

        if self.check_keyword(Keyword::Let) || self.check_keyword(Keyword::Const) {
            let mutable = self.eat_keyword(Keyword::Let);
            if !mutable {
                self.pos += 1; // const
            }
            let pattern = self.parse_pattern()?;

            if self.eat_keyword(Keyword::Of) {
                let iter = self.parse_expr()?;
                self.expect_punct(Punct::RParen)?;
                let body = self.parse_block()?;
                return Ok(Stmt::ForOf {
                    mutable,
                    pattern,
                    iter,
                    body,
                });
            }

            self.expect_punct(Punct::Assign)?;
            let init_value = self.parse_expr()?;
            let init = Some(Box::new(Stmt::Decl {
                mutable,
                pattern,
                init: Some(init_value),
            }));
            self.expect_punct(Punct::Semi)?;
            return self.parse_for_tail(init);
        }

        let init = if self.check_punct(Punct::Semi) {
            None
        } else {
            Some(Box::new(Stmt::Expr(self.parse_expr()?)))
        };
        self.expect_punct(Punct::Semi)?;
        self.parse_for_tail(init)
    }

    fn parse_for_tail(&mut self, init: Option<Box<Stmt>>) -> Result<Stmt, RuntimeError> {
        let cond = if self.check_punct(Punct::Semi) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect_punct(Punct::Semi)?;
        let update = if self.check_punct(Punct::RParen) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect_punct(Punct::RParen)?;
        let body = self.parse_block()?;
        Ok(Stmt::For {
            init,
            cond,
            update,
            body,
        })
    }

    fn parse_try(&mut self) -> Result<Stmt, RuntimeError> {
        self.pos += 1;
        let block = self.parse_block()?;
        let catch = if self.eat_keyword(Keyword::Catch) {
            let param = if self.eat_punct(Punct::LParen) {
                let pattern = self.parse_pattern()?;
                self.expect_punct(Punct::RParen)?;
                Some(pattern)
            } else {
                None
            };
            Some(CatchClause {
                param,
                body: self.parse_block()?,
            })
        } else {
            None
        };
        let finally = if self.eat_keyword(Keyword::Finally) {
            Some(self.parse_block()?)
        } else {
            None
        };
        if catch.is_none() && finally.is_none() {
            return Err(RuntimeError::syntax("Missing catch or finally after try"));
        }
        Ok(Stmt::Try {
            block,
            catch,
            finally,
        })
    }

    // ============================================================
    // Patterns and parameters
    // ============================================================

    fn parse_pattern(&mut self) -> Result<Pattern, RuntimeError> {
        match self.peek() {
            Some(Token::Ident(_)) => Ok(Pattern::Ident(self.expect_ident()?)),
            Some(Token::Punct(Punct::LBracket)) => self.parse_array_pattern(),
            Some(Token::Punct(Punct::LBrace)) => self.parse_object_pattern(),
            _ => Err(self.unexpected("expected a binding pattern")),
        }
    }

    fn parse_array_pattern(&mut self) -> Result<Pattern, RuntimeError> {
        self.pos += 1;
        let mut elements = Vec::new();
        let mut rest = None;
        loop {
            if self.eat_punct(Punct::RBracket) {
                break;
            }
            if self.check_punct(Punct::Comma) {
                self.pos += 1;
                elements.push(None);
                continue;
            }
            if self.eat_punct(Punct::Ellipsis) {
                rest = Some(Box::new(self.parse_pattern()?));
                self.expect_punct(Punct::RBracket)?;
                break;
            }
            let pattern = self.parse_pattern()?;
            let default = if self.eat_punct(Punct::Assign) {
                Some(self.parse_expr()?)
            } else {
                None
            };
            elements.push(Some(ArrayPatternElem { pattern, default }));
            if !self.eat_punct(Punct::Comma) {
                self.expect_punct(Punct::RBracket)?;
                break;
            }
        }
        Ok(Pattern::Array { elements, rest })
    }

    fn parse_object_pattern(&mut self) -> Result<Pattern, RuntimeError> {
        self.pos += 1;
        let mut props = Vec::new();
        let mut rest = None;
        loop {
            if self.eat_punct(Punct::RBrace) {
                break;
            }
            if self.eat_punct(Punct::Ellipsis) {
                rest = Some(self.expect_ident()?);
                self.expect_punct(Punct::RBrace)?;
                break;
            }
            let key = match self.bump() {
                Some(Token::Ident(name)) => name,
                Some(Token::Str(text)) => text,
                _ => return Err(RuntimeError::syntax("expected a property key")),
            };
            let binding = if self.eat_punct(Punct::Colon) {
                self.parse_pattern()?
            } else {
                Pattern::Ident(key.clone())
            };
            let default = if self.eat_punct(Punct::Assign) {
                Some(self.parse_expr()?)
            } else {
                None
            };
            props.push(ObjectPatternProp {
                key,
                binding,
                default,
            });
            if !self.eat_punct(Punct::Comma) {
                self.expect_punct(Punct::RBrace)?;
                break;
            }
        }
        Ok(Pattern::Object { props, rest })
    }

    fn parse_params(&mut self) -> Result<Vec<Param>, RuntimeError> {
        self.expect_punct(Punct::LParen)?;
        let mut params = Vec::new();
        loop {
            if self.eat_punct(Punct::RParen) {
                break;
            }
            if self.eat_punct(Punct::Ellipsis) {
                params.push(Param {
                    pattern: self.parse_pattern()?,
                    default: None,
                    rest: true,
                });
                self.expect_punct(Punct::RParen)?;
                break;
            }
            let pattern = self.parse_pattern()?;
            let default = if self.eat_punct(Punct::Assign) {
                Some(self.parse_expr()?)
            } else {
                None
            };
            params.push(Param {
                pattern,
                default,
                rest: false,
            });
            if !self.eat_punct(Punct::Comma) {
                self.expect_punct(Punct::RParen)?;
                break;
            }
        }
        Ok(params)
    }

    // ============================================================
    // Expressions
    // ============================================================

    fn parse_expr(&mut self) -> Result<Expr, RuntimeError> {
        self.parse_assign()
    }

    fn parse_assign(&mut self) -> Result<Expr, RuntimeError> {
        if let Some(arrow) = self.try_parse_arrow()? {
            return Ok(arrow);
        }

        let lhs = self.parse_cond()?;

        let op = match self.peek() {
            Some(Token::Punct(Punct::Assign)) => None,
            Some(Token::Punct(Punct::PlusAssign)) => Some(BinaryOp::Add),
            Some(Token::Punct(Punct::MinusAssign)) => Some(BinaryOp::Sub),
            Some(Token::Punct(Punct::StarAssign)) => Some(BinaryOp::Mul),
            Some(Token::Punct(Punct::SlashAssign)) => Some(BinaryOp::Div),
            _ => return Ok(lhs),
        };
        self.pos += 1;

        if !matches!(
            lhs,
            Expr::Ident(_) | Expr::Member { .. } | Expr::Index { .. }
        ) {
            return Err(RuntimeError::syntax("Invalid assignment target"));
        }
        let value = self.parse_assign()?;
        Ok(Expr::Assign {
            target: Box::new(lhs),
            op,
            value: Box::new(value),
        })
    }

    /// Attempt to parse an arrow function at the current position. Restores
    /// the position and returns `None` when the tokens turn out not to start
    /// one.
    fn try_parse_arrow(&mut self) -> Result<Option<Expr>, RuntimeError> {
        let is_async = self.check_keyword(Keyword::Async)
            && matches!(
                self.peek_at(1),
                Some(Token::Ident(_)) | Some(Token::Punct(Punct::LParen))
            );
        let offset = usize::from(is_async);

        // Single-parameter shorthand: `x => ...`
        if let (Some(Token::Ident(_)), Some(Token::Punct(Punct::Arrow))) =
            (self.peek_at(offset), self.peek_at(offset + 1))
        {
            self.pos += offset;
            let name = self.expect_ident()?;
            self.pos += 1; // the arrow
            let body = self.parse_arrow_body()?;
            return Ok(Some(Expr::Func(FuncLit {
                name: None,
                params: vec![Param {
                    pattern: Pattern::Ident(name),
                    default: None,
                    rest: false,
                }],
                body,
                is_async,
            })));
        }

        if !matches!(self.peek_at(offset), Some(Token::Punct(Punct::LParen))) {
            return Ok(None);
        }

        let saved = self.pos;
        self.pos += offset;
        if let Ok(params) = self.parse_params() {
            if self.eat_punct(Punct::Arrow) {
                let body = self.parse_arrow_body()?;
                return Ok(Some(Expr::Func(FuncLit {
                    name: None,
                    params,
                    body,
                    is_async,
                })));
            }
        }
        self.pos = saved;
        Ok(None)
    }

    fn parse_arrow_body(&mut self) -> Result<FuncBody, RuntimeError> {
        if self.check_punct(Punct::LBrace) {
            Ok(FuncBody::Block(self.parse_block()?))
        } else {
            Ok(FuncBody::Expr(Box::new(self.parse_assign()?)))
        }
    }

    fn parse_cond(&mut self) -> Result<Expr, RuntimeError> {
        let cond = self.parse_or()?;
        if self.eat_punct(Punct::Question) {
            let then = self.parse_assign()?;
            self.expect_punct(Punct::Colon)?;
            let otherwise = self.parse_assign()?;
            return Ok(Expr::Cond {
                cond: Box::new(cond),
                then: Box::new(then),
                otherwise: Box::new(otherwise),
            });
        }
        Ok(cond)
    }

    fn parse_or(&mut self) -> Result<Expr, RuntimeError> {
        let mut lhs = self.parse_and()?;
        while self.eat_punct(Punct::OrOr) {
            let rhs = self.parse_and()?;
            lhs = Expr::Logical {
                op: LogicalOp::Or,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, RuntimeError> {
        let mut lhs = self.parse_equality()?;
        while self.eat_punct(Punct::AndAnd) {
            let rhs = self.parse_equality()?;
            lhs = Expr::Logical {
                op: LogicalOp::And,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_equality(&mut self) -> Result<Expr, RuntimeError> {
        let mut lhs = self.parse_relational()?;
        loop {
            let op = match self.peek() {
                Some(Token::Punct(Punct::Eq)) => BinaryOp::Eq,
                Some(Token::Punct(Punct::StrictEq)) => BinaryOp::StrictEq,
                Some(Token::Punct(Punct::NotEq)) => BinaryOp::NotEq,
                Some(Token::Punct(Punct::StrictNotEq)) => BinaryOp::StrictNotEq,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.parse_relational()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
    }

    fn parse_relational(&mut self) -> Result<Expr, RuntimeError> {
        let mut lhs = self.parse_additive()?;
        loop {
            let op = match self.peek() {
                Some(Token::Punct(Punct::Lt)) => BinaryOp::Lt,
                Some(Token::Punct(Punct::LtEq)) => BinaryOp::LtEq,
                Some(Token::Punct(Punct::Gt)) => BinaryOp::Gt,
                Some(Token::Punct(Punct::GtEq)) => BinaryOp::GtEq,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.parse_additive()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
    }

    fn parse_additive(&mut self) -> Result<Expr, RuntimeError> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Token::Punct(Punct::Plus)) => BinaryOp::Add,
                Some(Token::Punct(Punct::Minus)) => BinaryOp::Sub,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.parse_multiplicative()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, RuntimeError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Punct(Punct::Star)) => BinaryOp::Mul,
                Some(Token::Punct(Punct::Slash)) => BinaryOp::Div,
                Some(Token::Punct(Punct::Percent)) => BinaryOp::Rem,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, RuntimeError> {
        match self.peek() {
            Some(Token::Punct(Punct::Not)) => {
                self.pos += 1;
                Ok(Expr::Unary {
                    op: UnaryOp::Not,
                    operand: Box::new(self.parse_unary()?),
                })
            }
            Some(Token::Punct(Punct::Minus)) => {
                self.pos += 1;
                Ok(Expr::Unary {
                    op: UnaryOp::Neg,
                    operand: Box::new(self.parse_unary()?),
                })
            }
            Some(Token::Keyword(Keyword::Typeof)) => {
                self.pos += 1;
                Ok(Expr::TypeOf(Box::new(self.parse_unary()?)))
            }
            Some(Token::Keyword(Keyword::Await)) => {
                self.pos += 1;
                Ok(Expr::Await(Box::new(self.parse_unary()?)))
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> Result<Expr, RuntimeError> {
        let mut expr = self.parse_primary()?;
        loop {
            if self.eat_punct(Punct::Dot) {
                let property = self.expect_property_name()?;
                expr = Expr::Member {
                    object: Box::new(expr),
                    property,
                    optional: false,
                };
            } else if self.eat_punct(Punct::OptChain) {
                if self.eat_punct(Punct::LParen) {
                    let args = self.parse_args()?;
                    expr = Expr::Call {
                        callee: Box::new(expr),
                        args,
                        optional: true,
                    };
                } else {
                    let property = self.expect_property_name()?;
                    expr = Expr::Member {
                        object: Box::new(expr),
                        property,
                        optional: true,
                    };
                }
            } else if self.eat_punct(Punct::LBracket) {
                let index = self.parse_expr()?;
                self.expect_punct(Punct::RBracket)?;
                expr = Expr::Index {
                    object: Box::new(expr),
                    index: Box::new(index),
                };
            } else if self.eat_punct(Punct::LParen) {
                let args = self.parse_args()?;
                expr = Expr::Call {
                    callee: Box::new(expr),
                    args,
                    optional: false,
                };
            } else {
                return Ok(expr);
            }
        }
    }

    /// Argument list; the opening paren has already been consumed.
    fn parse_args(&mut self) -> Result<Vec<Arg>, RuntimeError> {
        let mut args = Vec::new();
        loop {
            if self.eat_punct(Punct::RParen) {
                break;
            }
            let arg = if self.eat_punct(Punct::Ellipsis) {
                Arg::Spread(self.parse_assign()?)
            } else {
                Arg::Item(self.parse_assign()?)
            };
            args.push(arg);
            if !self.eat_punct(Punct::Comma) {
                self.expect_punct(Punct::RParen)?;
                break;
            }
        }
        Ok(args)
    }

    fn parse_primary(&mut self) -> Result<Expr, RuntimeError> {
        match self.peek() {
            Some(Token::Number(_)) => match self.bump() {
                Some(Token::Number(n)) => Ok(Expr::Number(n)),
                _ => unreachable!(),
            },
            Some(Token::Str(_)) => match self.bump() {
                Some(Token::Str(s)) => Ok(Expr::Str(s)),
                _ => unreachable!(),
            },
            Some(Token::Template(_)) => match self.bump() {
                Some(Token::Template(parts)) => self.build_template(parts),
                _ => unreachable!(),
            },
            Some(Token::Keyword(Keyword::True)) => {
                self.pos += 1;
                Ok(Expr::Bool(true))
            }
            Some(Token::Keyword(Keyword::False)) => {
                self.pos += 1;
                Ok(Expr::Bool(false))
            }
            Some(Token::Keyword(Keyword::Null)) => {
                self.pos += 1;
                Ok(Expr::Null)
            }
            Some(Token::Keyword(Keyword::Undefined)) => {
                self.pos += 1;
                Ok(Expr::Undefined)
            }
            Some(Token::Keyword(Keyword::Function)) => {
                self.pos += 1;
                self.parse_func_expr(false)
            }
            Some(Token::Keyword(Keyword::Async))
                if matches!(self.peek_at(1), Some(Token::Keyword(Keyword::Function))) =>
            {
                self.pos += 2;
                self.parse_func_expr(true)
            }
            Some(Token::Keyword(Keyword::New)) => {
                self.pos += 1;
                let ctor = self.expect_ident()?;
                self.expect_punct(Punct::LParen)?;
                let args = self.parse_args()?;
                Ok(Expr::New { ctor, args })
            }
            Some(Token::Ident(_)) => Ok(Expr::Ident(self.expect_ident()?)),
            Some(Token::Punct(Punct::LParen)) => {
                self.pos += 1;
                let expr = self.parse_expr()?;
                self.expect_punct(Punct::RParen)?;
                Ok(expr)
            }
            Some(Token::Punct(Punct::LBracket)) => self.parse_array_literal(),
            Some(Token::Punct(Punct::LBrace)) => self.parse_object_literal(),
            _ => Err(self.unexpected("expected an expression")),
        }
    }

    fn parse_func_expr(&mut self, is_async: bool) -> Result<Expr, RuntimeError> {
        let name = match self.peek() {
            Some(Token::Ident(_)) => Some(self.expect_ident()?),
            _ => None,
        };
        let params = self.parse_params()?;
        let body = FuncBody::Block(self.parse_block()?);
        Ok(Expr::Func(FuncLit {
            name,
            params,
            body,
            is_async,
        }))
    }

    fn build_template(&mut self, parts: Vec<TplPart>) -> Result<Expr, RuntimeError> {
        let mut exprs = Vec::new();
        for part in parts {
            match part {
                TplPart::Lit(text) => exprs.push(TplExpr::Lit(text)),
                TplPart::Expr(tokens) => {
                    let mut sub = Parser { tokens, pos: 0 };
                    let expr = sub.parse_expr()?;
                    if !sub.at_end() {
                        return Err(RuntimeError::syntax(
                            "unexpected token in template interpolation",
                        ));
                    }
                    exprs.push(TplExpr::Expr(Box::new(expr)));
                }
            }
        }
        Ok(Expr::Template(exprs))
    }

    fn parse_array_literal(&mut self) -> Result<Expr, RuntimeError> {
        self.pos += 1;
        let mut items = Vec::new();
        loop {
            if self.eat_punct(Punct::RBracket) {
                break;
            }
            let item = if self.eat_punct(Punct::Ellipsis) {
                ArrayItem::Spread(self.parse_assign()?)
            } else {
                ArrayItem::Item(self.parse_assign()?)
            };
            items.push(item);
            if !self.eat_punct(Punct::Comma) {
                self.expect_punct(Punct::RBracket)?;
                break;
            }
        }
        Ok(Expr::Array(items))
    }

    fn parse_object_literal(&mut self) -> Result<Expr, RuntimeError> {
        self.pos += 1;
        let mut props = Vec::new();
        loop {
            if self.eat_punct(Punct::RBrace) {
                break;
            }
            if self.eat_punct(Punct::Ellipsis) {
                props.push(ObjectProp::Spread(self.parse_assign()?));
            } else {
                let (key, shorthand_ok) = match self.bump() {
                    Some(Token::Ident(name)) => (name, true),
                    Some(Token::Str(text)) => (text, false),
                    Some(Token::Keyword(k)) => (k.as_str().to_string(), false),
                    _ => return Err(RuntimeError::syntax("expected a property key")),
                };
                if self.eat_punct(Punct::Colon) {
                    let value = self.parse_assign()?;
                    props.push(ObjectProp::KeyValue { key, value });
                } else if shorthand_ok {
                    props.push(ObjectProp::Shorthand(key));
                } else {
                    return Err(RuntimeError::syntax(format!(
                        "expected `:` after property key `{key}`"
                    )));
                }
            }
            if !self.eat_punct(Punct::Comma) {
                self.expect_punct(Punct::RBrace)?;
                break;
            }
        }
        Ok(Expr::Object(props))
    }
}

/// Reject a binding declared twice in the same block.
fn check_redeclarations(stmts: &[Stmt]) -> Result<(), RuntimeError> {
    let mut names = Vec::new();
    for stmt in stmts {
        match stmt {
            Stmt::Decl { pattern, .. } => pattern.collect_names(&mut names),
            Stmt::Func { name, .. } => names.push(name.clone()),
            _ => {}
        }
    }
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name.clone()) {
            return Err(RuntimeError::syntax(format!(
                "Identifier '{name}' has already been declared"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_declarations_and_blocks() {
        let program = parse("let a = 1; { const b = 2; }").unwrap();
        assert_eq!(program.len(), 2);
        assert!(matches!(&program[0], Stmt::Decl { mutable: true, .. }));
        assert!(matches!(&program[1], Stmt::Block(inner) if inner.len() == 1));
    }

    #[test]
    fn distinguishes_arrows_from_parenthesized_expressions() {
        let arrow = parse("(a, b) => a + b").unwrap();
        assert!(matches!(&arrow[0], Stmt::Expr(Expr::Func(_))));

        let grouped = parse("(a + b) * 2").unwrap();
        assert!(matches!(
            &grouped[0],
            Stmt::Expr(Expr::Binary {
                op: BinaryOp::Mul,
                ..
            })
        ));
    }

    #[test]
    fn rejects_same_scope_redeclaration() {
        let err = parse("let x = 1; let x = 2;").unwrap_err();
        assert_eq!(err.kind, crate::models::ErrorKind::Syntax);

        // Shadowing in a nested block is fine.
        assert!(parse("let x = 1; { let x = 2; }").is_ok());
    }

    #[test]
    fn parses_destructuring_with_rest_and_defaults() {
        let program = parse("const [head, second = 2, ...tail] = xs;").unwrap();
        match &program[0] {
            Stmt::Decl {
                pattern: Pattern::Array { elements, rest },
                ..
            } => {
                assert_eq!(elements.len(), 2);
                assert!(elements[1].as_ref().unwrap().default.is_some());
                assert!(rest.is_some());
            }
            other => panic!("expected array pattern, got {other:?}"),
        }
    }

    #[test]
    fn parses_for_of_and_classic_for() {
        assert!(parse("for (const x of xs) { console.log(x); }").is_ok());
        assert!(parse("for (let i = 0; i < 3; i += 1) { console.log(i); }").is_ok());
    }

    #[test]
    fn rejects_const_without_initializer() {
        let err = parse("const x;").unwrap_err();
        assert_eq!(err.kind, crate::models::ErrorKind::Syntax);
    }
}
