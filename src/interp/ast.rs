//! Syntax tree for the snippet language.

#[derive(Debug, Clone)]
pub enum Stmt {
    Expr(Expr),
    /// `let` (mutable) or `const` declaration with an optional initializer.
    Decl {
        mutable: bool,
        pattern: Pattern,
        init: Option<Expr>,
    },
    /// `function name(...) { ... }` declaration.
    Func { name: String, func: FuncLit },
    Return(Option<Expr>),
    If {
        cond: Expr,
        then: Vec<Stmt>,
        otherwise: Option<Box<Stmt>>,
    },
    While {
        cond: Expr,
        body: Vec<Stmt>,
    },
    For {
        init: Option<Box<Stmt>>,
        cond: Option<Expr>,
        update: Option<Expr>,
        body: Vec<Stmt>,
    },
    ForOf {
        mutable: bool,
        pattern: Pattern,
        iter: Expr,
        body: Vec<Stmt>,
    },
    Block(Vec<Stmt>),
    Try {
        block: Vec<Stmt>,
        catch: Option<CatchClause>,
        finally: Option<Vec<Stmt>>,
    },
    Throw(Expr),
    Break,
    Continue,
}

#[derive(Debug, Clone)]
pub struct CatchClause {
    /// `catch { ... }` without a binding is allowed.
    pub param: Option<Pattern>,
    pub body: Vec<Stmt>,
}

/// A function literal: arrow, function expression, or declaration body.
#[derive(Debug, Clone)]
pub struct FuncLit {
    pub name: Option<String>,
    pub params: Vec<Param>,
    pub body: FuncBody,
    pub is_async: bool,
}

#[derive(Debug, Clone)]
pub struct Param {
    pub pattern: Pattern,
    pub default: Option<Expr>,
    pub rest: bool,
}

#[derive(Debug, Clone)]
pub enum FuncBody {
    Block(Vec<Stmt>),
    /// Arrow concise body: the expression is the return value.
    Expr(Box<Expr>),
}

/// A binding pattern: plain identifier, array destructuring, or object
/// destructuring. Defaults live on the element, not the pattern, because an
/// element's default only applies when the picked value is `undefined`.
#[derive(Debug, Clone)]
pub enum Pattern {
    Ident(String),
    Array {
        /// `None` is an elision (`[, x]` skips an element).
        elements: Vec<Option<ArrayPatternElem>>,
        rest: Option<Box<Pattern>>,
    },
    Object {
        props: Vec<ObjectPatternProp>,
        rest: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub struct ArrayPatternElem {
    pub pattern: Pattern,
    pub default: Option<Expr>,
}

#[derive(Debug, Clone)]
pub struct ObjectPatternProp {
    pub key: String,
    pub binding: Pattern,
    pub default: Option<Expr>,
}

impl Pattern {
    /// Collect every name the pattern introduces, for per-block
    /// redeclaration checks.
    pub fn collect_names(&self, names: &mut Vec<String>) {
        match self {
            Pattern::Ident(name) => names.push(name.clone()),
            Pattern::Array { elements, rest } => {
                for elem in elements.iter().flatten() {
                    elem.pattern.collect_names(names);
                }
                if let Some(rest) = rest {
                    rest.collect_names(names);
                }
            }
            Pattern::Object { props, rest } => {
                for prop in props {
                    prop.binding.collect_names(names);
                }
                if let Some(rest) = rest {
                    names.push(rest.clone());
                }
            }
        }
    }
}

#[derive(Debug, Clone)]
pub enum Expr {
    Number(f64),
    Str(String),
    Bool(bool),
    Null,
    Undefined,
    Template(Vec<TplExpr>),
    Ident(String),
    Array(Vec<ArrayItem>),
    Object(Vec<ObjectProp>),
    Func(FuncLit),
    Call {
        callee: Box<Expr>,
        args: Vec<Arg>,
        /// `callee?.(...)`: short-circuits to `undefined` on nullish callee.
        optional: bool,
    },
    /// `new Error(...)` and friends; only the built-in error constructors.
    New {
        ctor: String,
        args: Vec<Arg>,
    },
    Member {
        object: Box<Expr>,
        property: String,
        /// `obj?.prop`: yields `undefined` instead of faulting on nullish.
        optional: bool,
    },
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Logical {
        op: LogicalOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Assign {
        target: Box<Expr>,
        /// Compound-assignment operator; `None` for plain `=`.
        op: Option<BinaryOp>,
        value: Box<Expr>,
    },
    Cond {
        cond: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    Await(Box<Expr>),
    TypeOf(Box<Expr>),
}

#[derive(Debug, Clone)]
pub enum TplExpr {
    Lit(String),
    Expr(Box<Expr>),
}

#[derive(Debug, Clone)]
pub enum ArrayItem {
    Item(Expr),
    Spread(Expr),
}

#[derive(Debug, Clone)]
pub enum ObjectProp {
    KeyValue { key: String, value: Expr },
    Shorthand(String),
    Spread(Expr),
}

#[derive(Debug, Clone)]
pub enum Arg {
    Item(Expr),
    Spread(Expr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Lt,
    LtEq,
    Gt,
    GtEq,
    /// Loose equality (`==`).
    Eq,
    /// Strict equality (`===`).
    StrictEq,
    NotEq,
    StrictNotEq,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}
