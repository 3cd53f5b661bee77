//! The abstract syntax tree the translator walks.
//!
//! Every node that can produce a diagnostic carries the source line it
//! started on.

use crate::check::Ty;
pub use crate::ir::ArithOp;

#[derive(Clone, PartialEq, Debug)]
pub struct Program {
    pub declarations: Vec<Declaration>,
    pub body: Vec<Stmt>,
}

/// `a, b, c : float;`
#[derive(Clone, PartialEq, Debug)]
pub struct Declaration {
    pub names: Vec<Name>,
    pub ty: Ty,
}

#[derive(Clone, PartialEq, Debug)]
pub struct Name {
    pub ident: String,
    pub line: usize,
}

#[derive(Clone, PartialEq, Debug)]
pub enum Stmt {
    Assign {
        target: Name,
        value: Expr,
        line: usize,
    },
    Input {
        target: Name,
    },
    Output {
        value: Expr,
        line: usize,
    },
    If {
        cond: BoolExpr,
        then: Box<Stmt>,
        otherwise: Box<Stmt>,
    },
    While {
        cond: BoolExpr,
        body: Box<Stmt>,
    },
    Switch {
        subject: Expr,
        cases: Vec<Case>,
        default: Vec<Stmt>,
        line: usize,
    },
    Break {
        line: usize,
    },
    Block(Vec<Stmt>),
}

/// `case 3: ...`; the value is kept as written so a float constant can be
/// reported.
#[derive(Clone, PartialEq, Debug)]
pub struct Case {
    pub value: String,
    pub body: Vec<Stmt>,
    pub line: usize,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RelOp {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

#[derive(Clone, PartialEq, Debug)]
pub enum BoolExpr {
    Or(Box<BoolExpr>, Box<BoolExpr>),
    And(Box<BoolExpr>, Box<BoolExpr>),
    Not(Box<BoolExpr>),
    Rel {
        op: RelOp,
        lhs: Expr,
        rhs: Expr,
        line: usize,
    },
}

#[derive(Clone, PartialEq, Debug)]
pub enum Expr {
    Arith {
        op: ArithOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Cast {
        ty: Ty,
        expr: Box<Expr>,
        line: usize,
    },
    Id(Name),
    Num(String),
}
