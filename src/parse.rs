//! CPL front end: a character scan, the parsel grammar, and lowering of the
//! parse tree into [`crate::ast`].

use parsel::ast::{Any, Brace, LeftAssoc, Paren, Punctuated, Token};
use parsel::syn::ext::IdentExt;
use parsel::syn::parse::ParseStream;
use parsel::syn::spanned::Spanned;
use parsel::syn::{Ident, LitFloat, LitInt};
use parsel::{FromStr, Parse, ToTokens};
use proc_macro2::{LineColumn, TokenStream};
use tracing::debug;

use crate::ast;
use crate::check::Ty;
use crate::{Aborted, Diagnostic, Error};

mod kw {
    parsel::custom_keyword!(int);
    parsel::custom_keyword!(float);
    parsel::custom_keyword!(input);
    parsel::custom_keyword!(output);
    parsel::custom_keyword!(switch);
    parsel::custom_keyword!(case);
    parsel::custom_keyword!(default);
    parsel::custom_keyword!(cast);
}

/// <program> ::= <declarations> <stmt_block>
#[derive(Clone, Parse, ToTokens, FromStr)]
pub struct Prgm {
    pub decls: Any<Decl>,
    pub body: Nest,
}

/// <declaration> ::= <idlist> : <type> ;
#[derive(Clone, Parse, ToTokens)]
pub struct Decl {
    pub names: Punctuated<Var, Token!(,)>,
    pub colon: Token!(:),
    pub ty: Type,
    pub end: Token!(;),
}

#[derive(Clone, Parse, ToTokens)]
pub enum Type {
    Int(kw::int),
    Float(kw::float),
}

/// <stmt_block> ::= { <stmtlist> }
#[derive(Clone, Parse, ToTokens)]
pub struct Nest {
    pub block: Brace<Blck>,
}

#[derive(Clone, Parse, ToTokens)]
pub struct Blck {
    pub stmts: Any<Stmt>,
}

// Keyword-led statements come first: `input`, `output`, `switch` and the
// type names are not reserved, so `Assgn` would accept them as a target.
#[derive(Clone, Parse, ToTokens)]
pub enum Stmt {
    Input {
        input: kw::input,
        target: Paren<Var>,
        end: Token!(;),
    },
    Output {
        output: kw::output,
        value: Paren<Expn>,
        end: Token!(;),
    },
    If {
        if_: Token!(if),
        cond: Paren<BoolExpn>,
        #[parsel(recursive)]
        then: Box<Stmt>,
        else_: Token!(else),
        #[parsel(recursive)]
        otherwise: Box<Stmt>,
    },
    While {
        while_: Token!(while),
        cond: Paren<BoolExpn>,
        #[parsel(recursive)]
        body: Box<Stmt>,
    },
    Switch {
        switch: kw::switch,
        subject: Paren<Expn>,
        #[parsel(recursive)]
        arms: Brace<Box<Arms>>,
    },
    Break(Token!(break), Token!(;)),
    Block(#[parsel(recursive)] Box<Nest>),
    Assgn {
        target: Var,
        equals: Token!(=),
        value: Expn,
        end: Token!(;),
    },
}

/// <caselist> default : <stmtlist>
#[derive(Clone, Parse, ToTokens)]
pub struct Arms {
    pub cases: Any<Case>,
    pub default: kw::default,
    pub colon: Token!(:),
    pub stmts: Any<Stmt>,
}

#[derive(Clone, Parse, ToTokens)]
pub struct Case {
    pub case: kw::case,
    pub value: Nmbr,
    pub colon: Token!(:),
    pub body: Any<Stmt>,
}

// <boolexpr> ::= <boolexpr> || <boolterm>
// <boolterm> ::= <boolterm> && <boolfactor>
#[derive(Clone, Parse, ToTokens)]
pub struct BoolExpn(pub LeftAssoc<Or, LeftAssoc<And, BoolFactor>>);

#[derive(Clone, Parse, ToTokens)]
pub struct Or(Token!(||));

#[derive(Clone, Parse, ToTokens)]
pub struct And(Token!(&&));

#[derive(Clone, Parse, ToTokens)]
pub enum BoolFactor {
    Not(Token!(!), #[parsel(recursive)] Paren<Box<BoolExpn>>),
    Rel { lhs: Expn, op: Relop, rhs: Expn },
}

// Two-character operators first, or `<` would take the front of `<=`.
#[derive(Clone, Parse, ToTokens)]
pub enum Relop {
    Le(Token!(<=)),
    Ge(Token!(>=)),
    Eq(Token!(==)),
    Ne(Token!(!=)),
    Lt(Token!(<)),
    Gt(Token!(>)),
}

// <expression> ::= <expression> ADDOP <term>
// <term>       ::= <term> MULOP <factor>
#[derive(Clone, Parse, ToTokens)]
pub struct Expn(pub LeftAssoc<Add, LeftAssoc<Mult, Factor>>);

#[derive(Clone, Parse, ToTokens)]
pub enum Add {
    Plus(Token!(+)),
    Minus(Token!(-)),
}

#[derive(Clone, Parse, ToTokens)]
pub enum Mult {
    Times(Token!(*)),
    Div(Token!(/)),
}

// <factor> ::= ( <expression> ) | cast<type>( <expression> ) | ID | NUM
#[derive(Clone, Parse, ToTokens)]
pub enum Factor {
    Cast {
        cast: kw::cast,
        lt: Token!(<),
        ty: Type,
        gt: Token!(>),
        #[parsel(recursive)]
        expn: Paren<Box<Expn>>,
    },
    Group(#[parsel(recursive)] Paren<Box<Expn>>),
    Nmbr(Nmbr),
    Name(Var),
}

/// Words CPL reserves. Anything else shaped like an identifier, Rust
/// keywords included, names a variable.
const KEYWORDS: [&str; 11] = [
    "break", "case", "default", "else", "float", "if", "input", "int", "output", "switch",
    "while",
];

#[derive(Clone)]
pub struct Var(pub Ident);

impl parsel::syn::parse::Parse for Var {
    fn parse(input: ParseStream) -> parsel::syn::Result<Self> {
        let ident = input.call(Ident::parse_any)?;
        if KEYWORDS.contains(&ident.to_string().as_str()) {
            return Err(parsel::syn::Error::new(
                ident.span(),
                format!("expected identifier, found keyword `{ident}`"),
            ));
        }
        Ok(Self(ident))
    }
}

impl ToTokens for Var {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        self.0.to_tokens(tokens);
    }
}

#[derive(Clone, Parse, ToTokens)]
pub enum Nmbr {
    Float(LitFloat),
    Int(LitInt),
}

fn line(node: &impl Spanned) -> usize {
    node.span().start().line
}

fn syntax(line: usize, message: impl Into<String>) -> Diagnostic {
    Diagnostic {
        line,
        error: Error::Syntax(message.into()),
    }
}

fn name(var: &Var) -> ast::Name {
    ast::Name {
        ident: var.0.to_string(),
        line: line(var),
    }
}

impl Nmbr {
    /// The literal as written. Only plain decimal digits with at most a
    /// point are CPL numbers; hex, `_`, exponents and suffixes are not.
    fn text(&self) -> Result<String, Diagnostic> {
        let written = match self {
            Self::Float(lit) => lit.to_string(),
            Self::Int(lit) => lit.to_string(),
        };
        if !written.chars().all(|c| c.is_ascii_digit() || c == '.') {
            return Err(syntax(line(self), format!("malformed number '{written}'")));
        }
        Ok(written)
    }
}

impl From<&Type> for Ty {
    fn from(ty: &Type) -> Self {
        match ty {
            Type::Int(_) => Self::Int,
            Type::Float(_) => Self::Float,
        }
    }
}

impl From<&Relop> for ast::RelOp {
    fn from(op: &Relop) -> Self {
        match op {
            Relop::Le(_) => Self::Le,
            Relop::Ge(_) => Self::Ge,
            Relop::Eq(_) => Self::Eq,
            Relop::Ne(_) => Self::Ne,
            Relop::Lt(_) => Self::Lt,
            Relop::Gt(_) => Self::Gt,
        }
    }
}

trait Lower {
    type Lowered;

    fn lower(self) -> Result<Self::Lowered, Diagnostic>;
}

impl<T: Lower> Lower for Box<T> {
    type Lowered = T::Lowered;

    fn lower(self) -> Result<Self::Lowered, Diagnostic> {
        (*self).lower()
    }
}

trait Binop<T> {
    fn combine(&self, lhs: T, rhs: T) -> T;
}

impl Binop<ast::Expr> for Add {
    fn combine(&self, lhs: ast::Expr, rhs: ast::Expr) -> ast::Expr {
        let op = match self {
            Self::Plus(_) => ast::ArithOp::Add,
            Self::Minus(_) => ast::ArithOp::Sub,
        };
        ast::Expr::Arith {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }
}

impl Binop<ast::Expr> for Mult {
    fn combine(&self, lhs: ast::Expr, rhs: ast::Expr) -> ast::Expr {
        let op = match self {
            Self::Times(_) => ast::ArithOp::Mul,
            Self::Div(_) => ast::ArithOp::Div,
        };
        ast::Expr::Arith {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }
}

impl Binop<ast::BoolExpr> for Or {
    fn combine(&self, lhs: ast::BoolExpr, rhs: ast::BoolExpr) -> ast::BoolExpr {
        ast::BoolExpr::Or(Box::new(lhs), Box::new(rhs))
    }
}

impl Binop<ast::BoolExpr> for And {
    fn combine(&self, lhs: ast::BoolExpr, rhs: ast::BoolExpr) -> ast::BoolExpr {
        ast::BoolExpr::And(Box::new(lhs), Box::new(rhs))
    }
}

impl<B: Binop<C::Lowered>, C: Lower> Lower for LeftAssoc<B, C> {
    type Lowered = C::Lowered;

    fn lower(self) -> Result<Self::Lowered, Diagnostic> {
        Ok(match self {
            Self::Binary { lhs, op, rhs } => {
                let lhs = lhs.lower()?;
                let rhs = rhs.lower()?;
                op.combine(lhs, rhs)
            }
            Self::Rhs(expn) => expn.lower()?,
        })
    }
}

impl Lower for Prgm {
    type Lowered = ast::Program;

    fn lower(self) -> Result<Self::Lowered, Diagnostic> {
        let declarations = self
            .decls
            .into_iter()
            .map(Lower::lower)
            .collect::<Result<_, _>>()?;
        Ok(ast::Program {
            declarations,
            body: self.body.lower()?,
        })
    }
}

impl Lower for Decl {
    type Lowered = ast::Declaration;

    fn lower(self) -> Result<Self::Lowered, Diagnostic> {
        Ok(ast::Declaration {
            ty: (&self.ty).into(),
            names: self.names.into_iter().map(|var| name(&var)).collect(),
        })
    }
}

impl Lower for Nest {
    type Lowered = Vec<ast::Stmt>;

    fn lower(self) -> Result<Self::Lowered, Diagnostic> {
        self.block.into_inner().stmts.into_iter().map(Lower::lower).collect()
    }
}

impl Lower for Stmt {
    type Lowered = ast::Stmt;

    fn lower(self) -> Result<Self::Lowered, Diagnostic> {
        Ok(match self {
            Self::Input { target, .. } => ast::Stmt::Input {
                target: name(&target.into_inner()),
            },
            Self::Output { output, value, .. } => ast::Stmt::Output {
                line: line(&output),
                value: value.into_inner().lower()?,
            },
            Self::If {
                cond,
                then,
                otherwise,
                ..
            } => ast::Stmt::If {
                cond: cond.into_inner().lower()?,
                then: Box::new(then.lower()?),
                otherwise: Box::new(otherwise.lower()?),
            },
            Self::While { cond, body, .. } => ast::Stmt::While {
                cond: cond.into_inner().lower()?,
                body: Box::new(body.lower()?),
            },
            Self::Switch {
                switch,
                subject,
                arms,
            } => {
                let Arms { cases, stmts, .. } = *arms.into_inner();
                ast::Stmt::Switch {
                    line: line(&switch),
                    subject: subject.into_inner().lower()?,
                    cases: cases.into_iter().map(Lower::lower).collect::<Result<_, _>>()?,
                    default: stmts.into_iter().map(Lower::lower).collect::<Result<_, _>>()?,
                }
            }
            Self::Break(brk, _) => ast::Stmt::Break { line: line(&brk) },
            Self::Block(nest) => ast::Stmt::Block(nest.lower()?),
            Self::Assgn { target, value, .. } => ast::Stmt::Assign {
                line: line(&target),
                target: name(&target),
                value: value.lower()?,
            },
        })
    }
}

impl Lower for Case {
    type Lowered = ast::Case;

    fn lower(self) -> Result<Self::Lowered, Diagnostic> {
        Ok(ast::Case {
            line: line(&self.case),
            value: self.value.text()?,
            body: self.body.into_iter().map(Lower::lower).collect::<Result<_, _>>()?,
        })
    }
}

impl Lower for BoolExpn {
    type Lowered = ast::BoolExpr;

    fn lower(self) -> Result<Self::Lowered, Diagnostic> {
        self.0.lower()
    }
}

impl Lower for BoolFactor {
    type Lowered = ast::BoolExpr;

    fn lower(self) -> Result<Self::Lowered, Diagnostic> {
        Ok(match self {
            Self::Not(_, inner) => ast::BoolExpr::Not(Box::new(inner.into_inner().lower()?)),
            Self::Rel { lhs, op, rhs } => ast::BoolExpr::Rel {
                op: (&op).into(),
                line: line(&op),
                lhs: lhs.lower()?,
                rhs: rhs.lower()?,
            },
        })
    }
}

impl Lower for Expn {
    type Lowered = ast::Expr;

    fn lower(self) -> Result<Self::Lowered, Diagnostic> {
        self.0.lower()
    }
}

impl Lower for Factor {
    type Lowered = ast::Expr;

    fn lower(self) -> Result<Self::Lowered, Diagnostic> {
        Ok(match self {
            Self::Cast { cast, ty, expn, .. } => ast::Expr::Cast {
                ty: (&ty).into(),
                line: line(&cast),
                expr: Box::new(expn.into_inner().lower()?),
            },
            Self::Group(expn) => expn.into_inner().lower()?,
            Self::Nmbr(nmbr) => ast::Expr::Num(nmbr.text()?),
            Self::Name(var) => ast::Expr::Id(name(&var)),
        })
    }
}

fn legal(c: char) -> bool {
    c.is_ascii_alphanumeric() || c.is_whitespace() || "_(){},:;=+-*/<>!&|.".contains(c)
}

/// Strip `/* */` comments and characters CPL has no token for.
///
/// Each illegal character is reported and replaced by a space, so parsing
/// goes on as if it had been skipped. `//` is not a comment in CPL and is
/// reported as a syntax error. Newlines are kept so token spans still carry
/// the right line.
pub fn scan(source: &str) -> (String, Vec<Diagnostic>) {
    let mut out = String::with_capacity(source.len());
    let mut diagnostics = Vec::new();
    let mut lineno = 1;
    let mut chars = source.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '/' && chars.peek() == Some(&'*') {
            let start = lineno;
            chars.next();
            out.push_str("  ");
            let mut closed = false;
            while let Some(c) = chars.next() {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    out.push_str("  ");
                    closed = true;
                    break;
                }
                if c == '\n' {
                    lineno += 1;
                    out.push('\n');
                } else {
                    out.push(' ');
                }
            }
            if !closed {
                diagnostics.push(Diagnostic {
                    line: start,
                    error: Error::Lexical('/'),
                });
            }
            continue;
        }
        if c == '/' && chars.peek() == Some(&'/') {
            chars.next();
            diagnostics.push(syntax(lineno, "unexpected '/'"));
            out.push_str("  ");
            continue;
        }
        // `.5` is a float in CPL but not a token on its own
        let after_word = out
            .chars()
            .last()
            .map_or(false, |p| p.is_ascii_alphanumeric() || p == '_' || p == '.');
        if c == '.' && !after_word && chars.peek().map_or(false, char::is_ascii_digit) {
            out.push_str("0.");
            continue;
        }
        if c == '\n' {
            lineno += 1;
        }
        if legal(c) {
            out.push(c);
        } else {
            diagnostics.push(Diagnostic {
                line: lineno,
                error: Error::Lexical(c),
            });
            out.push(' ');
        }
    }
    (out, diagnostics)
}

/// Position of `at` in `chars`, counting columns in characters.
fn offset(chars: &[char], at: LineColumn) -> Option<usize> {
    let (mut line, mut column) = (1, 0);
    for (idx, c) in chars.iter().enumerate() {
        if line == at.line && column == at.column {
            return Some(idx);
        }
        if *c == '\n' {
            line += 1;
            column = 0;
        } else {
            column += 1;
        }
    }
    None
}

/// Blank out everything from `at` through the next `;`, stopping short of
/// the `}` that closes the enclosing block. Nested blocks are skipped whole
/// so braces stay balanced. Returns whether anything was removed.
fn skip_to_sync(text: &mut String, at: LineColumn) -> bool {
    let mut chars: Vec<char> = text.chars().collect();
    let Some(start) = offset(&chars, at) else {
        return false;
    };
    let mut depth = 0usize;
    let mut skipped = false;
    for c in &mut chars[start..] {
        match *c {
            '}' if depth == 0 => break,
            '{' => depth += 1,
            '}' => depth -= 1,
            _ => {}
        }
        let done = *c == ';' && depth == 0;
        if !c.is_whitespace() {
            *c = ' ';
            skipped = true;
        }
        if done {
            break;
        }
    }
    *text = chars.into_iter().collect();
    skipped
}

/// Parse, and after each syntax error drop the offending tokens up to a
/// synchronizing `;` or `}` and parse again, so every error gets reported.
fn parse_recovering(mut text: String, diagnostics: &mut Vec<Diagnostic>) -> Option<ast::Program> {
    loop {
        let error = match text.parse::<Prgm>() {
            Ok(prgm) => match prgm.lower() {
                Ok(prgm) => return Some(prgm),
                Err(diagnostic) => {
                    diagnostics.push(diagnostic);
                    return None;
                }
            },
            Err(error) => error,
        };
        let at = error.span().start();
        debug!(line = at.line, column = at.column, "syntax error, resynchronizing");
        diagnostics.push(syntax(at.line, error.to_string()));
        if !skip_to_sync(&mut text, at) {
            return None;
        }
    }
}

/// Scan and parse CPL source.
///
/// Lexical errors come back alongside the tree; they do not stop parsing.
///
/// # Errors
/// If there was any syntax error. Parsing carries on past each one to report
/// the rest, but nothing is generated from a malformed program.
pub fn parse(source: &str) -> Result<(ast::Program, Vec<Diagnostic>), Aborted> {
    let (cleaned, mut diagnostics) = scan(source);
    let prgm = parse_recovering(cleaned, &mut diagnostics);
    let malformed = diagnostics
        .iter()
        .any(|diagnostic| matches!(diagnostic.error, Error::Syntax(_)));
    match prgm {
        Some(prgm) if !malformed => Ok((prgm, diagnostics)),
        _ => Err(Aborted { diagnostics }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BoolExpr, Expr, RelOp, Stmt};

    fn body(source: &str) -> Vec<Stmt> {
        parse(source).unwrap().0.body
    }

    #[test]
    fn declarations_keep_their_lines() {
        let (prgm, diagnostics) = parse("a, b : int;\nc : float;\n{ }").unwrap();
        assert!(diagnostics.is_empty());
        assert_eq!(prgm.declarations.len(), 2);
        assert_eq!(prgm.declarations[0].ty, Ty::Int);
        assert_eq!(prgm.declarations[0].names[1].ident, "b");
        assert_eq!(prgm.declarations[1].ty, Ty::Float);
        assert_eq!(prgm.declarations[1].names[0].line, 2);
    }

    #[test]
    fn arithmetic_is_left_associative() {
        let stmts = body("{ x = a - b - c * 2; }");
        let Stmt::Assign { value, .. } = &stmts[0] else {
            panic!("expected an assignment");
        };
        let Expr::Arith { op, lhs, rhs } = value else {
            panic!("expected arithmetic");
        };
        assert_eq!(*op, ast::ArithOp::Sub);
        assert!(matches!(**lhs, Expr::Arith { op: ast::ArithOp::Sub, .. }));
        assert!(matches!(**rhs, Expr::Arith { op: ast::ArithOp::Mul, .. }));
    }

    #[test]
    fn and_binds_tighter_than_or() {
        let stmts = body("{ while (a < 1 || b <= 2 && !(c != 3)) x = 1; }");
        let Stmt::While { cond, .. } = &stmts[0] else {
            panic!("expected a loop");
        };
        let BoolExpr::Or(lhs, rhs) = cond else {
            panic!("expected ||");
        };
        assert!(matches!(**lhs, BoolExpr::Rel { op: RelOp::Lt, .. }));
        let BoolExpr::And(le, not) = &**rhs else {
            panic!("expected &&");
        };
        assert!(matches!(**le, BoolExpr::Rel { op: RelOp::Le, .. }));
        assert!(matches!(**not, BoolExpr::Not(_)));
    }

    #[test]
    fn cast_and_float_literals() {
        let stmts = body("{ y = cast<float>(x) + 1.5; }");
        let Stmt::Assign { value, .. } = &stmts[0] else {
            panic!("expected an assignment");
        };
        let Expr::Arith { lhs, rhs, .. } = value else {
            panic!("expected arithmetic");
        };
        assert!(matches!(**lhs, Expr::Cast { ty: Ty::Float, .. }));
        assert_eq!(**rhs, Expr::Num("1.5".into()));
    }

    #[test]
    fn switch_with_cases_and_default() {
        let source = "{\n switch (x) {\n case 1: output(1); break;\n case 2: \n default: output(0);\n }\n}";
        let stmts = body(source);
        let Stmt::Switch {
            cases,
            default,
            line,
            ..
        } = &stmts[0]
        else {
            panic!("expected a switch");
        };
        assert_eq!(*line, 2);
        assert_eq!(cases.len(), 2);
        assert_eq!(cases[0].value, "1");
        assert_eq!(cases[0].body.len(), 2);
        assert!(cases[1].body.is_empty());
        assert_eq!(default.len(), 1);
    }

    #[test]
    fn comments_and_stray_characters() {
        let (prgm, diagnostics) = parse("/* a\n comment */ x : int;\n{ x = 1 @ ; }").unwrap();
        assert_eq!(prgm.declarations[0].names[0].line, 2);
        assert_eq!(
            diagnostics,
            [Diagnostic {
                line: 3,
                error: Error::Lexical('@')
            }]
        );
    }

    #[test]
    fn syntax_error_aborts() {
        let aborted = parse("x : int;\n{ x = ; }").unwrap_err();
        assert_eq!(aborted.diagnostics.len(), 1);
        assert!(matches!(aborted.diagnostics[0].error, Error::Syntax(_)));
        assert_eq!(aborted.diagnostics[0].line, 2);
    }

    #[test]
    fn parsing_resumes_after_a_bad_statement() {
        let aborted = parse("x : int;\n{ x = ;\n x = 1;\n y + ; }").unwrap_err();
        let lines: Vec<usize> = aborted.diagnostics.iter().map(|d| d.line).collect();
        assert_eq!(lines, [2, 4]);
        assert!(aborted
            .diagnostics
            .iter()
            .all(|d| matches!(d.error, Error::Syntax(_))));
    }

    #[test]
    fn rust_keywords_are_plain_names() {
        let (prgm, diagnostics) =
            parse("type, loop, fn: int;\n{ type = 1; input(loop); fn = type + loop; }").unwrap();
        assert!(diagnostics.is_empty());
        let names: Vec<&str> = prgm.declarations[0]
            .names
            .iter()
            .map(|n| n.ident.as_str())
            .collect();
        assert_eq!(names, ["type", "loop", "fn"]);
        assert_eq!(prgm.body.len(), 3);
    }

    #[test]
    fn cpl_keywords_are_not_names() {
        assert!(parse("while: int;\n{ }").is_err());
        assert!(parse("{ default = 1; }").is_err());
    }

    #[test]
    fn leading_dot_is_a_float() {
        let stmts = body("y: float;\n{ y = .5 * y; }");
        let Stmt::Assign { value, .. } = &stmts[0] else {
            panic!("expected an assignment");
        };
        let Expr::Arith { lhs, .. } = value else {
            panic!("expected arithmetic");
        };
        assert_eq!(**lhs, Expr::Num("0.5".into()));
    }

    #[test]
    fn only_decimal_numbers() {
        let aborted = parse("x: int;\n{ x = 0x1F; }").unwrap_err();
        assert_eq!(
            aborted.diagnostics,
            [Diagnostic {
                line: 2,
                error: Error::Syntax("malformed number '0x1F'".into())
            }]
        );
    }

    #[test]
    fn line_comments_are_not_cpl() {
        let aborted = parse("x: int;\n{ x = 6; // note\n}").unwrap_err();
        assert_eq!(
            aborted.diagnostics[0],
            Diagnostic {
                line: 2,
                error: Error::Syntax("unexpected '/'".into())
            }
        );
        assert!(aborted.diagnostics.iter().all(|d| d.line == 2));
    }
}
