use tracing::debug;

#[allow(clippy::wildcard_imports)]
use crate::ast::*;
use crate::check::{SymTab, Ty};
use crate::ir::{CmpOp, Emitter, Label, Line, Operand, Quad};
use crate::{Diagnostic, Error};

/// Labels a statement leaves open for whatever code follows it.
pub type Exits = Vec<Label>;

/// Pending exits of a boolean expression.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct JumpLists {
    pub truelist: Vec<Label>,
    pub falselist: Vec<Label>,
}

impl JumpLists {
    pub fn negate(self) -> Self {
        Self {
            truelist: self.falselist,
            falselist: self.truelist,
        }
    }

    /// Merge for `self && rhs`, once `self.truelist` has been sent to the
    /// start of `rhs`.
    pub fn and(self, rhs: Self) -> Self {
        Self {
            truelist: rhs.truelist,
            falselist: [self.falselist, rhs.falselist].concat(),
        }
    }

    /// Merge for `self || rhs`, once `self.falselist` has been sent to the
    /// start of `rhs`.
    pub fn or(self, rhs: Self) -> Self {
        Self {
            truelist: [self.truelist, rhs.truelist].concat(),
            falselist: rhs.falselist,
        }
    }
}

/// An expression result: where it lives and what it is.
#[derive(Clone, PartialEq, Debug)]
struct Value {
    operand: Operand,
    ty: Ty,
}

/// One compilation's worth of translation state.
#[derive(Default)]
pub struct Translator {
    syms: SymTab,
    emitter: Emitter,
    /// Pending `break` jumps, one frame per enclosing loop or switch.
    breaks: Vec<Vec<Label>>,
    diagnostics: Vec<Diagnostic>,
}

impl Translator {
    /// Translate a whole program, resolving every label.
    ///
    /// # Errors
    /// Only if a label was left open, which is a bug in the translator.
    /// User errors are collected as diagnostics.
    pub fn program(mut self, prgm: &Program) -> Result<(Vec<Quad<Line>>, Vec<Diagnostic>), Error> {
        for decl in &prgm.declarations {
            self.declaration(decl);
        }
        debug_assert!(!self.syms.has_pending());
        let exits = self.stmts(&prgm.body);
        let halt = self.emitter.mark();
        self.emitter.emit(Quad::Halt);
        self.emitter.backpatch(&exits, halt);
        debug_assert!(self.breaks.is_empty());
        debug!(
            variables = self.syms.len(),
            errors = self.diagnostics.len(),
            "translation done"
        );
        Ok((self.emitter.finish()?, self.diagnostics))
    }

    fn report(&mut self, line: usize, error: Error) {
        debug!(line, %error, "reporting");
        self.diagnostics.push(Diagnostic { line, error });
    }

    fn temp(&mut self) -> String {
        self.emitter.new_temp(&self.syms)
    }

    fn declaration(&mut self, decl: &Declaration) {
        for name in &decl.names {
            if let Err(e) = self.syms.insert(&name.ident) {
                self.report(name.line, e);
            }
        }
        self.syms.bind_pending(decl.ty);
    }

    /// Type of a variable that is read or written, reporting it if it was
    /// never declared.
    fn variable(&mut self, name: &Name) -> Ty {
        match self.syms.lookup(&name.ident) {
            Ok(ty) => ty,
            Err(e) => {
                self.report(name.line, e);
                Ty::Int
            }
        }
    }

    /// A statement list. Each statement's exits go to the start of the next;
    /// the last one's are handed back.
    fn stmts(&mut self, stmts: &[Stmt]) -> Exits {
        let mut exits = Exits::new();
        for stmt in stmts {
            let start = self.emitter.mark();
            self.emitter.backpatch(&exits, start);
            exits = self.stmt(stmt);
        }
        exits
    }

    fn stmt(&mut self, stmt: &Stmt) -> Exits {
        match stmt {
            Stmt::Assign {
                target,
                value,
                line,
            } => {
                let ty = self.variable(target);
                let value = self.expr(value);
                if ty == Ty::Int && value.ty == Ty::Float {
                    self.report(*line, Error::NarrowingAssignment(target.ident.clone()));
                }
                self.emitter.emit(Quad::Asn {
                    ty,
                    dest: target.ident.clone(),
                    src: value.operand,
                });
                Exits::new()
            }
            Stmt::Input { target } => {
                let ty = self.variable(target);
                self.emitter.emit(Quad::Inp {
                    ty,
                    dest: target.ident.clone(),
                });
                Exits::new()
            }
            Stmt::Output { value, .. } => {
                let value = self.expr(value);
                self.emitter.emit(Quad::Prt {
                    ty: value.ty,
                    src: value.operand,
                });
                Exits::new()
            }
            Stmt::If {
                cond,
                then,
                otherwise,
            } => {
                let cond = self.cond(cond);
                let then_start = self.emitter.mark();
                let then_exits = self.stmt(then);
                let skip_else = self.emitter.jump_forward();
                let else_start = self.emitter.mark();
                let else_exits = self.stmt(otherwise);
                self.emitter.backpatch(&cond.truelist, then_start);
                self.emitter.backpatch(&cond.falselist, else_start);
                [then_exits, else_exits, vec![skip_else]].concat()
            }
            Stmt::While { cond, body } => {
                self.breaks.push(Vec::new());
                let entry = self.emitter.mark();
                let cond = self.cond(cond);
                let body_start = self.emitter.mark();
                let body_exits = self.stmt(body);
                self.emitter.backpatch(&body_exits, entry);
                self.emitter.backpatch(&cond.truelist, body_start);
                self.emitter.emit(Quad::Jump(entry));
                let breaks = self.breaks.pop().unwrap_or_default();
                [cond.falselist, breaks].concat()
            }
            Stmt::Switch {
                subject,
                cases,
                default,
                line,
            } => {
                self.switch(subject, cases, default, *line);
                Exits::new()
            }
            Stmt::Break { line } => {
                if self.breaks.is_empty() {
                    self.report(*line, Error::BreakOutsideLoop);
                } else {
                    let jump = self.emitter.jump_forward();
                    if let Some(frame) = self.breaks.last_mut() {
                        frame.push(jump);
                    }
                }
                Exits::new()
            }
            Stmt::Block(stmts) => self.stmts(stmts),
        }
    }

    /// `switch` lowers to a chain of equality tests against one subject
    /// temp. Every case ends in a jump past the default body, so cases do
    /// not fall through.
    fn switch(&mut self, subject: &Expr, cases: &[Case], default: &[Stmt], line: usize) {
        self.breaks.push(Vec::new());
        let value = self.expr(subject);
        if let Err(ty) = value.ty.expect_int() {
            self.report(line, Error::IllegalSwitchType(ty));
        }
        let scrutinee = self.temp();
        let test = self.temp();
        self.emitter.emit(Quad::Asn {
            ty: Ty::Int,
            dest: scrutinee.clone(),
            src: value.operand,
        });

        let mut exits = Exits::new();
        for case in cases {
            if let Err(ty) = Ty::of_literal(&case.value).expect_int() {
                self.report(case.line, Error::IllegalCaseType(ty, case.value.clone()));
            }
            self.emitter.emit(Quad::Cmp {
                op: CmpOp::Eql,
                ty: Ty::Int,
                dest: test.clone(),
                lhs: Operand::Var(scrutinee.clone()),
                rhs: Operand::Lit(case.value.clone()),
            });
            let skip = self.emitter.forward_label();
            self.emitter.emit(Quad::Jmpz {
                target: skip,
                cond: test.clone(),
            });
            exits.extend(self.stmts(&case.body));
            exits.push(self.emitter.jump_forward());
            let next_case = self.emitter.mark();
            self.emitter.backpatch(&[skip], next_case);
        }

        exits.extend(self.stmts(default));
        let end = self.emitter.mark();
        exits.extend(self.breaks.pop().unwrap_or_default());
        self.emitter.backpatch(&exits, end);
    }

    fn cond(&mut self, cond: &BoolExpr) -> JumpLists {
        match cond {
            BoolExpr::And(lhs, rhs) => {
                let lhs = self.cond(lhs);
                let rhs_start = self.emitter.mark();
                self.emitter.backpatch(&lhs.truelist, rhs_start);
                let rhs = self.cond(rhs);
                lhs.and(rhs)
            }
            BoolExpr::Or(lhs, rhs) => {
                let lhs = self.cond(lhs);
                let rhs_start = self.emitter.mark();
                self.emitter.backpatch(&lhs.falselist, rhs_start);
                let rhs = self.cond(rhs);
                lhs.or(rhs)
            }
            BoolExpr::Not(inner) => self.cond(inner).negate(),
            BoolExpr::Rel { op, lhs, rhs, .. } => self.relop(*op, lhs, rhs),
        }
    }

    /// `cmp t a b; JMPZ <false> t; JUMP <true>`. `>=` and `<=` compare the
    /// other way round and flip the result with `t = 1 - t`.
    fn relop(&mut self, op: RelOp, lhs: &Expr, rhs: &Expr) -> JumpLists {
        let lhs = self.expr(lhs);
        let rhs = self.expr(rhs);
        let (lhs, rhs, ty) = self.coerce(lhs, rhs);
        let (cmp, flip) = match op {
            RelOp::Eq => (CmpOp::Eql, false),
            RelOp::Ne => (CmpOp::Nql, false),
            RelOp::Lt => (CmpOp::Lss, false),
            RelOp::Gt => (CmpOp::Grt, false),
            RelOp::Ge => (CmpOp::Lss, true),
            RelOp::Le => (CmpOp::Grt, true),
        };
        let dest = self.temp();
        self.emitter.emit(Quad::Cmp {
            op: cmp,
            ty,
            dest: dest.clone(),
            lhs: lhs.operand,
            rhs: rhs.operand,
        });
        if flip {
            self.emitter.emit(Quad::Arith {
                op: ArithOp::Sub,
                ty: Ty::Int,
                dest: dest.clone(),
                lhs: Operand::Lit("1".into()),
                rhs: Operand::Var(dest.clone()),
            });
        }
        let on_false = self.emitter.forward_label();
        self.emitter.emit(Quad::Jmpz {
            target: on_false,
            cond: dest,
        });
        let on_true = self.emitter.jump_forward();
        JumpLists {
            truelist: vec![on_true],
            falselist: vec![on_false],
        }
    }

    /// Bring both operands to a common type, converting the `int` side of a
    /// mixed pair.
    fn coerce(&mut self, lhs: Value, rhs: Value) -> (Value, Value, Ty) {
        let ty = lhs.ty.unify(rhs.ty);
        let lhs = self.widen(lhs, ty);
        let rhs = self.widen(rhs, ty);
        (lhs, rhs, ty)
    }

    fn widen(&mut self, value: Value, to: Ty) -> Value {
        if value.ty == to {
            value
        } else {
            self.convert(value, to)
        }
    }

    fn convert(&mut self, value: Value, to: Ty) -> Value {
        let dest = self.temp();
        self.emitter.emit(match to {
            Ty::Float => Quad::Itor {
                dest: dest.clone(),
                src: value.operand,
            },
            Ty::Int => Quad::Rtoi {
                dest: dest.clone(),
                src: value.operand,
            },
        });
        Value {
            operand: Operand::Var(dest),
            ty: to,
        }
    }

    fn expr(&mut self, expr: &Expr) -> Value {
        match expr {
            Expr::Arith { op, lhs, rhs } => {
                let lhs = self.expr(lhs);
                let rhs = self.expr(rhs);
                let (lhs, rhs, ty) = self.coerce(lhs, rhs);
                let dest = self.temp();
                self.emitter.emit(Quad::Arith {
                    op: *op,
                    ty,
                    dest: dest.clone(),
                    lhs: lhs.operand,
                    rhs: rhs.operand,
                });
                Value {
                    operand: Operand::Var(dest),
                    ty,
                }
            }
            Expr::Cast { ty, expr, line } => {
                let value = self.expr(expr);
                if value.ty == *ty {
                    self.report(*line, Error::RedundantCast(*ty));
                }
                self.convert(value, *ty)
            }
            Expr::Id(name) => {
                let ty = self.variable(name);
                Value {
                    operand: Operand::Var(name.ident.clone()),
                    ty,
                }
            }
            Expr::Num(text) => Value {
                operand: Operand::Lit(text.clone()),
                ty: self.syms.type_of(text),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(ident: &str) -> Name {
        Name {
            ident: ident.into(),
            line: 1,
        }
    }

    fn decl(names: &[&str], ty: Ty) -> Declaration {
        Declaration {
            names: names.iter().map(|n| name(n)).collect(),
            ty,
        }
    }

    fn id(ident: &str) -> Expr {
        Expr::Id(name(ident))
    }

    fn num(text: &str) -> Expr {
        Expr::Num(text.into())
    }

    fn lt(lhs: Expr, rhs: Expr) -> BoolExpr {
        BoolExpr::Rel {
            op: RelOp::Lt,
            lhs,
            rhs,
            line: 1,
        }
    }

    fn listing(prgm: &Program) -> (Vec<String>, Vec<Diagnostic>) {
        let (code, diagnostics) = Translator::default().program(prgm).unwrap();
        (code.iter().map(ToString::to_string).collect(), diagnostics)
    }

    #[test]
    fn jump_lists_merge() {
        let mut emitter = Emitter::default();
        let l: Vec<Label> = (0..4).map(|_| emitter.forward_label()).collect();
        let l = |n: usize| l[n];
        let a = JumpLists {
            truelist: vec![l(0)],
            falselist: vec![l(1)],
        };
        let b = JumpLists {
            truelist: vec![l(2)],
            falselist: vec![l(3)],
        };
        assert_eq!(
            a.clone().and(b.clone()),
            JumpLists {
                truelist: vec![l(2)],
                falselist: vec![l(1), l(3)],
            }
        );
        assert_eq!(
            a.clone().or(b),
            JumpLists {
                truelist: vec![l(0), l(2)],
                falselist: vec![l(3)],
            }
        );
        assert_eq!(
            a.negate(),
            JumpLists {
                truelist: vec![l(1)],
                falselist: vec![l(0)],
            }
        );
    }

    #[test]
    fn if_else_targets() {
        let prgm = Program {
            declarations: vec![decl(&["x"], Ty::Int)],
            body: vec![Stmt::If {
                cond: lt(id("x"), num("1")),
                then: Box::new(Stmt::Output {
                    value: num("1"),
                    line: 1,
                }),
                otherwise: Box::new(Stmt::Output {
                    value: num("2"),
                    line: 1,
                }),
            }],
        };
        let (code, diagnostics) = listing(&prgm);
        assert!(diagnostics.is_empty());
        assert_eq!(
            code,
            [
                "ILSS t1 x 1",
                "JMPZ 6 t1",
                "JUMP 4",
                "IPRT 1",
                "JUMP 7",
                "IPRT 2",
                "HALT",
            ]
        );
    }

    #[test]
    fn ge_flips_the_strict_opposite() {
        let prgm = Program {
            declarations: vec![decl(&["x"], Ty::Float)],
            body: vec![Stmt::While {
                cond: BoolExpr::Rel {
                    op: RelOp::Ge,
                    lhs: id("x"),
                    rhs: num("2"),
                    line: 1,
                },
                body: Box::new(Stmt::Block(vec![])),
            }],
        };
        let (code, _) = listing(&prgm);
        assert_eq!(
            code,
            [
                "ITOR t1 2",
                "RLSS t2 x t1",
                "ISUB t2 1 t2",
                "JMPZ 7 t2",
                "JUMP 6",
                "JUMP 1",
                "HALT",
            ]
        );
    }

    #[test]
    fn break_leaves_the_loop() {
        let prgm = Program {
            declarations: vec![decl(&["x"], Ty::Int)],
            body: vec![
                Stmt::While {
                    cond: lt(id("x"), num("10")),
                    body: Box::new(Stmt::Break { line: 1 }),
                },
                Stmt::Output {
                    value: id("x"),
                    line: 1,
                },
            ],
        };
        let (code, diagnostics) = listing(&prgm);
        assert!(diagnostics.is_empty());
        assert_eq!(
            code,
            [
                "ILSS t1 x 10",
                "JMPZ 6 t1",
                "JUMP 4",
                "JUMP 6",
                "JUMP 1",
                "IPRT x",
                "HALT",
            ]
        );
    }

    #[test]
    fn break_at_top_level_is_reported() {
        let prgm = Program {
            declarations: vec![],
            body: vec![Stmt::Break { line: 4 }],
        };
        let (code, diagnostics) = listing(&prgm);
        assert_eq!(code, ["HALT"]);
        assert_eq!(
            diagnostics,
            [Diagnostic {
                line: 4,
                error: Error::BreakOutsideLoop
            }]
        );
    }

    #[test]
    fn switch_chain() {
        let prgm = Program {
            declarations: vec![decl(&["x"], Ty::Int)],
            body: vec![Stmt::Switch {
                subject: id("x"),
                cases: vec![
                    Case {
                        value: "1".into(),
                        body: vec![Stmt::Output {
                            value: num("10"),
                            line: 2,
                        }],
                        line: 2,
                    },
                    Case {
                        value: "2".into(),
                        body: vec![Stmt::Break { line: 3 }],
                        line: 3,
                    },
                ],
                default: vec![Stmt::Output {
                    value: num("30"),
                    line: 4,
                }],
                line: 1,
            }],
        };
        let (code, diagnostics) = listing(&prgm);
        assert!(diagnostics.is_empty());
        assert_eq!(
            code,
            [
                "IASN t1 x",
                "IEQL t2 t1 1",
                "JMPZ 6 t2",
                "IPRT 10",
                "JUMP 11",
                "IEQL t2 t1 2",
                "JMPZ 10 t2",
                "JUMP 11",
                "JUMP 11",
                "IPRT 30",
                "HALT",
            ]
        );
    }

    #[test]
    fn float_case_and_subject_are_reported() {
        let prgm = Program {
            declarations: vec![decl(&["y"], Ty::Float)],
            body: vec![Stmt::Switch {
                subject: id("y"),
                cases: vec![Case {
                    value: "1.5".into(),
                    body: vec![],
                    line: 2,
                }],
                default: vec![],
                line: 1,
            }],
        };
        let (_, diagnostics) = listing(&prgm);
        assert_eq!(
            diagnostics,
            [
                Diagnostic {
                    line: 1,
                    error: Error::IllegalSwitchType(Ty::Float)
                },
                Diagnostic {
                    line: 2,
                    error: Error::IllegalCaseType(Ty::Float, "1.5".into())
                },
            ]
        );
    }

    #[test]
    fn redundant_cast_still_converts() {
        let prgm = Program {
            declarations: vec![decl(&["x"], Ty::Int)],
            body: vec![Stmt::Assign {
                target: name("x"),
                value: Expr::Cast {
                    ty: Ty::Int,
                    expr: Box::new(id("x")),
                    line: 5,
                },
                line: 5,
            }],
        };
        let (code, diagnostics) = listing(&prgm);
        assert_eq!(code, ["RTOI t1 x", "IASN x t1", "HALT"]);
        assert_eq!(
            diagnostics,
            [Diagnostic {
                line: 5,
                error: Error::RedundantCast(Ty::Int)
            }]
        );
    }

    #[test]
    fn undeclared_is_reported_and_treated_as_int() {
        let prgm = Program {
            declarations: vec![],
            body: vec![Stmt::Output {
                value: id("z"),
                line: 1,
            }],
        };
        let (code, diagnostics) = listing(&prgm);
        assert_eq!(code, ["IPRT z", "HALT"]);
        assert_eq!(
            diagnostics,
            [Diagnostic {
                line: 1,
                error: Error::UndeclaredVariable("z".into())
            }]
        );
    }
}
