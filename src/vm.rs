//! An interpreter for resolved quad programs.

use std::collections::HashMap;
use std::fmt::Display;

use tracing::trace;

use crate::check::Ty;
use crate::ir::{ArithOp, CmpOp, Line, Operand, Quad};
use crate::Error;

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Value {
    Int(i64),
    Real(f64),
}

impl Value {
    fn as_int(self) -> i64 {
        match self {
            Self::Int(i) => i,
            #[allow(clippy::cast_possible_truncation)]
            Self::Real(r) => r as i64,
        }
    }

    fn as_real(self) -> f64 {
        match self {
            #[allow(clippy::cast_precision_loss)]
            Self::Int(i) => i as f64,
            Self::Real(r) => r,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Real(r) => write!(f, "{r:?}"),
        }
    }
}

/// What a finished run produced.
#[derive(Debug, Default)]
pub struct Outcome {
    pub output: Vec<Value>,
    /// `visited[n - 1]` is set once line `n` has executed.
    pub visited: Vec<bool>,
}

pub struct Vm<'a> {
    code: &'a [Quad<Line>],
    vars: HashMap<&'a str, Value>,
    input: std::vec::IntoIter<String>,
    step_limit: usize,
}

impl<'a> Vm<'a> {
    pub fn new(code: &'a [Quad<Line>]) -> Self {
        Self {
            code,
            vars: HashMap::new(),
            input: Vec::new().into_iter(),
            step_limit: 100_000,
        }
    }

    /// Tokens consumed, in order, by `IINP`/`RINP`.
    #[must_use]
    pub fn with_input<S: ToString>(mut self, input: impl IntoIterator<Item = S>) -> Self {
        self.input = input
            .into_iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .into_iter();
        self
    }

    #[must_use]
    pub fn step_limit(mut self, steps: usize) -> Self {
        self.step_limit = steps;
        self
    }

    fn load(&self, operand: &Operand) -> Result<Value, Error> {
        match operand {
            Operand::Var(name) => Ok(self
                .vars
                .get(name.as_str())
                .copied()
                .unwrap_or(Value::Int(0))),
            Operand::Lit(text) => parse_literal(text),
        }
    }

    fn store(&mut self, dest: &'a str, value: Value) {
        self.vars.insert(dest, value);
    }

    fn read(&mut self, ty: Ty) -> Result<Value, Error> {
        let token = self.input.next().ok_or(Error::InputExhausted)?;
        let bad = || Error::BadInput(token.clone());
        Ok(match ty {
            Ty::Int => Value::Int(token.trim().parse().map_err(|_| bad())?),
            Ty::Float => Value::Real(token.trim().parse().map_err(|_| bad())?),
        })
    }

    /// Execute from line 1 until `HALT`.
    ///
    /// # Errors
    /// On division by zero, bad or missing input, a jump out of the program or
    /// running past the step limit.
    pub fn run(mut self) -> Result<Outcome, Error> {
        let code = self.code;
        let mut outcome = Outcome {
            output: Vec::new(),
            visited: vec![false; code.len()],
        };
        let mut pc: Line = 1;
        for _ in 0..self.step_limit {
            let quad = code.get(pc.wrapping_sub(1)).ok_or(Error::BadTarget(pc))?;
            outcome.visited[pc - 1] = true;
            trace!(pc, "{}", quad);
            pc += 1;
            match quad {
                Quad::Asn { ty, dest, src } => {
                    let value = self.load(src)?;
                    let value = match ty {
                        Ty::Int => Value::Int(value.as_int()),
                        Ty::Float => Value::Real(value.as_real()),
                    };
                    self.store(dest, value);
                }
                Quad::Arith {
                    op,
                    ty,
                    dest,
                    lhs,
                    rhs,
                } => {
                    let lhs = self.load(lhs)?;
                    let rhs = self.load(rhs)?;
                    let value = match ty {
                        Ty::Int => Value::Int(int_arith(*op, lhs.as_int(), rhs.as_int())?),
                        Ty::Float => Value::Real(real_arith(*op, lhs.as_real(), rhs.as_real())),
                    };
                    self.store(dest, value);
                }
                Quad::Cmp {
                    op,
                    ty,
                    dest,
                    lhs,
                    rhs,
                } => {
                    let lhs = self.load(lhs)?;
                    let rhs = self.load(rhs)?;
                    let holds = match ty {
                        Ty::Int => compare(*op, &lhs.as_int(), &rhs.as_int()),
                        Ty::Float => compare(*op, &lhs.as_real(), &rhs.as_real()),
                    };
                    self.store(dest, Value::Int(i64::from(holds)));
                }
                Quad::Itor { dest, src } => {
                    let value = self.load(src)?;
                    self.store(dest, Value::Real(value.as_real()));
                }
                Quad::Rtoi { dest, src } => {
                    let value = self.load(src)?;
                    self.store(dest, Value::Int(value.as_int()));
                }
                Quad::Prt { ty, src } => {
                    let value = self.load(src)?;
                    outcome.output.push(match ty {
                        Ty::Int => Value::Int(value.as_int()),
                        Ty::Float => Value::Real(value.as_real()),
                    });
                }
                Quad::Inp { ty, dest } => {
                    let value = self.read(*ty)?;
                    self.store(dest, value);
                }
                Quad::Jump(target) => pc = *target,
                Quad::Jmpz { target, cond } => {
                    if self.load(&Operand::Var(cond.clone()))?.as_real() == 0.0 {
                        pc = *target;
                    }
                }
                Quad::Halt => return Ok(outcome),
            }
        }
        Err(Error::StepLimit(self.step_limit))
    }
}

fn parse_literal(text: &str) -> Result<Value, Error> {
    let bad = || Error::BadLiteral(text.to_owned());
    if text.contains('.') {
        text.parse().map(Value::Real).map_err(|_| bad())
    } else {
        text.parse().map(Value::Int).map_err(|_| bad())
    }
}

fn int_arith(op: ArithOp, lhs: i64, rhs: i64) -> Result<i64, Error> {
    Ok(match op {
        ArithOp::Add => lhs.wrapping_add(rhs),
        ArithOp::Sub => lhs.wrapping_sub(rhs),
        ArithOp::Mul => lhs.wrapping_mul(rhs),
        ArithOp::Div => lhs.checked_div(rhs).ok_or(Error::DivisionByZero)?,
    })
}

fn real_arith(op: ArithOp, lhs: f64, rhs: f64) -> f64 {
    match op {
        ArithOp::Add => lhs + rhs,
        ArithOp::Sub => lhs - rhs,
        ArithOp::Mul => lhs * rhs,
        ArithOp::Div => lhs / rhs,
    }
}

fn compare<T: PartialOrd>(op: CmpOp, lhs: &T, rhs: &T) -> bool {
    match op {
        CmpOp::Eql => lhs == rhs,
        CmpOp::Nql => lhs != rhs,
        CmpOp::Lss => lhs < rhs,
        CmpOp::Grt => lhs > rhs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str) -> Operand {
        Operand::Var(name.into())
    }

    fn lit(text: &str) -> Operand {
        Operand::Lit(text.into())
    }

    #[test]
    fn counts_down() {
        // x = input; while x > 0 { print x; x = x - 1 }
        let code = vec![
            Quad::Inp {
                ty: Ty::Int,
                dest: "x".into(),
            },
            Quad::Cmp {
                op: CmpOp::Grt,
                ty: Ty::Int,
                dest: "t1".into(),
                lhs: var("x"),
                rhs: lit("0"),
            },
            Quad::Jmpz {
                target: 7,
                cond: "t1".into(),
            },
            Quad::Prt {
                ty: Ty::Int,
                src: var("x"),
            },
            Quad::Arith {
                op: ArithOp::Sub,
                ty: Ty::Int,
                dest: "x".into(),
                lhs: var("x"),
                rhs: lit("1"),
            },
            Quad::Jump(2),
            Quad::Halt,
        ];
        let outcome = Vm::new(&code).with_input(["3"]).run().unwrap();
        assert_eq!(
            outcome.output,
            [Value::Int(3), Value::Int(2), Value::Int(1)]
        );
        assert!(outcome.visited.iter().all(|v| *v));
    }

    #[test]
    fn real_ops_and_truncation() {
        let code = vec![
            Quad::Itor {
                dest: "t1".into(),
                src: lit("7"),
            },
            Quad::Arith {
                op: ArithOp::Div,
                ty: Ty::Float,
                dest: "t2".into(),
                lhs: var("t1"),
                rhs: lit("2.0"),
            },
            Quad::Rtoi {
                dest: "t3".into(),
                src: var("t2"),
            },
            Quad::Prt {
                ty: Ty::Float,
                src: var("t2"),
            },
            Quad::Prt {
                ty: Ty::Int,
                src: var("t3"),
            },
            Quad::Halt,
        ];
        let outcome = Vm::new(&code).run().unwrap();
        assert_eq!(outcome.output, [Value::Real(3.5), Value::Int(3)]);
        assert_eq!(outcome.output[0].to_string(), "3.5");
    }

    #[test]
    fn faults() {
        let div = vec![
            Quad::Arith {
                op: ArithOp::Div,
                ty: Ty::Int,
                dest: "t1".into(),
                lhs: lit("1"),
                rhs: lit("0"),
            },
            Quad::Halt,
        ];
        assert_eq!(Vm::new(&div).run().unwrap_err(), Error::DivisionByZero);

        let spin = vec![Quad::Jump(1)];
        assert_eq!(
            Vm::new(&spin).step_limit(10).run().unwrap_err(),
            Error::StepLimit(10)
        );

        let read = vec![
            Quad::Inp {
                ty: Ty::Int,
                dest: "x".into(),
            },
            Quad::Halt,
        ];
        assert_eq!(Vm::new(&read).run().unwrap_err(), Error::InputExhausted);
        assert_eq!(
            Vm::new(&read).with_input(["1.5"]).run().unwrap_err(),
            Error::BadInput("1.5".into())
        );
    }
}
