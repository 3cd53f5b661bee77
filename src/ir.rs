use std::fmt::Display;

use tracing::{debug, trace};

use crate::check::{SymTab, Ty};
use crate::Error;

/// A 1-based instruction address.
pub type Line = usize;

/// A logical jump target, resolved to a [`Line`] when the program is finished.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub struct Label(u32);

impl Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "L{}", self.0)
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Operand {
    Var(String),
    Lit(String),
}

impl Display for Operand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Var(name) => write!(f, "{name}"),
            Self::Lit(text) => write!(f, "{text}"),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CmpOp {
    Eql,
    Nql,
    Lss,
    Grt,
}

/// One quad. `T` is the jump target: [`Label`] while generating, [`Line`]
/// once resolved.
#[derive(Clone, PartialEq, Debug)]
pub enum Quad<T> {
    Asn {
        ty: Ty,
        dest: String,
        src: Operand,
    },
    Arith {
        op: ArithOp,
        ty: Ty,
        dest: String,
        lhs: Operand,
        rhs: Operand,
    },
    Cmp {
        op: CmpOp,
        ty: Ty,
        dest: String,
        lhs: Operand,
        rhs: Operand,
    },
    Itor {
        dest: String,
        src: Operand,
    },
    Rtoi {
        dest: String,
        src: Operand,
    },
    Prt {
        ty: Ty,
        src: Operand,
    },
    Inp {
        ty: Ty,
        dest: String,
    },
    Jump(T),
    Jmpz {
        target: T,
        cond: String,
    },
    Halt,
}

fn typed(ty: Ty, int: &'static str, real: &'static str) -> &'static str {
    match ty {
        Ty::Int => int,
        Ty::Float => real,
    }
}

impl<T> Quad<T> {
    pub fn opcode(&self) -> &'static str {
        match self {
            Self::Asn { ty, .. } => typed(*ty, "IASN", "RASN"),
            Self::Arith { op, ty, .. } => match op {
                ArithOp::Add => typed(*ty, "IADD", "RADD"),
                ArithOp::Sub => typed(*ty, "ISUB", "RSUB"),
                ArithOp::Mul => typed(*ty, "IMLT", "RMLT"),
                ArithOp::Div => typed(*ty, "IDIV", "RDIV"),
            },
            Self::Cmp { op, ty, .. } => match op {
                CmpOp::Eql => typed(*ty, "IEQL", "REQL"),
                CmpOp::Nql => typed(*ty, "INQL", "RNQL"),
                CmpOp::Lss => typed(*ty, "ILSS", "RLSS"),
                CmpOp::Grt => typed(*ty, "IGRT", "RGRT"),
            },
            Self::Itor { .. } => "ITOR",
            Self::Rtoi { .. } => "RTOI",
            Self::Prt { ty, .. } => typed(*ty, "IPRT", "RPRT"),
            Self::Inp { ty, .. } => typed(*ty, "IINP", "RINP"),
            Self::Jump(_) => "JUMP",
            Self::Jmpz { .. } => "JMPZ",
            Self::Halt => "HALT",
        }
    }

    pub fn target(&self) -> Option<&T> {
        match self {
            Self::Jump(target) | Self::Jmpz { target, .. } => Some(target),
            _ => None,
        }
    }

    /// Rewrite the jump target, if any.
    pub fn try_map_target<U, E>(self, f: impl FnOnce(T) -> Result<U, E>) -> Result<Quad<U>, E> {
        Ok(match self {
            Self::Jump(target) => Quad::Jump(f(target)?),
            Self::Jmpz { target, cond } => Quad::Jmpz {
                target: f(target)?,
                cond,
            },
            Self::Asn { ty, dest, src } => Quad::Asn { ty, dest, src },
            Self::Arith {
                op,
                ty,
                dest,
                lhs,
                rhs,
            } => Quad::Arith {
                op,
                ty,
                dest,
                lhs,
                rhs,
            },
            Self::Cmp {
                op,
                ty,
                dest,
                lhs,
                rhs,
            } => Quad::Cmp {
                op,
                ty,
                dest,
                lhs,
                rhs,
            },
            Self::Itor { dest, src } => Quad::Itor { dest, src },
            Self::Rtoi { dest, src } => Quad::Rtoi { dest, src },
            Self::Prt { ty, src } => Quad::Prt { ty, src },
            Self::Inp { ty, dest } => Quad::Inp { ty, dest },
            Self::Halt => Quad::Halt,
        })
    }
}

impl<T: Display> Display for Quad<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let op = self.opcode();
        match self {
            Self::Asn { dest, src, .. } | Self::Itor { dest, src } | Self::Rtoi { dest, src } => {
                write!(f, "{op} {dest} {src}")
            }
            Self::Arith { dest, lhs, rhs, .. } | Self::Cmp { dest, lhs, rhs, .. } => {
                write!(f, "{op} {dest} {lhs} {rhs}")
            }
            Self::Prt { src, .. } => write!(f, "{op} {src}"),
            Self::Inp { dest, .. } => write!(f, "{op} {dest}"),
            Self::Jump(target) => write!(f, "{op} {target}"),
            Self::Jmpz { target, cond } => write!(f, "{op} {target} {cond}"),
            Self::Halt => write!(f, "{op}"),
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum Binding {
    Line(Line),
    Label(Label),
    Open,
}

/// Logical label → target. Backpatching only ever writes here; instructions
/// keep their labels until [`Emitter::finish`].
#[derive(Default, Debug)]
pub struct LabelTable {
    slots: Vec<Binding>,
}

impl LabelTable {
    fn push(&mut self, binding: Binding) -> Label {
        let label = Label(self.slots.len() as u32);
        self.slots.push(binding);
        label
    }

    fn redirect(&mut self, label: Label, target: Label) {
        self.slots[label.0 as usize] = Binding::Label(target);
    }

    /// Follow `label` until it reaches a line.
    pub fn resolve(&self, label: Label) -> Result<Line, Error> {
        let mut at = label;
        // a chain can be at most as long as the table
        for _ in 0..=self.slots.len() {
            match self.slots.get(at.0 as usize) {
                Some(Binding::Line(line)) => return Ok(*line),
                Some(Binding::Label(next)) => at = *next,
                Some(Binding::Open) | None => return Err(Error::UnresolvedLabel(label.to_string())),
            }
        }
        Err(Error::UnresolvedLabel(label.to_string()))
    }
}

/// Append-only quad buffer with its temp counter and label table.
#[derive(Default, Debug)]
pub struct Emitter {
    quads: Vec<Quad<Label>>,
    labels: LabelTable,
    temps: u32,
}

impl Emitter {
    pub fn emit(&mut self, quad: Quad<Label>) {
        trace!(line = self.current_line(), "{}", quad);
        self.quads.push(quad);
    }

    /// Address the next emitted quad will get.
    pub fn current_line(&self) -> Line {
        self.quads.len() + 1
    }

    pub fn new_label(&mut self, at_line: Line) -> Label {
        self.labels.push(Binding::Line(at_line))
    }

    /// A label marking the current line.
    pub fn mark(&mut self) -> Label {
        self.new_label(self.current_line())
    }

    /// A label whose target is not known yet; it must be backpatched before
    /// [`Emitter::finish`].
    pub fn forward_label(&mut self) -> Label {
        self.labels.push(Binding::Open)
    }

    /// Emit an unconditional jump to a not-yet-known target.
    pub fn jump_forward(&mut self) -> Label {
        let label = self.forward_label();
        self.emit(Quad::Jump(label));
        label
    }

    pub fn backpatch(&mut self, labels: &[Label], target: Label) {
        for label in labels {
            self.labels.redirect(*label, target);
        }
    }

    /// Fresh temporary name that does not collide with a declared variable.
    pub fn new_temp(&mut self, syms: &SymTab) -> String {
        loop {
            self.temps += 1;
            let name = format!("t{}", self.temps);
            if !syms.contains(&name) {
                return name;
            }
        }
    }

    /// Resolve every jump to its final line.
    pub fn finish(self) -> Result<Vec<Quad<Line>>, Error> {
        let labels = self.labels;
        let code = self
            .quads
            .into_iter()
            .map(|quad| quad.try_map_target(|label| labels.resolve(label)))
            .collect::<Result<Vec<_>, Error>>()?;
        let len = code.len();
        if let Some(line) = code
            .iter()
            .filter_map(Quad::target)
            .find(|line| **line == 0 || **line > len)
        {
            return Err(Error::BadTarget(*line));
        }
        debug!(quads = len, "labels resolved");
        Ok(code)
    }
}
