use std::fmt::Display;

use indexmap::IndexMap;

use crate::Error;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Ty {
    Int,
    Float,
}

impl Display for Ty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Int => "int",
                Self::Float => "float",
            }
        )
    }
}

impl Ty {
    /// Type of a literal token: anything with a decimal point is a float.
    pub fn of_literal(text: &str) -> Self {
        if text.contains('.') {
            Self::Float
        } else {
            Self::Int
        }
    }

    /// The type a mixed binary operation is carried out in. Float wins.
    pub fn unify(self, other: Self) -> Self {
        if self == Self::Float || other == Self::Float {
            Self::Float
        } else {
            Self::Int
        }
    }

    pub fn expect_int(self) -> Result<(), Self> {
        match self {
            Self::Int => Ok(()),
            Self::Float => Err(self),
        }
    }
}

/// Declared variables in declaration order.
///
/// A name is inserted as soon as it is seen in an id-list and stays pending
/// until the type that closes the declaration is bound with
/// [`SymTab::bind_pending`].
#[derive(Default, Debug)]
pub struct SymTab {
    table: IndexMap<String, Option<Ty>>,
}

impl SymTab {
    /// Insert a not-yet-typed name.
    pub fn insert(&mut self, name: &str) -> Result<(), Error> {
        if self.table.contains_key(name) {
            return Err(Error::DuplicateDeclaration(name.to_owned()));
        }
        self.table.insert(name.to_owned(), None);
        Ok(())
    }

    /// Give `ty` to the trailing run of pending names.
    pub fn bind_pending(&mut self, ty: Ty) {
        for (_, slot) in self.table.iter_mut().rev() {
            if slot.is_some() {
                break;
            }
            *slot = Some(ty);
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.table.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<Ty> {
        self.table.get(name).copied().flatten()
    }

    /// The declared type of `name`, or an undeclared-variable error.
    pub fn lookup(&self, name: &str) -> Result<Ty, Error> {
        match self.table.get(name) {
            Some(ty) => Ok(ty.unwrap_or(Ty::Int)),
            None => Err(Error::UndeclaredVariable(name.to_owned())),
        }
    }

    /// Infer the type of an operand token.
    ///
    /// Undeclared names and integer literals both come out as `int`; use
    /// [`SymTab::lookup`] to report the former.
    pub fn type_of(&self, token: &str) -> Ty {
        match Ty::of_literal(token) {
            Ty::Float => Ty::Float,
            Ty::Int => self.get(token).unwrap_or(Ty::Int),
        }
    }

    pub fn has_pending(&self) -> bool {
        self.table.values().any(Option::is_none)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}
