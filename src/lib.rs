pub mod ast;
pub mod check;
pub mod gen;
pub mod ir;
pub mod log;
pub mod opt;
pub mod parse;
pub mod vm;

use std::fmt::Display;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use tracing::{debug, info};

use crate::check::Ty;
use crate::ir::{Line, Quad};

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("symbol='{0}'")]
    Lexical(char),

    #[error("{0}")]
    Syntax(String),

    #[error("multiple declarations of '{0}'")]
    DuplicateDeclaration(String),

    #[error("undeclared variable '{0}'")]
    UndeclaredVariable(String),

    #[error("can't assign 'float' to 'int', variable='{0}'")]
    NarrowingAssignment(String),

    #[error("casting from '{0}' to '{0}'")]
    RedundantCast(Ty),

    #[error("illegal type '{0}' in switch")]
    IllegalSwitchType(Ty),

    #[error("illegal type '{0}' in case, value='{1}'")]
    IllegalCaseType(Ty, String),

    #[error("illegal 'break;' outside of while/switch")]
    BreakOutsideLoop,

    #[error("label {0} was never resolved")]
    UnresolvedLabel(String),

    #[error("jump to line {0} is outside the program")]
    BadTarget(Line),

    #[error("malformed literal '{0}'")]
    BadLiteral(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("ran out of input")]
    InputExhausted,

    #[error("bad input '{0}'")]
    BadInput(String),

    #[error("no HALT after {0} steps")]
    StepLimit(usize),
}

/// An error tied to the source line it was found on.
#[derive(Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub line: usize,
    pub error: Error,
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Self { line, error } = self;
        match error {
            Error::Lexical(_) => write!(f, "Lexical error at line {line}, {error}"),
            Error::Syntax(_) => write!(f, "Syntax error at line {line}, {error}"),
            _ => write!(f, "error at line {line}, {error}"),
        }
    }
}

/// The source could not be turned into a syntax tree, so nothing was
/// generated.
#[derive(Debug, thiserror::Error)]
#[error("file has illegal syntax, generation aborted")]
pub struct Aborted {
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Clone, Debug)]
pub struct Options {
    /// Run the peephole pass over the finished program.
    pub optimize: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self { optimize: true }
    }
}

#[derive(Debug)]
pub struct Compilation {
    pub code: Vec<Quad<Line>>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Compilation {
    /// Whether the listing may be written out.
    pub fn succeeded(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn listing(&self) -> String {
        self.code.iter().map(|quad| format!("{quad}\n")).collect()
    }
}

/// Compile CPL source to quads.
///
/// Semantic errors do not stop generation; they are returned in
/// [`Compilation::diagnostics`].
///
/// # Errors
/// If the source does not parse.
pub fn compile(source: &str, options: &Options) -> Result<Compilation, Aborted> {
    let (prgm, mut diagnostics) = parse::parse(source)?;
    let (code, semantic) = gen::Translator::default()
        .program(&prgm)
        .map_err(|error| Aborted {
            diagnostics: vec![Diagnostic { line: 0, error }],
        })?;
    diagnostics.extend(semantic);
    let code = if options.optimize {
        opt::peephole(code)
    } else {
        code
    };
    debug!(quads = code.len(), errors = diagnostics.len(), "compiled");
    Ok(Compilation { code, diagnostics })
}

/// Where the listing for `source` goes: `prog.ou` → `prog.qud`.
pub fn listing_path(source: &Path) -> PathBuf {
    source.with_extension("qud")
}

/// Read and compile the file at `source`, printing its diagnostics.
///
/// # Errors
/// If the file is not a readable `.ou` file, does not parse, or compilation
/// reported any error.
pub fn compile_file(source: &Path, options: &Options) -> anyhow::Result<Compilation> {
    if source.extension().and_then(|ext| ext.to_str()) != Some("ou") {
        bail!("invalid file type {}, expected a .ou file", source.display());
    }
    let contents = std::fs::read_to_string(source)
        .with_context(|| format!("failed to read {}", source.display()))?;
    info!("compiling {}", source.display());
    let compilation = match compile(&contents, options) {
        Ok(compilation) => compilation,
        Err(aborted) => {
            for diagnostic in &aborted.diagnostics {
                println!("{diagnostic}");
            }
            return Err(aborted.into());
        }
    };
    for diagnostic in &compilation.diagnostics {
        println!("{diagnostic}");
    }
    if !compilation.succeeded() {
        bail!(
            "{} error(s) found, aborting creation of {}",
            compilation.diagnostics.len(),
            listing_path(source).display()
        );
    }
    Ok(compilation)
}
