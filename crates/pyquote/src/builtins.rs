//! Names Python code can read without defining or importing them.
//!
//! The validator is handed a [`BuiltinNames`] when it is constructed rather than querying
//! an interpreter, so its answer depends only on the quotation and the set it was given.

use ahash::AHashSet;
use strum::{EnumIter, IntoEnumIterator, IntoStaticStr};

use crate::error::{CodeLoc, Error};

/// Built-in functions and types.
///
/// Uses strum derives so `Bytearray` -> "bytearray".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum BuiltinFunction {
    Abs,
    Aiter,
    All,
    Anext,
    Any,
    Ascii,
    Bin,
    Bool,
    Breakpoint,
    Bytearray,
    Bytes,
    Callable,
    Chr,
    Classmethod,
    Compile,
    Complex,
    Copyright,
    Credits,
    Delattr,
    Dict,
    Dir,
    Divmod,
    Enumerate,
    Eval,
    Exec,
    Exit,
    Filter,
    Float,
    Format,
    Frozenset,
    Getattr,
    Globals,
    Hasattr,
    Hash,
    Help,
    Hex,
    Id,
    Input,
    Int,
    Isinstance,
    Issubclass,
    Iter,
    Len,
    License,
    List,
    Locals,
    Map,
    Max,
    Memoryview,
    Min,
    Next,
    Object,
    Oct,
    Open,
    Ord,
    Pow,
    Print,
    Property,
    Quit,
    Range,
    Repr,
    Reversed,
    Round,
    Set,
    Setattr,
    Slice,
    Sorted,
    Staticmethod,
    Str,
    Sum,
    Super,
    Tuple,
    Type,
    Vars,
    Zip,
}

/// Built-in exception and warning classes, named exactly as the variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, IntoStaticStr)]
pub enum BuiltinException {
    BaseException,
    BaseExceptionGroup,
    GeneratorExit,
    KeyboardInterrupt,
    SystemExit,
    Exception,
    ArithmeticError,
    FloatingPointError,
    OverflowError,
    ZeroDivisionError,
    AssertionError,
    AttributeError,
    BufferError,
    EOFError,
    ExceptionGroup,
    ImportError,
    ModuleNotFoundError,
    LookupError,
    IndexError,
    KeyError,
    MemoryError,
    NameError,
    UnboundLocalError,
    OSError,
    EnvironmentError,
    IOError,
    BlockingIOError,
    ChildProcessError,
    ConnectionError,
    BrokenPipeError,
    ConnectionAbortedError,
    ConnectionRefusedError,
    ConnectionResetError,
    FileExistsError,
    FileNotFoundError,
    InterruptedError,
    IsADirectoryError,
    NotADirectoryError,
    PermissionError,
    ProcessLookupError,
    TimeoutError,
    ReferenceError,
    RuntimeError,
    NotImplementedError,
    RecursionError,
    StopAsyncIteration,
    StopIteration,
    SyntaxError,
    IndentationError,
    TabError,
    SystemError,
    TypeError,
    ValueError,
    UnicodeError,
    UnicodeDecodeError,
    UnicodeEncodeError,
    UnicodeTranslateError,
    Warning,
    BytesWarning,
    DeprecationWarning,
    EncodingWarning,
    FutureWarning,
    ImportWarning,
    PendingDeprecationWarning,
    ResourceWarning,
    RuntimeWarning,
    SyntaxWarning,
    UnicodeWarning,
    UserWarning,
}

/// Constants and module attributes present in `builtins` that are not functions or classes.
const BUILTIN_CONSTANTS: &[&str] = &[
    "None",
    "True",
    "False",
    "Ellipsis",
    "NotImplemented",
    "__debug__",
    "__build_class__",
    "__import__",
    "__name__",
    "__doc__",
    "__package__",
    "__loader__",
    "__spec__",
];

/// A named, read-only set of built-in names.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BuiltinNames {
    version: String,
    names: AHashSet<String>,
}

impl Default for BuiltinNames {
    fn default() -> Self {
        Self::python3()
    }
}

impl BuiltinNames {
    /// The names in `dir(builtins)` of CPython 3.12.
    #[must_use]
    pub fn python3() -> Self {
        let functions = BuiltinFunction::iter().map(<&'static str>::from);
        let exceptions = BuiltinException::iter().map(<&'static str>::from);
        let names = functions
            .chain(exceptions)
            .chain(BUILTIN_CONSTANTS.iter().copied())
            .map(str::to_owned)
            .collect();
        Self {
            version: "3.12".to_owned(),
            names,
        }
    }

    /// Creates a set from scratch.
    #[must_use]
    pub fn new(version: impl Into<String>, names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            version: version.into(),
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Loads a set from JSON of the form `{"version": "3.12", "names": ["len", ...]}`.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        serde_json::from_str(json).map_err(|e| {
            let line = u32::try_from(e.line()).unwrap_or(u32::MAX);
            let column = u32::try_from(e.column()).unwrap_or(u32::MAX);
            Error::BuiltinNames {
                msg: e.to_string().into(),
                position: CodeLoc::new(line, column),
            }
        })
    }

    /// Returns a copy of this set extended with `names`, e.g. names injected by a runtime.
    #[must_use]
    pub fn with_names(mut self, names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.names.extend(names.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
