use std::collections::HashMap;
use std::fmt;

use tracing::warn;

use crate::builtins;
use crate::error::{BoxError, BuiltinError};
use crate::processor::FunctionSource;

type Function = Box<dyn Fn(&[String]) -> Result<String, BoxError> + Send + Sync>;

/// Number of arguments a function accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Exact(n) => count == n,
            Arity::AtLeast(n) => count >= n,
        }
    }
}

/// What a table function does with a key it does not contain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingKey {
    /// Fail the render
    Fail,
    /// Produce an empty string and log a warning
    Empty,
}

struct Entry {
    name: String,
    arity: Arity,
    function: Function,
}

/// Named template functions, looked up case-insensitively
#[derive(Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, Entry>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the standard functions (`If`, `PadLeft`, `Trim`, ...)
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        builtins::install(&mut registry);
        registry
    }

    /// Register a function, replacing any existing one with the same name
    pub fn register<F>(&mut self, name: &str, arity: Arity, function: F)
    where
        F: Fn(&[String]) -> Result<String, BoxError> + Send + Sync + 'static,
    {
        self.functions.insert(
            name.to_lowercase(),
            Entry {
                name: name.to_string(),
                arity,
                function: Box::new(function),
            },
        );
    }

    /// Expose a key/value table as a one-argument function, e.g.
    /// `$GitInfo(BranchName)`
    pub fn register_table<I, K, V>(&mut self, name: &str, table: I, missing: MissingKey)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let table: HashMap<String, String> = table
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        let table_name = name.to_string();

        self.register(name, Arity::Exact(1), move |args| {
            let key = &args[0];
            match (table.get(key), missing) {
                (Some(value), _) => Ok(value.clone()),
                (None, MissingKey::Empty) => {
                    warn!(table = %table_name, key = %key, "table lookup is empty");
                    Ok(String::new())
                }
                (None, MissingKey::Fail) => Err(BuiltinError::UndefinedKey {
                    table: table_name.clone(),
                    key: key.clone(),
                }
                .into()),
            }
        });
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(&name.to_lowercase())
    }

    pub fn arity(&self, name: &str) -> Option<Arity> {
        self.functions.get(&name.to_lowercase()).map(|e| e.arity)
    }

    /// Registered names with their original casing
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.values().map(|e| e.name.as_str())
    }
}

impl FunctionSource for FunctionRegistry {
    fn call(&self, name: &str, args: &[String]) -> Option<Result<String, BoxError>> {
        let entry = self.functions.get(&name.to_lowercase())?;
        if !entry.arity.accepts(args.len()) {
            return None;
        }
        Some((entry.function)(args))
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.names().collect();
        names.sort_unstable();
        f.debug_struct("FunctionRegistry")
            .field("functions", &names)
            .finish()
    }
}
