use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use tracing::trace;

use crate::ast::{Document, MAX_NESTING, Node};
use crate::error::{BoxError, EvalError};

/// Supplies values for `<Name>` references
pub trait VariableSource {
    /// The value of `name`, or `None` if it is not defined
    fn resolve(&self, name: &str) -> Option<String>;
}

impl<S: BuildHasher> VariableSource for HashMap<String, String, S> {
    fn resolve(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl VariableSource for BTreeMap<String, String> {
    fn resolve(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl<F> VariableSource for F
where
    F: Fn(&str) -> Option<String>,
{
    fn resolve(&self, name: &str) -> Option<String> {
        self(name)
    }
}

/// Supplies implementations for `$Name(...)` calls
pub trait FunctionSource {
    /// Invoke `name` with already rendered arguments.
    ///
    /// Returns `None` when no function of that name accepts `args.len()`
    /// arguments.
    fn call(&self, name: &str, args: &[String]) -> Option<Result<String, BoxError>>;
}

impl<F> FunctionSource for F
where
    F: Fn(&str, &[String]) -> Option<Result<String, BoxError>>,
{
    fn call(&self, name: &str, args: &[String]) -> Option<Result<String, BoxError>> {
        self(name, args)
    }
}

/// Renders documents against a variable source and a function source
pub struct Renderer<'r, V: ?Sized, F: ?Sized> {
    variables: &'r V,
    functions: &'r F,
}

impl<'r, V, F> Renderer<'r, V, F>
where
    V: VariableSource + ?Sized,
    F: FunctionSource + ?Sized,
{
    pub fn new(variables: &'r V, functions: &'r F) -> Self {
        Self {
            variables,
            functions,
        }
    }

    /// Render a document to a string.
    ///
    /// Stops at the first failure; nothing rendered so far is returned.
    pub fn render(&self, document: &Document) -> Result<String, EvalError> {
        self.render_at(document, 0)
    }

    /// `depth` is the number of calls enclosing `document`
    fn render_at(&self, document: &Document, depth: usize) -> Result<String, EvalError> {
        let mut output = String::new();
        self.render_into(document, &mut output, depth)?;
        Ok(output)
    }

    fn render_into(
        &self,
        document: &Document,
        output: &mut String,
        depth: usize,
    ) -> Result<(), EvalError> {
        for node in document.nodes() {
            match node {
                Node::Literal(text) => output.push_str(text),
                Node::Variable(name) => {
                    let value = self.variables.resolve(name).ok_or_else(|| {
                        EvalError::UndefinedVariable {
                            name: name.clone(),
                        }
                    })?;
                    output.push_str(&value);
                }
                Node::Call { name, args } => {
                    let value = self.call(name, args, depth)?;
                    output.push_str(&value);
                }
            }
        }
        Ok(())
    }

    /// Render every argument depth-first, then invoke the function
    fn call(&self, name: &str, args: &[Document], depth: usize) -> Result<String, EvalError> {
        if depth == MAX_NESTING {
            return Err(EvalError::NestingTooDeep { limit: MAX_NESTING });
        }
        let rendered = args
            .iter()
            .map(|arg| self.render_at(arg, depth + 1))
            .collect::<Result<Vec<_>, _>>()?;

        trace!(function = name, args = ?rendered, "calling template function");
        match self.functions.call(name, &rendered) {
            Some(Ok(value)) => Ok(value),
            Some(Err(cause)) => Err(EvalError::FunctionFailure {
                name: name.to_string(),
                cause,
            }),
            None => Err(EvalError::UndefinedFunction {
                name: name.to_string(),
                arity: rendered.len(),
            }),
        }
    }
}

/// Render `document` with the given collaborators
pub fn render<V, F>(document: &Document, variables: &V, functions: &F) -> Result<String, EvalError>
where
    V: VariableSource + ?Sized,
    F: FunctionSource + ?Sized,
{
    Renderer::new(variables, functions).render(document)
}
