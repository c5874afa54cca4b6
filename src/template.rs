use std::str::FromStr;

use crate::ast::Document;
use crate::error::Error;
use crate::processor::{FunctionSource, Renderer, VariableSource};

/// A parsed template together with the source it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    document: Document,
}

impl Template {
    pub fn parse(source: impl Into<String>) -> Result<Self, Error> {
        let source = source.into();
        let document = crate::parse(&source)?;
        Ok(Self { source, document })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn render<V, F>(&self, variables: &V, functions: &F) -> Result<String, Error>
    where
        V: VariableSource + ?Sized,
        F: FunctionSource + ?Sized,
    {
        Ok(Renderer::new(variables, functions).render(&self.document)?)
    }
}

impl FromStr for Template {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Template::parse(s)
    }
}
