use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::{ConfigError, OutputError};
use crate::processor::{FunctionSource, Renderer, VariableSource};
use crate::template::Template;

/// Prefix marking an output as a temporary
pub const TEMPORARY_PREFIX: char = '_';

/// One named output template as written in configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputDef {
    pub name: String,
    pub template: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct OutputFile {
    #[serde(default, rename = "output")]
    outputs: Vec<OutputDef>,
}

/// An ordered list of named templates.
///
/// Outputs render in declaration order and each rendered value is visible to
/// later outputs as `<Name>`. Names starting with `_` are temporaries: usable
/// by later outputs but left out of the result.
#[derive(Debug, Clone)]
pub struct OutputSet {
    outputs: Vec<(String, Template)>,
}

impl OutputSet {
    /// Parse every template up front, rejecting duplicate names
    pub fn new(defs: impl IntoIterator<Item = OutputDef>) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();
        let mut outputs = Vec::new();

        for def in defs {
            if !seen.insert(def.name.clone()) {
                return Err(ConfigError::DuplicateOutput { name: def.name });
            }
            let template =
                Template::parse(def.template.as_str()).map_err(|source| ConfigError::InvalidTemplate {
                    name: def.name.clone(),
                    template: def.template.clone(),
                    source,
                })?;
            outputs.push((def.name, template));
        }

        Ok(Self { outputs })
    }

    /// Load from TOML made of `[[output]]` tables with `name` and `template`
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let file: OutputFile = toml::from_str(source)?;
        Self::new(file.outputs)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.outputs.iter().map(|(name, _)| name.as_str())
    }

    /// Render all outputs, returning `(name, value)` pairs in declaration
    /// order with temporaries removed.
    pub fn render<V, F>(&self, variables: &V, functions: &F) -> Result<Vec<(String, String)>, OutputError>
    where
        V: VariableSource + ?Sized,
        F: FunctionSource + ?Sized,
    {
        let mut rendered: HashMap<String, String> = HashMap::new();
        let mut results = Vec::with_capacity(self.outputs.len());

        for (name, template) in &self.outputs {
            let scope = Layered {
                rendered: &rendered,
                base: variables,
            };
            let value = Renderer::new(&scope, functions)
                .render(template.document())
                .map_err(|source| OutputError {
                    name: name.clone(),
                    template: template.source().to_string(),
                    source,
                })?;

            rendered.insert(name.clone(), value.clone());
            results.push((name.clone(), value));
        }

        results.retain(|(name, value)| {
            let temporary = name.starts_with(TEMPORARY_PREFIX);
            if temporary {
                debug!(output = %name, value = %value, "stripping temporary output");
            }
            !temporary
        });
        Ok(results)
    }
}

/// Earlier outputs layered over the caller's variables
struct Layered<'a, V: ?Sized> {
    rendered: &'a HashMap<String, String>,
    base: &'a V,
}

impl<V: VariableSource + ?Sized> VariableSource for Layered<'_, V> {
    fn resolve(&self, name: &str) -> Option<String> {
        self.rendered
            .get(name)
            .cloned()
            .or_else(|| self.base.resolve(name))
    }
}
