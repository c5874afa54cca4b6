/// Deepest call nesting the parser accepts and the renderer evaluates
pub const MAX_NESTING: usize = 100;

/// A single element of a parsed template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Text rendered verbatim
    Literal(String),
    /// Variable reference: `<Name>`
    Variable(String),
    /// Function call: `$Name(arg, ...)`, each argument a nested template
    Call { name: String, args: Vec<Document> },
}

/// An ordered sequence of nodes: a whole template or one call argument.
///
/// Adjacent literal text is always merged, so a document never holds two
/// `Literal` nodes in a row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Append a node, merging literal text into a trailing literal
    pub fn push(&mut self, node: Node) {
        if let Node::Literal(text) = &node {
            if text.is_empty() {
                return;
            }
            if let Some(Node::Literal(last)) = self.nodes.last_mut() {
                last.push_str(text);
                return;
            }
        }
        self.nodes.push(node);
    }

    /// Names of all referenced variables, depth-first in source order
    pub fn variables(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.walk(&mut |node| {
            if let Node::Variable(name) = node {
                names.push(name.as_str());
            }
        });
        names
    }

    /// Name and argument count of every call, depth-first in source order
    pub fn functions(&self) -> Vec<(&str, usize)> {
        let mut calls = Vec::new();
        self.walk(&mut |node| {
            if let Node::Call { name, args } = node {
                calls.push((name.as_str(), args.len()));
            }
        });
        calls
    }

    fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Node)) {
        for node in &self.nodes {
            visit(node);
            if let Node::Call { args, .. } = node {
                for arg in args {
                    arg.walk(visit);
                }
            }
        }
    }
}

impl FromIterator<Node> for Document {
    fn from_iter<I: IntoIterator<Item = Node>>(iter: I) -> Self {
        let mut document = Document::new();
        for node in iter {
            document.push(node);
        }
        document
    }
}

impl From<Vec<Node>> for Document {
    fn from(nodes: Vec<Node>) -> Self {
        nodes.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_push_merges_literals() {
        let mut document = Document::new();
        document.push(Node::Literal("a".to_string()));
        document.push(Node::Literal("b".to_string()));
        document.push(Node::Variable("x".to_string()));
        document.push(Node::Literal("c".to_string()));
        assert_eq!(
            document.nodes(),
            &[
                Node::Literal("ab".to_string()),
                Node::Variable("x".to_string()),
                Node::Literal("c".to_string()),
            ]
        );
    }

    #[test]
    fn test_push_skips_empty_literal() {
        let document = Document::from(vec![Node::Literal(String::new())]);
        assert!(document.is_empty());
    }

    #[test]
    fn test_introspection_is_depth_first() {
        let document = Document::from(vec![
            Node::Variable("a".to_string()),
            Node::Call {
                name: "Outer".to_string(),
                args: vec![
                    Document::from(vec![Node::Call {
                        name: "Inner".to_string(),
                        args: vec![Document::from(vec![Node::Variable("b".to_string())])],
                    }]),
                    Document::from(vec![Node::Variable("c".to_string())]),
                ],
            },
        ]);
        assert_eq!(document.variables(), vec!["a", "b", "c"]);
        assert_eq!(document.functions(), vec![("Outer", 2), ("Inner", 1)]);
    }
}
