//! Minimal HCL block writer used by render functions

use std::fmt::Write;

/// Attribute value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Number(i64),
    Bool(bool),
    /// Raw reference expression, written unquoted
    Expression(String),
    List(Vec<Value>),
}

impl Value {
    pub fn string(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }

    pub fn expression(value: impl Into<String>) -> Self {
        Self::Expression(value.into())
    }

    /// A list of reference expressions
    pub fn expressions<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::List(values.into_iter().map(|v| Self::Expression(v.into())).collect())
    }

    fn write_to(&self, out: &mut String) {
        match self {
            Self::String(value) => {
                out.push('"');
                out.push_str(&escape(value));
                out.push('"');
            }
            Self::Number(value) => {
                let _ = write!(out, "{value}");
            }
            Self::Bool(value) => {
                let _ = write!(out, "{value}");
            }
            // A lookup miss leaves an empty expression behind.
            Self::Expression(value) if value.is_empty() => out.push_str("\"\""),
            Self::Expression(value) => out.push_str(value),
            Self::List(values) => {
                out.push('[');
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    value.write_to(out);
                }
                out.push(']');
            }
        }
    }
}

/// A block such as `resource "type" "name" { ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    kind: String,
    labels: Vec<String>,
    attributes: Vec<(String, Value)>,
    blocks: Vec<Block>,
}

impl Block {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            labels: Vec::new(),
            attributes: Vec::new(),
            blocks: Vec::new(),
        }
    }

    /// `resource "<resource_type>" "<name>"`
    pub fn resource(resource_type: &str, name: &str) -> Self {
        Self::new("resource").label(resource_type).label(name)
    }

    /// `variable "<name>"`
    pub fn variable(name: &str) -> Self {
        Self::new("variable").label(name)
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.labels.push(label.into());
        self
    }

    pub fn attribute(mut self, name: impl Into<String>, value: Value) -> Self {
        self.attributes.push((name.into(), value));
        self
    }

    /// Add the attribute only when `value` is `Some`
    pub fn optional(self, name: impl Into<String>, value: Option<Value>) -> Self {
        match value {
            Some(value) => self.attribute(name, value),
            None => self,
        }
    }

    pub fn block(mut self, block: Block) -> Self {
        self.blocks.push(block);
        self
    }

    /// Render the block as text
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.write_to(&mut out, 0);
        out
    }

    fn write_to(&self, out: &mut String, depth: usize) {
        let indent = "  ".repeat(depth);
        out.push_str(&indent);
        out.push_str(&self.kind);
        for label in &self.labels {
            let _ = write!(out, " \"{}\"", escape(label));
        }
        out.push_str(" {\n");

        let width = self.attributes.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
        for (name, value) in &self.attributes {
            let _ = write!(out, "{indent}  {name:width$} = ");
            value.write_to(out);
            out.push('\n');
        }

        for block in &self.blocks {
            out.push('\n');
            block.write_to(out, depth + 1);
        }

        out.push_str(&indent);
        out.push_str("}\n");
    }
}

/// Escape a string literal, including template sequences
pub fn escape(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace("${", "$${")
        .replace("%{", "%%{")
}

/// Turn a display name into a Terraform identifier
pub fn sanitize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_underscore = false;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
            last_underscore = false;
        } else if !last_underscore && !out.is_empty() {
            out.push('_');
            last_underscore = true;
        }
    }

    while out.ends_with('_') {
        out.pop();
    }

    if out.is_empty() || out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }

    out
}
