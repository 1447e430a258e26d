//! Resource descriptors
//!
//! A [`ResourceDescriptor`] describes one exported object and the
//! expressions other descriptors use to refer to it. Descriptors are built
//! once by a producer, inserted into the registry, and never mutated again.

use crate::error::RenderResult;
use crate::registry::ResourceRegistry;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Deferred render function producing the configuration text of a descriptor
///
/// Invoked once the registry is complete. The registry is handed in rather
/// than captured so descriptors never hold a reference to their own store.
pub type RenderFn = Arc<dyn Fn(&ResourceRegistry) -> RenderResult + Send + Sync>;

/// Whether a descriptor emits text during generation
///
/// `Absent` marks a descriptor that exists only so others can look it up,
/// because a parent descriptor already renders the object.
#[derive(Clone, Default)]
pub enum Render {
    #[default]
    Absent,
    Present(RenderFn),
}

impl Render {
    /// Wrap a render closure
    pub fn new<F>(render: F) -> Self
    where
        F: Fn(&ResourceRegistry) -> RenderResult + Send + Sync + 'static,
    {
        Self::Present(Arc::new(render))
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    /// The render function, if any
    pub fn function(&self) -> Option<&RenderFn> {
        match self {
            Self::Absent => None,
            Self::Present(render) => Some(render),
        }
    }
}

impl fmt::Debug for Render {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => f.write_str("Absent"),
            Self::Present(_) => f.write_str("Present(<fn>)"),
        }
    }
}

/// Kind of value a template parameter carries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterType {
    String,
    Sensitive,
    Certificate,
    Account,
    Other(String),
}

/// A named input attached to an exported object
///
/// Only consumed when the exported text is packaged as a reusable,
/// parameterised template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceParameter {
    /// Variable name the template exposes
    pub name: String,
    /// Human readable description
    pub description: String,
    /// Name of the object the parameter belongs to
    pub resource_name: String,
    /// Value kind
    pub parameter_type: ParameterType,
    /// Whether the value must be treated as a secret
    pub sensitive: bool,
    /// Value used when the caller supplies none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

impl ResourceParameter {
    pub fn new(
        name: impl Into<String>,
        resource_name: impl Into<String>,
        parameter_type: ParameterType,
    ) -> Self {
        let sensitive = matches!(parameter_type, ParameterType::Sensitive);
        Self {
            name: name.into(),
            description: String::new(),
            resource_name: resource_name.into(),
            parameter_type,
            sensitive,
            default_value: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn sensitive(mut self, sensitive: bool) -> Self {
        self.sensitive = sensitive;
        self
    }
}

/// Description of one exported object
///
/// `(id, resource_type)` is the registry key. The remaining fields are the
/// projections other descriptors resolve while building or rendering.
#[derive(Debug, Clone, Default)]
pub struct ResourceDescriptor {
    id: String,
    alternate_id: Option<String>,
    parent_id: Option<String>,
    name: String,
    sort_order: i64,
    resource_type: String,
    lookup: String,
    dependency: Option<String>,
    count: String,
    version_lookup: String,
    version_current: String,
    file_name: String,
    render: Render,
    parameters: Vec<ResourceParameter>,
}

impl ResourceDescriptor {
    /// Start a descriptor for the object `id` of kind `resource_type`
    pub fn new(id: impl Into<String>, resource_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            resource_type: resource_type.into(),
            ..Default::default()
        }
    }

    /// Secondary identifier the descriptor also answers to
    pub fn with_alternate_id(mut self, alternate_id: impl Into<String>) -> Self {
        self.alternate_id = Some(alternate_id.into());
        self
    }

    /// Owning descriptor, used by child queries
    pub fn with_parent_id(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_sort_order(mut self, sort_order: i64) -> Self {
        self.sort_order = sort_order;
        self
    }

    /// Expression other descriptors embed to reference this object
    pub fn with_lookup(mut self, lookup: impl Into<String>) -> Self {
        self.lookup = lookup.into();
        self
    }

    /// Expression used in ordering declarations instead of the lookup
    pub fn with_dependency(mut self, dependency: impl Into<String>) -> Self {
        self.dependency = Some(dependency.into());
        self
    }

    /// Expression for the cardinality of a collection-valued object
    pub fn with_count(mut self, count: impl Into<String>) -> Self {
        self.count = count.into();
        self
    }

    /// Server-assigned version: the deferred expression and the value at export time
    pub fn with_version(
        mut self,
        version_lookup: impl Into<String>,
        version_current: impl Into<String>,
    ) -> Self {
        self.version_lookup = version_lookup.into();
        self.version_current = version_current.into();
        self
    }

    /// Output artifact the rendered text is written to
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }

    pub fn with_render<F>(mut self, render: F) -> Self
    where
        F: Fn(&ResourceRegistry) -> RenderResult + Send + Sync + 'static,
    {
        self.render = Render::new(render);
        self
    }

    pub fn with_parameter(mut self, parameter: ResourceParameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn with_parameters(mut self, parameters: impl IntoIterator<Item = ResourceParameter>) -> Self {
        self.parameters.extend(parameters);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn alternate_id(&self) -> Option<&str> {
        self.alternate_id.as_deref()
    }

    pub fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sort_order(&self) -> i64 {
        self.sort_order
    }

    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    pub fn lookup(&self) -> &str {
        &self.lookup
    }

    /// The dependency expression, falling back to the lookup when unset or empty
    pub fn dependency(&self) -> &str {
        match self.dependency.as_deref() {
            Some(dependency) if !dependency.is_empty() => dependency,
            _ => &self.lookup,
        }
    }

    pub fn count(&self) -> &str {
        &self.count
    }

    pub fn version_lookup(&self) -> &str {
        &self.version_lookup
    }

    pub fn version_current(&self) -> &str {
        &self.version_current
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn render(&self) -> &Render {
        &self.render
    }

    pub fn parameters(&self) -> &[ResourceParameter] {
        &self.parameters
    }

    /// True when the descriptor takes part in `(id, resource_type)` deduplication
    pub(crate) fn is_keyed(&self) -> bool {
        !self.id.is_empty() && !self.resource_type.is_empty()
    }

    pub(crate) fn same_key(&self, other: &ResourceDescriptor) -> bool {
        self.id == other.id && self.resource_type == other.resource_type
    }

    /// Matches the primary id or the alternate id
    pub(crate) fn answers_to(&self, resource_type: &str, id: &str) -> bool {
        self.resource_type == resource_type
            && (self.id == id || self.alternate_id.as_deref() == Some(id))
    }

    /// Matches the primary id only
    pub(crate) fn is(&self, resource_type: &str, id: &str) -> bool {
        self.resource_type == resource_type && self.id == id
    }

    /// Label used in diagnostics
    pub fn label(&self) -> String {
        if self.name.is_empty() {
            format!("{}/{}", self.resource_type, self.id)
        } else {
            format!("{}/{} ({})", self.resource_type, self.id, self.name)
        }
    }
}
