//! In-memory resource registry
//!
//! The registry is the only state shared between concurrently running
//! producers and render tasks. It lives for one export run and is never
//! persisted.

use crate::descriptor::{RenderFn, ResourceDescriptor, ResourceParameter};
use crate::dummy::DummyVariable;
use parking_lot::Mutex;
use tracing::{debug, warn};

/// A render function scheduled by the generation phase
#[derive(Clone)]
pub struct RenderJob {
    /// Position of the descriptor in insertion order
    pub index: usize,
    /// Output artifact the text belongs to
    pub file_name: String,
    /// Diagnostic label of the descriptor
    pub label: String,
    /// The deferred render function
    pub render: RenderFn,
}

impl std::fmt::Debug for RenderJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderJob")
            .field("index", &self.index)
            .field("file_name", &self.file_name)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
struct Inner {
    resources: Vec<ResourceDescriptor>,
    dummy_variables: Vec<DummyVariable>,
}

/// Concurrency-safe store of descriptors and dummy-variable records
///
/// Every operation takes the single exclusive lock for its duration and
/// performs no I/O while holding it. Lookups are linear scans.
#[derive(Default)]
pub struct ResourceRegistry {
    inner: Mutex<Inner>,
}

impl ResourceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a descriptor with this primary id and type is present
    ///
    /// The answer reflects the registry at the instant of the call only.
    /// It does not reserve the key: a concurrent producer may insert the
    /// same key before this caller does, in which case its own insert is
    /// dropped.
    pub fn exists(&self, resource_type: &str, id: &str) -> bool {
        self.inner
            .lock()
            .resources
            .iter()
            .any(|r| r.is(resource_type, id))
    }

    /// Append descriptors whose `(id, resource_type)` key is not taken yet
    ///
    /// The batch is inserted under one lock acquisition. Colliding
    /// descriptors are dropped, not merged; descriptors with an empty id or
    /// type are always appended. Returns how many descriptors were kept.
    pub fn insert(&self, descriptors: impl IntoIterator<Item = ResourceDescriptor>) -> usize {
        let mut inner = self.inner.lock();
        let mut kept = 0;

        for descriptor in descriptors {
            let taken = descriptor.is_keyed()
                && inner
                    .resources
                    .iter()
                    .any(|existing| existing.same_key(&descriptor));

            if taken {
                debug!(
                    resource_type = descriptor.resource_type(),
                    id = descriptor.id(),
                    "Dropping duplicate resource"
                );
                continue;
            }

            inner.resources.push(descriptor);
            kept += 1;
        }

        kept
    }

    /// Append a dummy-variable record
    pub fn record_dummy(&self, record: DummyVariable) {
        self.inner.lock().dummy_variables.push(record);
    }

    /// Lookup expression of the object, matched by primary or alternate id
    pub fn resolve(&self, resource_type: &str, id: &str) -> String {
        self.project("resolve", resource_type, id, true, |r| r.lookup())
    }

    /// Dependency expression of the object, falling back to its lookup
    pub fn resolve_dependency(&self, resource_type: &str, id: &str) -> String {
        self.project("resolve_dependency", resource_type, id, true, |r| {
            r.dependency()
        })
    }

    /// Count expression of the object, matched by primary id only
    pub fn resolve_count(&self, resource_type: &str, id: &str) -> String {
        self.project("resolve_count", resource_type, id, false, |r| r.count())
    }

    /// Name of the object, matched by primary id only
    pub fn resolve_name(&self, resource_type: &str, id: &str) -> String {
        self.project("resolve_name", resource_type, id, false, |r| r.name())
    }

    /// Deferred version expression, matched by primary id only
    pub fn resolve_version_lookup(&self, resource_type: &str, id: &str) -> String {
        self.project("resolve_version_lookup", resource_type, id, false, |r| {
            r.version_lookup()
        })
    }

    /// Version at export time, matched by primary id only
    pub fn resolve_version_current(&self, resource_type: &str, id: &str) -> String {
        self.project("resolve_version_current", resource_type, id, false, |r| {
            r.version_current()
        })
    }

    /// Lookup expressions for several ids, in input order
    ///
    /// Ids without a match are reported one by one and left out.
    pub fn resolve_many<I, S>(&self, resource_type: &str, ids: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let (found, missing) = {
            let inner = self.inner.lock();
            let mut found = Vec::new();
            let mut missing = Vec::new();

            for id in ids {
                let id = id.as_ref();
                match inner.resources.iter().find(|r| r.answers_to(resource_type, id)) {
                    Some(resource) => found.push(resource.lookup().to_string()),
                    None => missing.push(id.to_string()),
                }
            }

            (found, missing)
        };

        for id in &missing {
            warn!(
                query = "resolve_many",
                resource_type,
                id = id.as_str(),
                "Resource lookup found no match"
            );
        }

        found
    }

    /// Dependency expressions of every child of `parent_id` with the given type
    ///
    /// Children are returned in insertion order.
    pub fn resolve_children(&self, parent_id: &str, resource_type: &str) -> Vec<String> {
        self.inner
            .lock()
            .resources
            .iter()
            .filter(|r| r.resource_type() == resource_type && r.parent_id() == Some(parent_id))
            .map(|r| r.dependency().to_string())
            .collect()
    }

    /// Descriptors of the given type ordered before `max_sort`
    pub fn select_by_type_below_sort(
        &self,
        resource_type: &str,
        max_sort: i64,
    ) -> Vec<ResourceDescriptor> {
        self.inner
            .lock()
            .resources
            .iter()
            .filter(|r| r.resource_type() == resource_type && r.sort_order() < max_sort)
            .cloned()
            .collect()
    }

    /// Number of descriptors held
    pub fn len(&self) -> usize {
        self.inner.lock().resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().resources.is_empty()
    }

    /// Number of descriptors of the given type
    pub fn count_of_type(&self, resource_type: &str) -> usize {
        self.inner
            .lock()
            .resources
            .iter()
            .filter(|r| r.resource_type() == resource_type)
            .count()
    }

    /// Snapshot of the dummy-variable ledger in insertion order
    pub fn dummy_variables(&self) -> Vec<DummyVariable> {
        self.inner.lock().dummy_variables.clone()
    }

    /// Every template parameter, in descriptor insertion order
    pub fn parameters(&self) -> Vec<ResourceParameter> {
        self.inner
            .lock()
            .resources
            .iter()
            .flat_map(|r| r.parameters().iter().cloned())
            .collect()
    }

    /// Render functions of every descriptor that has one
    ///
    /// Descriptors with an absent render function are skipped.
    pub fn render_jobs(&self) -> Vec<RenderJob> {
        self.inner
            .lock()
            .resources
            .iter()
            .enumerate()
            .filter_map(|(index, r)| {
                r.render().function().map(|render| RenderJob {
                    index,
                    file_name: r.file_name().to_string(),
                    label: r.label(),
                    render: render.clone(),
                })
            })
            .collect()
    }

    fn project<P>(
        &self,
        query: &'static str,
        resource_type: &str,
        id: &str,
        match_alternate: bool,
        projection: P,
    ) -> String
    where
        P: FnOnce(&ResourceDescriptor) -> &str,
    {
        let found = {
            let inner = self.inner.lock();
            inner
                .resources
                .iter()
                .find(|r| {
                    if match_alternate {
                        r.answers_to(resource_type, id)
                    } else {
                        r.is(resource_type, id)
                    }
                })
                .map(|r| projection(r).to_string())
        };

        found.unwrap_or_else(|| {
            warn!(query, resource_type, id, "Resource lookup found no match");
            String::new()
        })
    }
}
