//! Generation phase: render every descriptor of a complete registry
//!
//! Must only start after the population phase joined. Render functions
//! resolve cross references through the registry, and a graph that is
//! still being built would silently yield empty expressions.

use crate::error::{GenerationError, RenderFailure};
use crate::population::panic_message;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tfexport_registry::{RenderError, ResourceRegistry};
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

/// Rendered text per output artifact
pub type RenderedFiles = BTreeMap<String, String>;

/// Render every descriptor that has a render function
///
/// One blocking task is dispatched per render function and all of them run
/// to completion. Empty renders are dropped. If any render fails the whole
/// phase fails with every failure joined, and no text is returned. Texts
/// sharing a file name are concatenated in registry order.
#[instrument(skip_all, fields(resources = registry.len()))]
pub async fn generate_files(
    registry: Arc<ResourceRegistry>,
) -> std::result::Result<RenderedFiles, GenerationError> {
    let jobs = registry.render_jobs();
    let outputs: Arc<DashMap<String, Vec<(usize, String)>>> = Arc::new(DashMap::new());
    let failures: Arc<Mutex<Vec<RenderFailure>>> = Arc::new(Mutex::new(Vec::new()));
    let mut tasks = JoinSet::new();

    info!(jobs = jobs.len(), "Rendering resources");

    for job in jobs {
        let registry = registry.clone();
        let outputs = outputs.clone();
        let failures = failures.clone();

        tasks.spawn_blocking(move || {
            let rendered = panic::catch_unwind(AssertUnwindSafe(|| (job.render)(registry.as_ref())))
                .unwrap_or_else(|panic| {
                    Err(RenderError::Custom(format!(
                        "render function panicked: {}",
                        panic_message(&*panic)
                    )))
                });

            match rendered {
                Ok(text) => {
                    let text = text.trim();
                    if text.is_empty() {
                        debug!(resource = %job.label, "Dropping empty render");
                        return;
                    }
                    outputs
                        .entry(job.file_name)
                        .or_default()
                        .push((job.index, text.to_string()));
                }
                Err(source) => {
                    warn!(resource = %job.label, error = %source, "Render failed");
                    failures.lock().push(RenderFailure {
                        index: job.index,
                        resource: job.label,
                        source,
                    });
                }
            }
        });
    }

    while let Some(joined) = tasks.join_next().await {
        if let Err(err) = joined {
            failures.lock().push(RenderFailure {
                index: usize::MAX,
                resource: "<unknown>".into(),
                source: RenderError::Custom(err.to_string()),
            });
        }
    }

    let mut failures = std::mem::take(&mut *failures.lock());
    if !failures.is_empty() {
        failures.sort_by_key(|f| f.index);
        return Err(GenerationError { failures });
    }

    let files: RenderedFiles = outputs
        .iter()
        .map(|entry| {
            let mut parts = entry.value().clone();
            parts.sort_by_key(|(index, _)| *index);
            let text = parts
                .into_iter()
                .map(|(_, text)| text)
                .collect::<Vec<_>>()
                .join("\n\n");
            (entry.key().clone(), text)
        })
        .collect();

    info!(files = files.len(), "Generation complete");

    Ok(files)
}
