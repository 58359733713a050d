//! Taxonomy folder management.
//!
//! Each configured root folder gets one heat-map child, and under it one
//! folder per taxonomy segment. Existence is checked against the store on
//! every call, so repeated calls never create a second folder of the same
//! name under the same parent.

use tracing::{debug, info, warn};

use modelsync_core::model::Folder;
use modelsync_core::{SyncConfig, SyncError, SyncResult};

use crate::store::ModelStore;

/// Counts from a folder pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderOutcome {
    pub created: usize,
    pub reused: usize,
    /// Configured roots the store does not have.
    pub missing_roots: Vec<String>,
}

impl FolderOutcome {
    fn merge(&mut self, other: FolderOutcome) {
        self.created += other.created;
        self.reused += other.reused;
        self.missing_roots.extend(other.missing_roots);
    }
}

/// Find the child of `parent` named exactly `name`, creating it if absent.
/// Returns the folder and whether it was created.
pub fn ensure_child<S: ModelStore + ?Sized>(store: &mut S, parent: &Folder, name: &str) -> SyncResult<(Folder, bool)> {
    if let Some(existing) = store
        .folder_children(&parent.id)
        .into_iter()
        .find(|f| f.name == name)
    {
        return Ok((existing, false));
    }
    let folder = store
        .create_folder(&parent.id, name)
        .map_err(|e| e.for_entity(format!("folder {}/{}", parent.name, name)))?;
    debug!(parent = %parent.name, name, folder_id = %folder.id, "Created folder");
    Ok((folder, true))
}

/// Ensure the heat-map folder and every segment folder under one root.
/// Returns the heat-map folder.
pub fn ensure_root_taxonomy<S: ModelStore + ?Sized>(
    store: &mut S,
    root: &Folder,
    config: &SyncConfig,
) -> SyncResult<(Folder, FolderOutcome)> {
    let mut outcome = FolderOutcome::default();

    let (heatmap, created) = ensure_child(store, root, &config.folders.heatmap)?;
    tally(&mut outcome, created);

    for segment in config.taxonomy.folder_names() {
        if segment.is_empty() {
            continue;
        }
        let (_, created) = ensure_child(store, &heatmap, &segment)?;
        tally(&mut outcome, created);
    }
    Ok((heatmap, outcome))
}

/// Ensure the taxonomy subtree under every configured root.
pub fn ensure_taxonomy_folders<S: ModelStore + ?Sized>(store: &mut S, config: &SyncConfig) -> SyncResult<FolderOutcome> {
    let mut total = FolderOutcome::default();

    for root_name in &config.folders.roots {
        let Some(root) = store.root_folder(root_name) else {
            warn!(root = %root_name, "Root folder not found, skipping taxonomy folders");
            total.missing_roots.push(root_name.clone());
            continue;
        };
        let (_, outcome) = ensure_root_taxonomy(store, &root, config)?;
        total.merge(outcome);
    }

    info!(created = total.created, reused = total.reused, "Taxonomy folders ensured");
    Ok(total)
}

/// The segment folder a classification value belongs in, under `root`.
///
/// Fails with a lookup error when the value names no configured segment.
pub fn resolve_segment_folder<S: ModelStore + ?Sized>(
    store: &mut S,
    root: &Folder,
    config: &SyncConfig,
    classification: &str,
) -> SyncResult<Folder> {
    let segment = config.taxonomy.segment_for(classification).ok_or_else(|| {
        SyncError::lookup(format!("no taxonomy segment for '{}'", classification))
    })?;
    let (heatmap, _) = ensure_child(store, root, &config.folders.heatmap)?;
    let (folder, _) = ensure_child(store, &heatmap, &segment)?;
    Ok(folder)
}

fn tally(outcome: &mut FolderOutcome, created: bool) {
    if created {
        outcome.created += 1;
    } else {
        outcome.reused += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryModel;

    #[test]
    fn test_second_call_creates_nothing() {
        let mut model = MemoryModel::new();
        model.add_root_folder("Strategy");
        model.add_root_folder("Business");
        let config = SyncConfig::default();
        let segments = config.taxonomy.segments.len();

        let first = ensure_taxonomy_folders(&mut model, &config).unwrap();
        assert_eq!(first.created, 2 * (1 + segments));
        assert_eq!(first.reused, 0);

        let second = ensure_taxonomy_folders(&mut model, &config).unwrap();
        assert_eq!(second.created, 0);
        assert_eq!(second.reused, 2 * (1 + segments));
        assert_eq!(model.folders().len(), 2 + 2 * (1 + segments));
    }

    #[test]
    fn test_segment_names_are_alphanumeric() {
        let mut model = MemoryModel::new();
        let root = model.add_root_folder("Strategy");
        let config = SyncConfig::default();
        let (heatmap, _) = ensure_root_taxonomy(&mut model, &root, &config).unwrap();
        let names: Vec<String> = model.folder_children(&heatmap.id).into_iter().map(|f| f.name).collect();
        assert!(names.contains(&"RiskCompliance".to_string()));
        assert!(names.contains(&"ProductService".to_string()));
    }

    #[test]
    fn test_heatmap_match_is_case_sensitive() {
        let mut model = MemoryModel::new();
        let root = model.add_root_folder("Strategy");
        model.create_folder(&root.id, "heatmap").unwrap();
        let config = SyncConfig::default();
        let (_, created) = ensure_child(&mut model, &root, &config.folders.heatmap).unwrap();
        assert!(created);
        assert_eq!(model.folder_children(&root.id).len(), 2);
    }

    #[test]
    fn test_missing_root_is_reported() {
        let mut model = MemoryModel::new();
        model.add_root_folder("Strategy");
        let outcome = ensure_taxonomy_folders(&mut model, &SyncConfig::default()).unwrap();
        assert_eq!(outcome.missing_roots, vec!["Business".to_string()]);
    }

    #[test]
    fn test_resolve_segment_folder() {
        let mut model = MemoryModel::new();
        let root = model.add_root_folder("Strategy");
        let config = SyncConfig::default();
        let folder = resolve_segment_folder(&mut model, &root, &config, "Security > IAM").unwrap();
        assert_eq!(folder.name, "Security");
        let again = resolve_segment_folder(&mut model, &root, &config, "security").unwrap();
        assert_eq!(again.id, folder.id);

        let err = resolve_segment_folder(&mut model, &root, &config, "Legacy").unwrap_err();
        assert!(matches!(err, SyncError::Lookup(_)));
    }
}
