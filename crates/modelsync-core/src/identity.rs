//! Identity assignment by composite key.

use std::collections::HashMap;

use uuid::Uuid;

use crate::config::{IdentityConfig, IdentityMode};
use crate::model::MergedRecord;

/// Pipe-joined values of the key columns; missing columns count as empty.
pub fn composite_key(record: &MergedRecord, columns: &[String]) -> String {
    columns
        .iter()
        .map(|c| record.get(c))
        .collect::<Vec<_>>()
        .join("|")
}

/// Hands out one identifier per composite within a single batch.
#[derive(Debug)]
pub struct IdentityAssigner {
    mode: IdentityMode,
    ids: HashMap<String, String>,
}

impl IdentityAssigner {
    pub fn new(mode: IdentityMode) -> Self {
        Self {
            mode,
            ids: HashMap::new(),
        }
    }

    /// Identifier for `composite`, generating one on first sight.
    pub fn id_for(&mut self, composite: &str) -> String {
        if let Some(id) = self.ids.get(composite) {
            return id.clone();
        }
        let id = match self.mode {
            IdentityMode::Random => Uuid::new_v4(),
            IdentityMode::Deterministic => Uuid::new_v5(&Uuid::NAMESPACE_OID, composite.as_bytes()),
        }
        .to_string();
        self.ids.insert(composite.to_string(), id.clone());
        id
    }

    /// Register an identifier a record already carries.
    ///
    /// The first identifier registered for a composite is the one later
    /// records reuse.
    pub fn register(&mut self, composite: &str, id: &str) {
        self.ids
            .entry(composite.to_string())
            .or_insert_with(|| id.to_string());
    }
}

/// Fill the identity field on every record. Returns how many distinct
/// composites were seen.
pub fn assign_identities(records: &mut [MergedRecord], config: &IdentityConfig) -> usize {
    let mut assigner = IdentityAssigner::new(config.mode);
    for record in records.iter_mut() {
        let composite = composite_key(record, &config.key_columns);
        let existing = record.get(&config.field).trim().to_string();
        if existing.is_empty() {
            let id = assigner.id_for(&composite);
            record.set(config.field.as_str(), id);
        } else {
            assigner.register(&composite, &existing);
        }
    }
    assigner.ids.len()
}
