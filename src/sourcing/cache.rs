//! Simulations already fetched during this session

use log::warn;
use std::collections::HashMap;

use crate::records::SimulationRecord;

/// Append/update-only cache keyed by (user, project)
///
/// Seeding from a list keeps the first simulation per pair; later
/// duplicates are reported and ignored. `upsert` always replaces, since it
/// carries a fresher fetch.
#[derive(Debug, Clone, Default)]
pub struct SimulationCache {
    by_pair: HashMap<(String, String), SimulationRecord>,
}

impl SimulationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from an already-fetched list
    pub fn extend_from_list<I: IntoIterator<Item = SimulationRecord>>(&mut self, simulations: I) {
        for simulation in simulations {
            let key = (simulation.user_id.clone(), simulation.project_id.clone());
            if let Some(existing) = self.by_pair.get(&key) {
                warn!(
                    "duplicate simulation {:?} for user {} and project {}, keeping {:?}",
                    simulation.id, key.0, key.1, existing.id
                );
                continue;
            }
            self.by_pair.insert(key, simulation);
        }
    }

    pub fn upsert(&mut self, simulation: SimulationRecord) {
        let key = (simulation.user_id.clone(), simulation.project_id.clone());
        self.by_pair.insert(key, simulation);
    }

    pub fn get(&self, user_id: &str, project_id: &str) -> Option<&SimulationRecord> {
        self.by_pair.get(&(user_id.to_string(), project_id.to_string()))
    }

    pub fn get_by_id(&self, id: &str) -> Option<&SimulationRecord> {
        self.by_pair.values().find(|s| s.id.as_deref() == Some(id))
    }

    pub fn len(&self) -> usize {
        self.by_pair.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_pair.is_empty()
    }
}
