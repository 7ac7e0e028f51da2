use std::collections::BTreeMap;
use std::sync::Arc;

use crate::types::{KeyFrame, KeyFrameId, MapDelta, MapUpdate};

/// Reconciles incremental mapper output against the live keyframe set.
///
/// Each update names only the keyframes that changed; everything else keeps
/// its previous state, so churn stays proportional to the update, not to the
/// map size. An id listed in the update but absent from its map means the
/// keyframe was removed.
#[derive(Debug, Default)]
pub struct MapReconciler {
    live: BTreeMap<KeyFrameId, Arc<KeyFrame>>,
}

impl MapReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one map update, processing `updated_key_frames` oldest to
    /// newest, and return the delta the consumer has to mirror: keyframe
    /// views to create, move, or destroy. Removing an id that was never added
    /// is a no-op; the map stays consistent after any update sequence.
    pub fn apply(&mut self, update: MapUpdate) -> MapDelta {
        let mut delta = MapDelta {
            final_map: update.final_map,
            ..MapDelta::default()
        };

        for id in &update.updated_key_frames {
            match update.map.get(id) {
                Some(kf) => {
                    if self.live.insert(*id, Arc::clone(kf)).is_some() {
                        delta.updated.push(Arc::clone(kf));
                    } else {
                        delta.added.push(Arc::clone(kf));
                    }
                }
                None => {
                    if self.live.remove(id).is_some() {
                        delta.removed.push(*id);
                    }
                }
            }
        }

        if update.final_map {
            log::info!("final map update applied, {} keyframes live", self.live.len());
        }
        delta
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    pub fn contains(&self, id: KeyFrameId) -> bool {
        self.live.contains_key(&id)
    }

    pub fn key_frame(&self, id: KeyFrameId) -> Option<&Arc<KeyFrame>> {
        self.live.get(&id)
    }

    /// Live keyframes in id (creation) order.
    pub fn key_frames(&self) -> impl Iterator<Item = &Arc<KeyFrame>> {
        self.live.values()
    }

    /// Drop all reconciled state.
    pub fn clear(&mut self) {
        self.live.clear();
    }
}
