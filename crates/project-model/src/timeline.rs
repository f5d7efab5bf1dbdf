//! The timeline: every zoom and cut region of a project.
//!
//! Stored in `meta/timeline.json`. Zoom and cut regions live in separate
//! collections keyed by [`RegionId`] but share one id counter and one
//! z-index space.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::region::{CutRegion, RegionError, RegionId, TimelineSpan, ZoomRegion};

/// Z-index assigned to the longest region. Shorter regions count down from
/// here so that nested regions stay on top.
pub const Z_INDEX_BASE: u32 = 1000;

/// The region store persisted with a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    /// Schema version.
    pub version: String,

    #[serde(default, with = "region_map")]
    zoom_regions: BTreeMap<RegionId, ZoomRegion>,

    #[serde(default, with = "region_map")]
    cut_regions: BTreeMap<RegionId, CutRegion>,

    /// Next id to hand out. Ids are never reused.
    #[serde(default)]
    next_id: u64,
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Timeline {
    pub fn new() -> Self {
        Self {
            version: "1.0".to_string(),
            zoom_regions: BTreeMap::new(),
            cut_regions: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Parse a timeline file, validate every region and repair the id
    /// counter and z-indices.
    pub fn from_json(json: &str) -> Result<Self, TimelineError> {
        let mut timeline: Timeline = serde_json::from_str(json)?;
        timeline.normalize()?;
        Ok(timeline)
    }

    /// Validate all regions, make sure the id counter is ahead of every
    /// stored id and recompute z-indices.
    pub fn normalize(&mut self) -> Result<(), RegionError> {
        for region in self.zoom_regions.values_mut() {
            region.validate()?;
        }
        for region in self.cut_regions.values_mut() {
            region.validate()?;
        }

        let max_id = self
            .zoom_regions
            .keys()
            .chain(self.cut_regions.keys())
            .map(|id| id.0)
            .max()
            .unwrap_or(0);
        self.next_id = self.next_id.max(max_id + 1);

        self.recompute_z_indices();
        Ok(())
    }

    /// Zoom regions in id (creation) order.
    pub fn zoom_regions(&self) -> impl Iterator<Item = &ZoomRegion> {
        self.zoom_regions.values()
    }

    /// Cut regions in id (creation) order.
    pub fn cut_regions(&self) -> impl Iterator<Item = &CutRegion> {
        self.cut_regions.values()
    }

    /// Owned snapshot of the zoom regions, in creation order.
    pub fn zoom_region_list(&self) -> Vec<ZoomRegion> {
        self.zoom_regions.values().cloned().collect()
    }

    /// Owned snapshot of the cut regions, in creation order.
    pub fn cut_region_list(&self) -> Vec<CutRegion> {
        self.cut_regions.values().cloned().collect()
    }

    pub fn zoom_region(&self, id: RegionId) -> Option<&ZoomRegion> {
        self.zoom_regions.get(&id)
    }

    pub fn cut_region(&self, id: RegionId) -> Option<&CutRegion> {
        self.cut_regions.get(&id)
    }

    pub(crate) fn zoom_region_mut(&mut self, id: RegionId) -> Option<&mut ZoomRegion> {
        self.zoom_regions.get_mut(&id)
    }

    pub(crate) fn cut_region_mut(&mut self, id: RegionId) -> Option<&mut CutRegion> {
        self.cut_regions.get_mut(&id)
    }

    pub fn contains(&self, id: RegionId) -> bool {
        self.zoom_regions.contains_key(&id) || self.cut_regions.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.zoom_regions.len() + self.cut_regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zoom_regions.is_empty() && self.cut_regions.is_empty()
    }

    pub(crate) fn allocate_id(&mut self) -> RegionId {
        let id = RegionId(self.next_id.max(1));
        self.next_id = id.0 + 1;
        id
    }

    /// Store a zoom region under a fresh id. The region's own id is ignored.
    pub(crate) fn insert_zoom(&mut self, mut region: ZoomRegion) -> RegionId {
        let id = self.allocate_id();
        region.id = id;
        self.zoom_regions.insert(id, region);
        self.recompute_z_indices();
        id
    }

    /// Store a cut region under a fresh id. The region's own id is ignored.
    pub(crate) fn insert_cut(&mut self, mut region: CutRegion) -> RegionId {
        let id = self.allocate_id();
        region.id = id;
        self.cut_regions.insert(id, region);
        self.recompute_z_indices();
        id
    }

    /// Remove a region from whichever collection holds it.
    /// Returns whether anything was removed.
    pub(crate) fn remove(&mut self, id: RegionId) -> bool {
        let removed =
            self.zoom_regions.remove(&id).is_some() || self.cut_regions.remove(&id).is_some();
        if removed {
            self.recompute_z_indices();
        }
        removed
    }

    /// Drop regions matching the predicate without recomputing z-indices.
    pub(crate) fn retain(
        &mut self,
        mut keep_zoom: impl FnMut(&ZoomRegion) -> bool,
        mut keep_cut: impl FnMut(&CutRegion) -> bool,
    ) {
        self.zoom_regions.retain(|_, r| keep_zoom(r));
        self.cut_regions.retain(|_, r| keep_cut(r));
    }

    pub(crate) fn for_each_region_mut(
        &mut self,
        mut zoom: impl FnMut(&mut ZoomRegion),
        mut cut: impl FnMut(&mut CutRegion),
    ) {
        self.zoom_regions.values_mut().for_each(&mut zoom);
        self.cut_regions.values_mut().for_each(&mut cut);
    }

    /// Reassign z-indices across both collections: ascending duration,
    /// ties broken by id, counting down from [`Z_INDEX_BASE`].
    pub fn recompute_z_indices(&mut self) {
        let mut order: Vec<(f64, RegionId)> = self
            .zoom_regions
            .values()
            .map(|r| (r.duration(), r.id()))
            .chain(self.cut_regions.values().map(|r| (r.duration(), r.id())))
            .collect();
        order.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        for (rank, (_, id)) in order.into_iter().enumerate() {
            let z_index = Z_INDEX_BASE.saturating_sub(rank as u32);
            if let Some(region) = self.zoom_regions.get_mut(&id) {
                region.z_index = z_index;
            } else if let Some(region) = self.cut_regions.get_mut(&id) {
                region.z_index = z_index;
            }
        }
    }
}

/// Errors raised while loading a timeline file.
#[derive(Debug, thiserror::Error)]
pub enum TimelineError {
    #[error("Malformed timeline: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid region: {0}")]
    Region(#[from] RegionError),
}

/// Regions are stored on disk as plain arrays; the map key is the region id.
mod region_map {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use crate::region::{RegionId, TimelineSpan};

    pub fn serialize<S, T>(map: &BTreeMap<RegionId, T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        serializer.collect_seq(map.values())
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<BTreeMap<RegionId, T>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de> + TimelineSpan,
    {
        let regions = Vec::<T>::deserialize(deserializer)?;
        let mut map = BTreeMap::new();
        for region in regions {
            let id = region.id();
            if map.insert(id, region).is_some() {
                return Err(serde::de::Error::custom(format!("duplicate {id}")));
            }
        }
        Ok(map)
    }
}
