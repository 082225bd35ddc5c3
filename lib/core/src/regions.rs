use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{Error, ImageId, Result, ScalarKind, BINARY_TYPE_NAME};

/// 2D position of a region in image coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PointFeature {
    pub x: f32,
    pub y: f32,
}

impl PointFeature {
    #[inline]
    #[must_use]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Raw descriptor storage, row-major, one descriptor after another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum DescriptorBuffer {
    Byte(Vec<u8>),
    Float(Vec<f32>),
}

impl DescriptorBuffer {
    #[inline]
    #[must_use]
    pub fn kind(&self) -> ScalarKind {
        match self {
            DescriptorBuffer::Byte(_) => ScalarKind::Byte,
            DescriptorBuffer::Float(_) => ScalarKind::Float,
        }
    }

    /// Number of scalar components stored.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            DescriptorBuffer::Byte(data) => data.len(),
            DescriptorBuffer::Float(data) => data.len(),
        }
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn empty(kind: ScalarKind) -> Self {
        match kind {
            ScalarKind::Byte => DescriptorBuffer::Byte(Vec::new()),
            ScalarKind::Float => DescriptorBuffer::Float(Vec::new()),
        }
    }
}

/// Descriptors and positions detected on one image.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionSet {
    dimension: usize,
    descriptors: DescriptorBuffer,
    positions: Vec<PointFeature>,
}

impl RegionSet {
    /// Build a region set; the buffer must hold exactly one descriptor of
    /// `dimension` components per position.
    pub fn new(
        dimension: usize,
        descriptors: DescriptorBuffer,
        positions: Vec<PointFeature>,
    ) -> Result<Self> {
        if dimension == 0 && !positions.is_empty() {
            return Err(Error::InvalidRegions(
                "descriptor dimension must be positive".to_string(),
            ));
        }
        let expected = positions.len() * dimension;
        if descriptors.len() != expected {
            return Err(Error::InvalidRegions(format!(
                "{} positions with dimension {} need {} descriptor values, got {}",
                positions.len(),
                dimension,
                expected,
                descriptors.len()
            )));
        }
        Ok(Self {
            dimension,
            descriptors,
            positions,
        })
    }

    #[must_use]
    pub fn empty(kind: ScalarKind, dimension: usize) -> Self {
        Self {
            dimension,
            descriptors: DescriptorBuffer::empty(kind),
            positions: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn descriptor_count(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    #[must_use]
    pub fn descriptor_dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    #[must_use]
    pub fn descriptors(&self) -> &DescriptorBuffer {
        &self.descriptors
    }

    #[inline]
    #[must_use]
    pub fn positions(&self) -> &[PointFeature] {
        &self.positions
    }

    #[inline]
    #[must_use]
    pub fn scalar_kind(&self) -> ScalarKind {
        self.descriptors.kind()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Read-only access to the regions of every image of a run.
///
/// Implementations must tolerate concurrent reads from the matcher's worker
/// threads.
pub trait RegionProvider: Sync {
    /// Whether descriptors are bit-packed; cascade hashing declines those.
    fn is_binary(&self) -> bool {
        false
    }

    /// Scalar type shared by all descriptors of this provider.
    fn scalar_kind(&self) -> Result<ScalarKind>;

    /// Regions of `image`, `None` when the provider has nothing for it.
    fn regions(&self, image: ImageId) -> Option<&RegionSet>;
}

/// In-memory region provider keyed by image id.
#[derive(Debug, Clone)]
pub struct RegionStore {
    descriptor_type: String,
    regions: BTreeMap<ImageId, RegionSet>,
}

impl RegionStore {
    pub fn new(kind: ScalarKind) -> Self {
        Self::with_type_name(kind.type_name())
    }

    /// Store whose descriptor type is only known by name (as read from a
    /// dataset file). Unsupported names surface through `scalar_kind`.
    pub fn with_type_name(descriptor_type: impl Into<String>) -> Self {
        Self {
            descriptor_type: descriptor_type.into(),
            regions: BTreeMap::new(),
        }
    }

    pub fn descriptor_type(&self) -> &str {
        &self.descriptor_type
    }

    /// Insert or replace the regions of an image.
    pub fn insert(&mut self, image: ImageId, regions: RegionSet) -> Option<RegionSet> {
        self.regions.insert(image, regions)
    }

    pub fn get(&self, image: ImageId) -> Option<&RegionSet> {
        self.regions.get(&image)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Image ids in ascending order.
    pub fn image_ids(&self) -> Vec<ImageId> {
        self.regions.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ImageId, &RegionSet)> + '_ {
        self.regions.iter().map(|(id, regions)| (*id, regions))
    }
}

impl RegionProvider for RegionStore {
    fn is_binary(&self) -> bool {
        self.descriptor_type == BINARY_TYPE_NAME
    }

    fn scalar_kind(&self) -> Result<ScalarKind> {
        ScalarKind::from_type_name(&self.descriptor_type)
    }

    fn regions(&self, image: ImageId) -> Option<&RegionSet> {
        self.regions.get(&image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn positions(n: usize) -> Vec<PointFeature> {
        (0..n).map(|i| PointFeature::new(i as f32, 0.0)).collect()
    }

    #[test]
    fn test_region_set_validation() {
        let ok = RegionSet::new(2, DescriptorBuffer::Float(vec![0.0; 6]), positions(3)).unwrap();
        assert_eq!(ok.descriptor_count(), 3);
        assert_eq!(ok.scalar_kind(), ScalarKind::Float);

        let err = RegionSet::new(2, DescriptorBuffer::Float(vec![0.0; 5]), positions(3));
        assert!(matches!(err, Err(Error::InvalidRegions(_))));

        let err = RegionSet::new(0, DescriptorBuffer::Byte(vec![]), positions(1));
        assert!(matches!(err, Err(Error::InvalidRegions(_))));
    }

    #[test]
    fn test_store_provider() {
        let mut store = RegionStore::new(ScalarKind::Byte);
        store.insert(7, RegionSet::empty(ScalarKind::Byte, 128));
        store.insert(3, RegionSet::empty(ScalarKind::Byte, 128));

        assert_eq!(store.image_ids(), vec![3, 7]);
        assert!(!store.is_binary());
        assert_eq!(store.scalar_kind().unwrap(), ScalarKind::Byte);
        assert!(store.regions(3).is_some());
        assert!(store.regions(4).is_none());
    }

    #[test]
    fn test_store_type_names() {
        assert!(RegionStore::with_type_name(BINARY_TYPE_NAME).is_binary());
        let odd = RegionStore::with_type_name("f64");
        assert!(matches!(odd.scalar_kind(), Err(Error::UnknownScalarType(_))));
    }

    #[test]
    fn test_descriptor_buffer_serde_shape() {
        let json = serde_json::to_value(DescriptorBuffer::Byte(vec![1, 2])).unwrap();
        assert_eq!(json, serde_json::json!({"type": "byte", "data": [1, 2]}));
    }
}
