use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use hashmatch_core::{
    DescriptorBuffer, Error, ImageId, PointFeature, RegionSet, RegionStore, Result,
};

use crate::format;

/// Regions of every image of a dataset, as stored on disk.
///
/// ```json
/// {
///   "descriptor_type": "u8",
///   "images": [
///     {
///       "id": 0,
///       "dimension": 2,
///       "descriptors": {"type": "byte", "data": [1, 2, 3, 4]},
///       "positions": [{"x": 10.0, "y": 4.5}, {"x": 3.0, "y": 8.0}]
///     }
///   ]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionsFile {
    pub descriptor_type: String,
    #[serde(default)]
    pub images: Vec<ImageRegions>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRegions {
    pub id: ImageId,
    pub dimension: usize,
    pub descriptors: DescriptorBuffer,
    pub positions: Vec<PointFeature>,
}

impl RegionsFile {
    /// Validate every image and build the in-memory store.
    pub fn into_store(self) -> Result<RegionStore> {
        let mut store = RegionStore::with_type_name(self.descriptor_type);
        for image in self.images {
            let regions = RegionSet::new(image.dimension, image.descriptors, image.positions)
                .map_err(|e| Error::InvalidRegions(format!("image {}: {}", image.id, e)))?;
            if store.insert(image.id, regions).is_some() {
                return Err(Error::InvalidRegions(format!(
                    "image {} listed more than once",
                    image.id
                )));
            }
        }
        Ok(store)
    }

    pub fn from_store(store: &RegionStore) -> Self {
        Self {
            descriptor_type: store.descriptor_type().to_string(),
            images: store
                .iter()
                .map(|(id, regions)| ImageRegions {
                    id,
                    dimension: regions.descriptor_dimension(),
                    descriptors: regions.descriptors().clone(),
                    positions: regions.positions().to_vec(),
                })
                .collect(),
        }
    }
}

/// Load a region dataset from a `.json` or `.bin` file.
pub fn load_regions(path: &Path) -> Result<RegionStore> {
    let file: RegionsFile = format::load(path)?;
    let store = file.into_store()?;
    info!(
        "Loaded regions of {} images ({} descriptors) from {:?}",
        store.len(),
        store.descriptor_type(),
        path
    );
    Ok(store)
}

pub fn save_regions(path: &Path, store: &RegionStore) -> Result<()> {
    format::save(path, &RegionsFile::from_store(store))
}
