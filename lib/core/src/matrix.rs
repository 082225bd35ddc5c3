use crate::{DescriptorScalar, Error, RegionSet, Result};

/// Row-major view over a borrowed descriptor buffer.
///
/// The shape is validated once at construction so row access never has to
/// re-check the buffer length.
#[derive(Debug, Clone, Copy)]
pub struct DescriptorMatrix<'a, T> {
    data: &'a [T],
    rows: usize,
    cols: usize,
    stride: usize,
}

impl<'a, T: DescriptorScalar> DescriptorMatrix<'a, T> {
    /// Densely packed view: `data.len()` must be exactly `rows * cols`.
    pub fn new(data: &'a [T], rows: usize, cols: usize) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::InvalidBuffer {
                len: data.len(),
                rows,
                cols,
                stride: cols,
            });
        }
        Ok(Self {
            data,
            rows,
            cols,
            stride: cols,
        })
    }

    /// View with a row pitch of `stride` elements (`stride >= cols`).
    pub fn with_stride(data: &'a [T], rows: usize, cols: usize, stride: usize) -> Result<Self> {
        let required = match rows {
            0 => 0,
            _ => (rows - 1) * stride + cols,
        };
        if stride < cols || data.len() < required {
            return Err(Error::InvalidBuffer {
                len: data.len(),
                rows,
                cols,
                stride,
            });
        }
        Ok(Self {
            data,
            rows,
            cols,
            stride,
        })
    }

    /// A view with no rows.
    #[must_use]
    pub fn empty(cols: usize) -> Self {
        Self {
            data: &[],
            rows: 0,
            cols,
            stride: cols,
        }
    }

    /// Wrap the descriptors of a region set, checking scalar kind and dimension.
    ///
    /// An empty region set always yields an empty view of width `dimension`.
    pub fn from_regions(regions: &'a RegionSet, dimension: usize) -> Result<Self> {
        if regions.is_empty() {
            return Ok(Self::empty(dimension));
        }
        let data = T::slice_of(regions.descriptors()).ok_or(Error::ScalarMismatch {
            expected: T::KIND,
            actual: regions.scalar_kind(),
        })?;
        if regions.descriptor_dimension() != dimension {
            return Err(Error::InvalidDimension {
                expected: dimension,
                actual: regions.descriptor_dimension(),
            });
        }
        Self::new(data, regions.descriptor_count(), dimension)
    }

    #[inline]
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    #[must_use]
    pub fn stride(&self) -> usize {
        self.stride
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Row `index`; panics when out of range like slice indexing.
    #[inline]
    pub fn row(&self, index: usize) -> &'a [T] {
        assert!(index < self.rows, "row {} out of range for {} rows", index, self.rows);
        let start = index * self.stride;
        &self.data[start..start + self.cols]
    }

    pub fn iter_rows(&self) -> impl ExactSizeIterator<Item = &'a [T]> + '_ {
        (0..self.rows).map(move |r| self.row(r))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DescriptorBuffer, PointFeature, ScalarKind};

    #[test]
    fn test_dense_view_validates_length() {
        let data = [1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0];
        let m = DescriptorMatrix::new(&data, 2, 3).unwrap();
        assert_eq!(m.row(1), &[4.0, 5.0, 6.0]);
        assert!(DescriptorMatrix::new(&data, 4, 2).is_err());
    }

    #[test]
    fn test_strided_view() {
        let data = [1u8, 2, 0, 3, 4, 0, 5, 6];
        let m = DescriptorMatrix::with_stride(&data, 3, 2, 3).unwrap();
        let rows: Vec<&[u8]> = m.iter_rows().collect();
        assert_eq!(rows, vec![&[1u8, 2][..], &[3, 4][..], &[5, 6][..]]);
        assert!(DescriptorMatrix::with_stride(&data, 3, 4, 3).is_err());
    }

    #[test]
    fn test_from_regions_checks_kind_and_dimension() {
        let regions = RegionSet::new(
            2,
            DescriptorBuffer::Byte(vec![1, 2, 3, 4]),
            vec![PointFeature::new(0.0, 0.0), PointFeature::new(1.0, 1.0)],
        )
        .unwrap();

        assert_eq!(DescriptorMatrix::<u8>::from_regions(&regions, 2).unwrap().rows(), 2);
        assert!(matches!(
            DescriptorMatrix::<f32>::from_regions(&regions, 2),
            Err(Error::ScalarMismatch { expected: ScalarKind::Float, actual: ScalarKind::Byte })
        ));
        assert!(matches!(
            DescriptorMatrix::<u8>::from_regions(&regions, 4),
            Err(Error::InvalidDimension { expected: 4, actual: 2 })
        ));

        let empty = RegionSet::empty(ScalarKind::Float, 8);
        assert!(DescriptorMatrix::<u8>::from_regions(&empty, 128).unwrap().is_empty());
    }
}
