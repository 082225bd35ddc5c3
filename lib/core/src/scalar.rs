use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{DescriptorBuffer, Error, Result};

/// Type name used by region stores whose descriptors are bit-packed.
pub const BINARY_TYPE_NAME: &str = "binary";

/// Scalar type of descriptor components.
///
/// Resolved once from the region provider's type name; everything past that
/// boundary is generic over [`DescriptorScalar`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    /// Unsigned byte components (SIFT-like descriptors stored as `u8`)
    Byte,
    /// Single precision float components
    Float,
}

impl ScalarKind {
    /// Resolve a descriptor type name to a supported scalar kind.
    pub fn from_type_name(name: &str) -> Result<Self> {
        match name {
            "u8" | "uint8" | "byte" | "unsigned char" => Ok(ScalarKind::Byte),
            "f32" | "float" | "float32" => Ok(ScalarKind::Float),
            other => Err(Error::UnknownScalarType(other.to_string())),
        }
    }

    #[inline]
    #[must_use]
    pub fn type_name(self) -> &'static str {
        match self {
            ScalarKind::Byte => "u8",
            ScalarKind::Float => "f32",
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// A descriptor component type the matcher has a code path for.
pub trait DescriptorScalar: Copy + PartialEq + fmt::Debug + Send + Sync + 'static {
    const KIND: ScalarKind;

    fn to_f32(self) -> f32;

    /// Squared Euclidean distance between two descriptors of equal length.
    fn squared_l2(a: &[Self], b: &[Self]) -> f32;

    /// Borrow the buffer as a slice of `Self` when the scalar kinds agree.
    fn slice_of(buffer: &DescriptorBuffer) -> Option<&[Self]>;
}

impl DescriptorScalar for u8 {
    const KIND: ScalarKind = ScalarKind::Byte;

    #[inline]
    fn to_f32(self) -> f32 {
        f32::from(self)
    }

    #[inline]
    fn squared_l2(a: &[Self], b: &[Self]) -> f32 {
        crate::simd::squared_l2_u8(a, b) as f32
    }

    #[inline]
    fn slice_of(buffer: &DescriptorBuffer) -> Option<&[Self]> {
        match buffer {
            DescriptorBuffer::Byte(data) => Some(data),
            DescriptorBuffer::Float(_) => None,
        }
    }
}

impl DescriptorScalar for f32 {
    const KIND: ScalarKind = ScalarKind::Float;

    #[inline]
    fn to_f32(self) -> f32 {
        self
    }

    #[inline]
    fn squared_l2(a: &[Self], b: &[Self]) -> f32 {
        crate::simd::squared_l2_simd(a, b)
    }

    #[inline]
    fn slice_of(buffer: &DescriptorBuffer) -> Option<&[Self]> {
        match buffer {
            DescriptorBuffer::Float(data) => Some(data),
            DescriptorBuffer::Byte(_) => None,
        }
    }
}
