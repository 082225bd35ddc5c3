/// Cascade hashing index of one image's descriptors.
///
/// Every descriptor gets a primary hash code (one bit per projection) and
/// one bucket id per bucket group; the bucket tables list, per group, the
/// descriptors that fell in each bucket.
#[derive(Debug, Clone, Default)]
pub struct HashedDescriptions {
    words_per_code: usize,
    bucket_groups: usize,
    /// Packed hash codes, `words_per_code` words per descriptor
    codes: Vec<u64>,
    /// Bucket id of each descriptor in each group, `bucket_groups` per descriptor
    bucket_ids: Vec<u16>,
    /// `buckets[group][bucket]` -> descriptor indices in ascending order
    buckets: Vec<Vec<Vec<u32>>>,
}

impl HashedDescriptions {
    pub(crate) fn with_capacity(
        rows: usize,
        code_bits: usize,
        bucket_groups: usize,
        bits_per_bucket: u8,
    ) -> Self {
        let words_per_code = (code_bits + 63) / 64;
        Self {
            words_per_code,
            bucket_groups,
            codes: Vec::with_capacity(rows * words_per_code),
            bucket_ids: Vec::with_capacity(rows * bucket_groups),
            buckets: vec![vec![Vec::new(); 1usize << bits_per_bucket]; bucket_groups],
        }
    }

    /// Append a descriptor's hash code and bucket ids, filing it in the
    /// bucket tables.
    pub(crate) fn push(&mut self, code: &[u64], bucket_ids: &[u16]) {
        debug_assert_eq!(code.len(), self.words_per_code);
        debug_assert_eq!(bucket_ids.len(), self.bucket_groups);
        let index = self.len() as u32;
        self.codes.extend_from_slice(code);
        self.bucket_ids.extend_from_slice(bucket_ids);
        for (group, &bucket) in bucket_ids.iter().enumerate() {
            self.buckets[group][bucket as usize].push(index);
        }
    }

    /// Number of hashed descriptors.
    #[inline]
    pub fn len(&self) -> usize {
        if self.words_per_code == 0 {
            0
        } else {
            self.codes.len() / self.words_per_code
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn bucket_groups(&self) -> usize {
        self.bucket_groups
    }

    /// Packed hash code of descriptor `index`.
    #[inline]
    pub fn code(&self, index: usize) -> &[u64] {
        let start = index * self.words_per_code;
        &self.codes[start..start + self.words_per_code]
    }

    #[inline]
    pub fn bucket_id(&self, index: usize, group: usize) -> u16 {
        self.bucket_ids[index * self.bucket_groups + group]
    }

    /// Descriptors filed in `bucket` of `group`; empty if either is unknown.
    #[inline]
    pub fn bucket(&self, group: usize, bucket: u16) -> &[u32] {
        self.buckets
            .get(group)
            .and_then(|table| table.get(bucket as usize))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_files_buckets() {
        let mut hashed = HashedDescriptions::with_capacity(2, 70, 2, 2);
        hashed.push(&[1, 0], &[3, 0]);
        hashed.push(&[2, 1], &[3, 1]);

        assert_eq!(hashed.len(), 2);
        assert_eq!(hashed.code(1), &[2, 1]);
        assert_eq!(hashed.bucket_id(1, 1), 1);
        assert_eq!(hashed.bucket(0, 3), &[0, 1]);
        assert_eq!(hashed.bucket(1, 0), &[0]);
        assert!(hashed.bucket(5, 0).is_empty());
    }

    #[test]
    fn test_default_is_empty() {
        let hashed = HashedDescriptions::default();
        assert!(hashed.is_empty());
        assert!(hashed.bucket(0, 0).is_empty());
    }
}
