use bytemuck::Pod;

/// A key type usable in a sorted array.
///
/// Keys are ordered by [`BlobKey::key_hash`] and confirmed by equality, so
/// distinct keys may share a hash.
pub trait BlobKey: Pod + PartialEq {
    fn key_hash(&self) -> u64 {
        digest_hash(bytemuck::bytes_of(self))
    }
}

/// The first eight bytes of the BLAKE3 digest of `bytes`, little-endian.
pub fn digest_hash(bytes: &[u8]) -> u64 {
    let digest = blake3::hash(bytes);
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest.as_bytes()[..8]);
    u64::from_le_bytes(prefix)
}

macro_rules! impl_blob_key {
    ($($ty:ty),+ $(,)?) => {
        $(impl BlobKey for $ty {})+
    };
}

impl_blob_key!(u8, u16, u32, u64, i8, i16, i32, i64, [u8; 16], [u8; 32]);
