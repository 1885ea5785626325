//! Name-to-key hashing, shared by the LOGIN path and the shard selector.
//!
//! The original C server hashes the raw command line instead of the client's
//! name (`hash(recv_buff)` in `babble_server.c`), which means two successive
//! commands from the same client can hash differently and land on different
//! shards -- breaking per-client ordering. This is a known bug in the source,
//! not a contract: we hash only the registered name, once, and reuse the
//! resulting key everywhere a shard needs to be picked.

use crate::registry::ClientKey;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// FNV-1a over the name's bytes. Deterministic across threads and processes,
/// which the shard selector's statelessness requirement depends on.
///
/// Key `0` is reserved to mean "unset" (see `spec.md` §3), so a name that
/// happens to hash to zero is remapped to `1`. Collisions between `0` and `1`
/// are astronomically unlikely and, if they occur, simply make that one name
/// behave as though it hashed to `1`; both keys route to the same shard.
pub fn hash_name(name: &str) -> ClientKey {
    let mut hash = FNV_OFFSET_BASIS;
    for byte in name.as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    ClientKey(if hash == 0 { 1 } else { hash })
}
