use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::error::TokenServiceError;

const SHARD_BITS: u32 = 10;
const REALM_BITS: u32 = 16;
const NUM_BITS: u32 = 38;

const SHARD_MASK: i64 = (1 << SHARD_BITS) - 1;
const REALM_MASK: i64 = (1 << REALM_BITS) - 1;
const NUM_MASK: i64 = (1 << NUM_BITS) - 1;

/// Identifier of an account or token, written as `shard.realm.num`.
///
/// The database stores ids as a single 64-bit integer with the shard in the top
/// 10 bits, the realm in the next 16 and the number in the low 38.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId {
    shard: i64,
    realm: i64,
    num: i64,
}

impl EntityId {
    pub fn new(shard: i64, realm: i64, num: i64) -> Result<Self, TokenServiceError> {
        if !(0..=SHARD_MASK).contains(&shard)
            || !(0..=REALM_MASK).contains(&realm)
            || !(0..=NUM_MASK).contains(&num)
        {
            return Err(TokenServiceError::invalid_request(format!(
                "entity id {}.{}.{} is out of range",
                shard, realm, num
            )));
        }
        Ok(Self { shard, realm, num })
    }

    /// Decode the integer form used in the `token_account` and `token` tables.
    /// Shards from 512 up occupy the sign bit, so negative values are valid.
    pub fn from_encoded(encoded: i64) -> Self {
        Self {
            shard: (encoded >> (REALM_BITS + NUM_BITS)) & SHARD_MASK,
            realm: (encoded >> NUM_BITS) & REALM_MASK,
            num: encoded & NUM_MASK,
        }
    }

    pub fn encoded(&self) -> i64 {
        (self.shard << (REALM_BITS + NUM_BITS)) | (self.realm << NUM_BITS) | self.num
    }

    pub fn shard(&self) -> i64 {
        self.shard
    }

    pub fn realm(&self) -> i64 {
        self.realm
    }

    pub fn num(&self) -> i64 {
        self.num
    }
}

impl FromStr for EntityId {
    type Err = TokenServiceError;

    /// Accepts either `shard.realm.num` or a bare encoded integer.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || TokenServiceError::invalid_request(format!("invalid entity id '{}'", value));

        let parts: Vec<&str> = value.trim().split('.').collect();
        match parts.as_slice() {
            [encoded] => Ok(Self::from_encoded(encoded.parse().map_err(|_| invalid())?)),
            [shard, realm, num] => {
                let shard = shard.parse().map_err(|_| invalid())?;
                let realm = realm.parse().map_err(|_| invalid())?;
                let num = num.parse().map_err(|_| invalid())?;
                Self::new(shard, realm, num)
            }
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.shard, self.realm, self.num)
    }
}

impl Serialize for EntityId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_shard_realm_num() {
        let id: EntityId = "0.0.100".parse().unwrap();
        assert_eq!(id.num(), 100);
        assert_eq!(id.encoded(), 100);
        assert_eq!(id.to_string(), "0.0.100");
    }

    #[test]
    fn encodes_shard_and_realm_into_high_bits() {
        let id = EntityId::new(1, 2, 3).unwrap();
        let encoded = id.encoded();
        assert_eq!(encoded, (1 << 54) | (2 << 38) | 3);
        assert_eq!(EntityId::from_encoded(encoded), id);
    }

    #[test]
    fn high_shards_round_trip_through_sign_bit() {
        for shard in [511, 512, 1023] {
            let id = EntityId::new(shard, 65535, (1 << 38) - 1).unwrap();
            let encoded = id.encoded();
            assert_eq!(EntityId::from_encoded(encoded), id, "shard {}", shard);
        }

        let id = EntityId::new(512, 0, 1).unwrap();
        assert!(id.encoded() < 0);
        assert_eq!(EntityId::from_encoded(id.encoded()).to_string(), "512.0.1");
        assert_eq!(id.encoded().to_string().parse::<EntityId>().unwrap(), id);
    }

    #[test]
    fn accepts_bare_encoded_form() {
        let id: EntityId = "1000".parse().unwrap();
        assert_eq!(id, EntityId::new(0, 0, 1000).unwrap());
    }

    #[test]
    fn rejects_malformed_ids() {
        for value in ["", "0.0", "a.b.c", "0.0.-1", "1024.0.1", "0.65536.1", "1.2.3.4"] {
            let err = value.parse::<EntityId>().unwrap_err();
            assert!(matches!(err, TokenServiceError::InvalidRequest(_)), "{}", value);
        }
    }
}
