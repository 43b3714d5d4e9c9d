//! Fixed-size cryptographic values.
//!
//! Every value is a newtype over a byte array so a key image can never be
//! passed where a public key is expected. On the wire they are raw bytes with
//! no length prefix; in human-facing formats (serde, `Display`) they are
//! lowercase hex.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::archive::{BinaryReader, BinaryWriter};
use crate::codec::BinaryCodec;
use crate::error::CodecError;

macro_rules! fixed_bytes {
    ($(#[$meta:meta])* $name:ident, $len:expr) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub [u8; $len]);

        impl $name {
            /// Size of the value on the wire.
            pub const LEN: usize = $len;

            /// Create from raw bytes.
            pub const fn from_bytes(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            /// Get the raw bytes.
            pub const fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            /// Convert to hex string.
            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }

            /// Parse from hex string.
            pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
                let bytes = hex::decode(s)?;
                let arr: [u8; $len] = bytes
                    .try_into()
                    .map_err(|_| hex::FromHexError::InvalidStringLength)?;
                Ok(Self(arr))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self([0u8; $len])
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), &self.to_hex()[..16])
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl From<[u8; $len]> for $name {
            fn from(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }
        }

        impl TryFrom<&[u8]> for $name {
            type Error = std::array::TryFromSliceError;

            fn try_from(slice: &[u8]) -> Result<Self, Self::Error> {
                let arr: [u8; $len] = slice.try_into()?;
                Ok(Self(arr))
            }
        }

        impl BinaryCodec for $name {
            fn encode(&self, w: &mut BinaryWriter) -> Result<(), CodecError> {
                w.write_blob(&self.0);
                Ok(())
            }

            fn decode(r: &mut BinaryReader<'_>) -> Result<Self, CodecError> {
                r.read_array::<$len>().map(Self)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_hex())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Self::from_hex(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

fixed_bytes!(
    /// A 32-byte Keccak-256 hash: transaction ids, block ids, Merkle roots.
    Hash,
    32
);

fixed_bytes!(
    /// A 32-byte public key.
    PublicKey,
    32
);

fixed_bytes!(
    /// A 32-byte secret key.
    SecretKey,
    32
);

fixed_bytes!(
    /// A 32-byte key image, spent-output marker in a key input.
    KeyImage,
    32
);

fixed_bytes!(
    /// A 32-byte shared-secret key derivation.
    KeyDerivation,
    32
);

fixed_bytes!(
    /// A 64-byte ring signature element.
    Signature,
    64
);

fixed_bytes!(
    /// An 8-byte ChaCha8 initialisation vector.
    Chacha8Iv,
    8
);

impl Hash {
    /// The all-zero hash, used where no hash has been computed.
    pub const NULL: Self = Self([0u8; 32]);
}
