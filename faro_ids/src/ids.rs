//! Type-safe identifier newtypes for the parts engine.
//! Part ids are assigned by the host (screen layouts address parts by fixed
//! integer), so unlike an allocator-issued id there is no generation word:
//! an id is just its raw value. 0 is reserved as nil everywhere.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Defines a plain id newtype over a raw integer with a nil sentinel.
macro_rules! define_id {
    ($type_name:ident, $raw:ty, $doc:literal) => {
        #[doc = $doc]
        #[derive(
            Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub struct $type_name(pub $raw);

        impl $type_name {
            #[inline]
            pub const fn new(raw: $raw) -> Self {
                Self(raw)
            }

            #[inline]
            pub const fn nil() -> Self {
                Self(0)
            }

            #[inline]
            pub const fn is_nil(self) -> bool {
                self.0 == 0
            }
        }

        impl Default for $type_name {
            fn default() -> Self {
                Self::nil()
            }
        }

        impl fmt::Debug for $type_name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($type_name), "({})"), self.0)
            }
        }

        impl fmt::Display for $type_name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(PartId, u32, "Part id — assigned by the host, 0 reserved.");
define_id!(TextureId, u32, "Texture id — issued by the graphics backend.");
define_id!(AssetId, u32, "Raster asset index in the host archive.");
define_id!(SoundId, u32, "Sound effect index in the host archive.");
define_id!(
    CharacterId,
    u16,
    "Character id inside one vector-animation stream's dictionary."
);

impl PartId {
    #[inline]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl TextureId {
    #[inline]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl AssetId {
    #[inline]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl SoundId {
    #[inline]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl CharacterId {
    #[inline]
    pub const fn as_u16(self) -> u16 {
        self.0
    }
}
