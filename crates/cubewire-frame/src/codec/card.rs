//! Printed cards, stickers and mats that carry a standard id.

use serde::{Deserialize, Serialize};

macro_rules! standard_ids {
    ($($name:ident = $raw:literal,)+) => {
        /// A standard id read from a printed card, sticker or mark.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum StandardId {
            $($name,)+
            /// An id this crate does not know about.
            Unknown(u32),
        }

        impl StandardId {
            /// Map the raw 32-bit id to a known card.
            pub fn from_raw(raw: u32) -> Self {
                match raw {
                    $($raw => StandardId::$name,)+
                    other => StandardId::Unknown(other),
                }
            }

            /// The raw 32-bit id as it appears on the wire.
            pub fn raw(self) -> u32 {
                match self {
                    $(StandardId::$name => $raw,)+
                    StandardId::Unknown(raw) => raw,
                }
            }
        }
    };
}

standard_ids! {
    CardTyphoon = 3_670_016,
    CardRush = 3_670_054,
    CardAutoTackle = 3_670_018,
    CardRandom = 3_670_056,
    CardTacklePowerUp = 3_670_020,
    CardSwingPowerUp = 3_670_058,
    CardSideAttack = 3_670_022,
    CardChasing = 3_670_060,
    CardLeft = 3_670_024,
    CardRight = 3_670_062,
    CardFront = 3_670_026,
    CardBack = 3_670_064,
    CardGo = 3_670_028,
    SkunkBlue = 3_670_078,
    SkunkGreen = 3_670_042,
    SkunkYellow = 3_670_080,
    SkunkOrange = 3_670_044,
    SkunkRed = 3_670_082,
    SkunkBrown = 3_670_046,
    StickerSpeedUp = 3_670_066,
    StickerSpeedDown = 3_670_030,
    StickerWobble = 3_670_068,
    StickerPanic = 3_670_032,
    StickerSpin = 3_670_070,
    StickerShock = 3_670_034,
    MarkCraftFighter = 3_670_048,
    MarkRhythmAndGo = 3_670_052,
    MarkSkunkChaser = 3_670_086,
    MarkFingerStrike = 3_670_050,
    MarkFingerStrike1p = 3_670_088,
    MarkFreeMove = 3_670_084,
}
