//! Catalog enums: product kinds, pots, tools and plant colours.

use serde::{Deserialize, Serialize};

use super::UnknownVariant;

/// Generates `as_str`, `ALL`, `Display` and a case-insensitive `FromStr` for a
/// fieldless enum whose wire names are `SCREAMING_SNAKE_CASE`.
macro_rules! text_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// Every variant.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Wire/database representation.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(wanted))
                    .ok_or_else(|| UnknownVariant::new($kind, s))
            }
        }
    };
}

/// What kind of item a product is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductType {
    Decor,
    Sapling,
    Plant,
    Arrangement,
    Tool,
}

text_enum!(ProductType, "product type", {
    Decor => "DECOR",
    Sapling => "SAPLING",
    Plant => "PLANT",
    Arrangement => "ARRANGEMENT",
    Tool => "TOOL",
});

impl ProductType {
    /// Living products must reference the plant they contain.
    #[must_use]
    pub const fn requires_plant(self) -> bool {
        matches!(self, Self::Plant | Self::Sapling | Self::Arrangement)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PotSize {
    Small,
    Medium,
    Large,
}

text_enum!(PotSize, "pot size", {
    Small => "SMALL",
    Medium => "MEDIUM",
    Large => "LARGE",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PotType {
    Plastic,
    Ceramic,
    Terracotta,
    Clay,
}

text_enum!(PotType, "pot type", {
    Plastic => "PLASTIC",
    Ceramic => "CERAMIC",
    Terracotta => "TERRACOTTA",
    Clay => "CLAY",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ToolType {
    Hoe,
    Bucket,
    Pruner,
    Shovel,
    Rake,
    Watercan,
}

text_enum!(ToolType, "tool type", {
    Hoe => "HOE",
    Bucket => "BUCKET",
    Pruner => "PRUNER",
    Shovel => "SHOVEL",
    Rake => "RAKE",
    Watercan => "WATERCAN",
});

/// Leaf or bloom colour of a plant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Color {
    Red,
    Green,
    Purple,
    White,
    Orange,
    Blue,
    Yellow,
    Grey,
    Pink,
    None,
}

text_enum!(Color, "color", {
    Red => "RED",
    Green => "GREEN",
    Purple => "PURPLE",
    White => "WHITE",
    Orange => "ORANGE",
    Blue => "BLUE",
    Yellow => "YELLOW",
    Grey => "GREY",
    Pink => "PINK",
    None => "NONE",
});
