//! Transient records decoded from one format and immediately re-encoded into another.
//!
//! None of these outlive a single step of a conversion; a whole descriptor is never
//! materialised in memory.

#[cfg(any(feature = "serde-serialize", feature = "serde-deserialize"))]
use serde::{Deserialize, Serialize};

/// The `info` block: how the font was rasterised.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize))]
#[cfg_attr(feature = "serde-deserialize", derive(Deserialize))]
#[cfg_attr(any(feature = "rkyv-serialize", feature = "rkyv-deserialize"), derive(rkyv::Archive))]
#[cfg_attr(feature = "rkyv-serialize", derive(rkyv::Serialize))]
#[cfg_attr(feature = "rkyv-deserialize", derive(rkyv::Deserialize))]
pub struct InfoRecord {
    /// Name of the true type font.
    pub face: String,
    /// Size of the true type font.
    pub size: i16,
    /// Whether the font is bold.
    pub bold: bool,
    /// Whether the font is italic.
    pub italic: bool,
    /// OEM charset name. Binary descriptors have no room for it, so it is always empty
    /// after passing through the binary format.
    pub charset: String,
    /// Whether the charset is Unicode.
    pub unicode: bool,
    /// Font height stretch in percent.
    pub stretch_h: u16,
    /// Whether smoothing was turned on.
    pub smooth: bool,
    /// Supersampling level, 1 meaning none.
    pub aa: u8,
    /// Padding around each glyph: up, right, down, left.
    pub padding: [u8; 4],
    /// Spacing between glyphs: horizontal, vertical.
    pub spacing: [u8; 2],
    /// Outline thickness.
    pub outline: u8,
}

/// The `common` block: metrics shared by all glyphs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize))]
#[cfg_attr(feature = "serde-deserialize", derive(Deserialize))]
#[cfg_attr(any(feature = "rkyv-serialize", feature = "rkyv-deserialize"), derive(rkyv::Archive))]
#[cfg_attr(feature = "rkyv-serialize", derive(rkyv::Serialize))]
#[cfg_attr(feature = "rkyv-deserialize", derive(rkyv::Deserialize))]
pub struct CommonRecord {
    /// Distance in pixels between each line of text.
    pub line_height: u16,
    /// Pixels from the top of the line to the base of the characters.
    pub base: u16,
    /// Width of the texture.
    pub scale_w: u16,
    /// Height of the texture.
    pub scale_h: u16,
    /// Number of texture pages, and so the number of entries in the `pages` block.
    pub pages: u16,
    /// Whether monochrome characters were packed into each texture channel.
    pub packed: bool,
    /// Contents of the alpha channel.
    pub alpha_chnl: u8,
    /// Contents of the red channel.
    pub red_chnl: u8,
    /// Contents of the green channel.
    pub green_chnl: u8,
    /// Contents of the blue channel.
    pub blue_chnl: u8,
}

/// One texture page.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize))]
#[cfg_attr(feature = "serde-deserialize", derive(Deserialize))]
#[cfg_attr(any(feature = "rkyv-serialize", feature = "rkyv-deserialize"), derive(rkyv::Archive))]
#[cfg_attr(feature = "rkyv-serialize", derive(rkyv::Serialize))]
#[cfg_attr(feature = "rkyv-deserialize", derive(rkyv::Deserialize))]
pub struct PageRecord {
    /// Zero-based position in the block. Reassigned on every conversion.
    pub id: u32,
    /// Texture file name.
    pub file: String,
}

/// One glyph placement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize))]
#[cfg_attr(feature = "serde-deserialize", derive(Deserialize))]
#[cfg_attr(any(feature = "rkyv-serialize", feature = "rkyv-deserialize"), derive(rkyv::Archive))]
#[cfg_attr(feature = "rkyv-serialize", derive(rkyv::Serialize))]
#[cfg_attr(feature = "rkyv-deserialize", derive(rkyv::Deserialize))]
pub struct CharRecord {
    /// Character id.
    pub id: u32,
    /// Left position of the glyph image in the texture.
    pub x: u16,
    /// Top position of the glyph image in the texture.
    pub y: u16,
    /// Width of the glyph image.
    pub width: u16,
    /// Height of the glyph image.
    pub height: u16,
    /// Horizontal offset applied when copying the image to the screen.
    pub xoffset: i16,
    /// Vertical offset applied when copying the image to the screen.
    pub yoffset: i16,
    /// How far to advance the cursor after drawing.
    pub xadvance: i16,
    /// Texture page holding the glyph image.
    pub page: u8,
    /// Texture channel(s) holding the glyph image.
    pub chnl: u8,
}

/// One kerning pair.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize))]
#[cfg_attr(feature = "serde-deserialize", derive(Deserialize))]
#[cfg_attr(any(feature = "rkyv-serialize", feature = "rkyv-deserialize"), derive(rkyv::Archive))]
#[cfg_attr(feature = "rkyv-serialize", derive(rkyv::Serialize))]
#[cfg_attr(feature = "rkyv-deserialize", derive(rkyv::Deserialize))]
pub struct KerningRecord {
    /// The first character id.
    pub first: u32,
    /// The second character id.
    pub second: u32,
    /// Horizontal adjustment applied between the two.
    pub amount: i16,
}

#[cfg(all(test, feature = "serde-serialize"))]
mod tests {
    use super::*;

    #[test]
    fn records_serialize_with_rust_field_names() {
        let kerning = KerningRecord { first: 65, second: 86, amount: -2 };
        let json = serde_json::to_string(&kerning).unwrap();
        assert_eq!(json, r#"{"first":65,"second":86,"amount":-2}"#);
    }
}
