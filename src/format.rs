//! The three physical descriptor syntaxes and the framing each one wraps around blocks.

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

const TEXT_SIGNATURE: &[u8; 4] = b"info";
const XML_SIGNATURE: &[u8; 4] = b"<?xm";

/// Magic bytes and version opening every binary descriptor.
pub const BINARY_MAGIC: [u8; 4] = [b'B', b'M', b'F', 3];

const XML_HEADER: &[u8] = b"<?xml version=\"1.0\"?>\n<font>\n";
const XML_FOOTER: &[u8] = b"</font>\n";

/// One of the on-disk representations of a font descriptor.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Format {
    /// Line-oriented `keyword key=value` text.
    Text,
    /// A `<font>` document with one element per record.
    Xml,
    /// Tagged, length-prefixed little-endian chunks (version 3).
    Binary,
}

impl Format {
    /// Classifies a descriptor by its first four bytes.
    ///
    /// This is a heuristic: a file matching a signature is not necessarily well-formed.
    #[must_use]
    pub fn sniff(head: &[u8]) -> Option<Self> {
        let head = head.get(..4)?;
        if head == TEXT_SIGNATURE {
            Some(Self::Text)
        } else if head == XML_SIGNATURE {
            Some(Self::Xml)
        } else if head == BINARY_MAGIC {
            Some(Self::Binary)
        } else {
            None
        }
    }

    /// Opens `path` and sniffs its signature. Any read failure yields `None`.
    pub fn detect<P: AsRef<Path>>(path: P) -> Option<Self> {
        let mut head = [0; 4];
        File::open(path).and_then(|mut file| file.read_exact(&mut head)).ok()?;
        Self::sniff(&head)
    }

    /// Bytes written before the first block.
    #[must_use]
    pub fn header(self) -> &'static [u8] {
        match self {
            Self::Text => b"",
            Self::Xml => XML_HEADER,
            Self::Binary => &BINARY_MAGIC,
        }
    }

    /// Bytes written after the last block.
    #[must_use]
    pub fn footer(self) -> &'static [u8] {
        match self {
            Self::Text | Self::Binary => b"",
            Self::Xml => XML_FOOTER,
        }
    }

    /// The one-letter code used on the command line.
    #[must_use]
    pub fn code(self) -> char {
        match self {
            Self::Text => 't',
            Self::Xml => 'x',
            Self::Binary => 'b',
        }
    }

    /// Opening framing of a repeating block holding `count` entries whose binary payload is
    /// `payload_len` bytes long.
    pub(crate) fn open_block(self, block: Block, count: u32, payload_len: u32) -> Vec<u8> {
        match self {
            Self::Text if block.declares_count() => {
                format!("{} count={count}\n", block.container()).into_bytes()
            }
            Self::Text => Vec::new(),
            Self::Xml if block.declares_count() => {
                format!("  <{} count=\"{count}\">\n", block.container()).into_bytes()
            }
            Self::Xml => format!("  <{}>\n", block.container()).into_bytes(),
            Self::Binary => {
                let mut out = Vec::with_capacity(5);
                out.push(block.tag());
                out.extend_from_slice(&payload_len.to_le_bytes());
                out
            }
        }
    }

    /// Closing framing of a repeating block.
    pub(crate) fn close_block(self, block: Block) -> Vec<u8> {
        match self {
            Self::Text | Self::Binary => Vec::new(),
            Self::Xml => format!("  </{}>\n", block.container()).into_bytes(),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Text => "text",
            Self::Xml => "XML",
            Self::Binary => "binary",
        })
    }
}

/// Error returned when parsing an unknown format code.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown format `{0}`, expected one of t, x, b")]
pub struct UnknownFormatCode(pub String);

impl FromStr for Format {
    type Err = UnknownFormatCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "t" | "text" | "txt" => Ok(Self::Text),
            "x" | "xml" => Ok(Self::Xml),
            "b" | "bin" | "binary" => Ok(Self::Binary),
            _ => Err(UnknownFormatCode(s.to_owned())),
        }
    }
}

/// The five top-level sections of a descriptor, in document order.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum Block {
    /// Font face and rasterisation settings.
    Info,
    /// Metrics shared by every glyph.
    Common,
    /// Texture page file names.
    Pages,
    /// Glyph placements.
    Chars,
    /// Kerning pairs. Optional.
    Kernings,
}

impl Block {
    /// Tag byte of the block's binary chunk.
    #[must_use]
    pub fn tag(self) -> u8 {
        match self {
            Self::Info => 1,
            Self::Common => 2,
            Self::Pages => 3,
            Self::Chars => 4,
            Self::Kernings => 5,
        }
    }

    /// Keyword of a single record line (`info`, `page`, `char`, ...).
    #[must_use]
    pub fn element(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Common => "common",
            Self::Pages => "page",
            Self::Chars => "char",
            Self::Kernings => "kerning",
        }
    }

    /// Name of the container wrapping a repeating block's entries.
    #[must_use]
    pub fn container(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Common => "common",
            Self::Pages => "pages",
            Self::Chars => "chars",
            Self::Kernings => "kernings",
        }
    }

    /// Whether the text and XML containers carry an explicit `count`.
    #[must_use]
    pub fn declares_count(self) -> bool {
        matches!(self, Self::Chars | Self::Kernings)
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.container())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn sniffs_signatures() {
        assert_eq!(Format::sniff(b"info face=\"Arial\""), Some(Format::Text));
        assert_eq!(Format::sniff(b"<?xml version"), Some(Format::Xml));
        assert_eq!(Format::sniff(&[0x42, 0x4D, 0x46, 0x03, 0x01]), Some(Format::Binary));
        assert_eq!(Format::sniff(&[0x42, 0x4D, 0x46, 0x02]), None);
        assert_eq!(Format::sniff(b"inf"), None);
        assert_eq!(Format::sniff(b"common"), None);
    }

    #[test]
    fn detect_treats_unreadable_paths_as_invalid() {
        assert_eq!(Format::detect("/nonexistent/font.fnt"), None);
    }

    #[test]
    fn parses_codes() {
        assert_eq!("t".parse::<Format>(), Ok(Format::Text));
        assert_eq!("x".parse::<Format>(), Ok(Format::Xml));
        assert_eq!("B".parse::<Format>(), Ok(Format::Binary));
        assert_eq!("q".parse::<Format>(), Err(UnknownFormatCode("q".into())));
        for format in [Format::Text, Format::Xml, Format::Binary] {
            assert_eq!(format.code().to_string().parse::<Format>(), Ok(format));
        }
    }

    #[test]
    fn block_framing() {
        assert_eq!(Format::Text.open_block(Block::Pages, 2, 20), b"");
        assert_eq!(Format::Text.open_block(Block::Chars, 95, 1900), b"chars count=95\n");
        assert_eq!(Format::Xml.open_block(Block::Pages, 1, 10), b"  <pages>\n");
        assert_eq!(
            Format::Xml.open_block(Block::Kernings, 3, 30),
            b"  <kernings count=\"3\">\n"
        );
        assert_eq!(Format::Binary.open_block(Block::Chars, 2, 40), [4, 40, 0, 0, 0]);
        assert_eq!(Format::Xml.close_block(Block::Chars), b"  </chars>\n");
        assert!(Format::Binary.close_block(Block::Chars).is_empty());
    }

    #[test]
    fn document_framing() {
        assert_eq!(Format::Xml.header(), b"<?xml version=\"1.0\"?>\n<font>\n");
        assert_eq!(Format::Xml.footer(), b"</font>\n");
        assert_eq!(Format::Binary.header(), b"BMF\x03");
        assert!(Format::Text.header().is_empty() && Format::Binary.footer().is_empty());
    }
}
