//! Streaming conversion between the text, XML and binary (version 3) variants of the
//! AngelCode BMFont descriptor format.
//!
//! Records are transcoded one at a time: nothing beyond the entry in flight is held in
//! memory, so descriptors of any size convert in constant space.
//!
//! # Usage
//! ```
//! use bmfont_convert::{convert, Format};
//!
//! # fn test() -> Result<(), bmfont_convert::Error> {
//! let text = "info face=\"Arial\" size=32 bold=1 italic=0 charset=\"\" unicode=1 stretchH=100 \
//!             smooth=1 aa=1 padding=0,0,0,0 spacing=1,1 outline=0\n\
//!             common lineHeight=32 base=26 scaleW=256 scaleH=256 pages=1 packed=0 \
//!             alphaChnl=1 redChnl=0 greenChnl=0 blueChnl=0\n\
//!             page id=0 file=\"arial_0.png\"\n\
//!             chars count=0\n";
//!
//! let mut xml = Vec::new();
//! let summary = convert(text.as_bytes(), Format::Text, &mut xml, Format::Xml)?;
//! assert_eq!(summary.pages, 1);
//! assert_eq!(summary.kernings, None);
//!
//! let xml = String::from_utf8(xml).unwrap();
//! assert!(xml.starts_with("<?xml version=\"1.0\"?>\n<font>\n  <info face=\"Arial\""));
//! assert!(xml.contains("  <pages>\n    <page id=\"0\" file=\"arial_0.png\" />\n  </pages>\n"));
//! # Ok(())
//! # }
//! # test().unwrap();
//! ```
//!
//! ## Block by block
//! The block codecs are public, for callers that want to inspect records on the way:
//! ```
//! use bmfont_convert::{entries::Chars, source::Source, Format};
//!
//! # fn test() -> Result<(), bmfont_convert::Error> {
//! let text = "chars count=1\n\
//!             char id=65 x=0 y=0 width=9 height=11 xoffset=0 yoffset=4 xadvance=9 page=0 chnl=15\n";
//! let mut source = Source::new(text.as_bytes());
//! let chars = Chars::new(&mut source, Format::Text, Format::Binary)?;
//! assert_eq!(chars.entry_count(), 1);
//! let binary: Vec<u8> = chars.collect::<Result<Vec<_>, _>>()?.concat();
//! assert_eq!(&binary[..5], &[4, 20, 0, 0, 0]);
//! # Ok(())
//! # }
//! # test().unwrap();
//! ```

#![cfg_attr(docs_rs, feature(doc_cfg))]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]

pub mod convert;
mod element;
pub mod entries;
pub mod error;
pub mod fixed;
pub mod format;
mod meta;
pub mod source;

pub use convert::{convert, convert_sniffed, Summary};
pub use error::{Error, Result};
pub use format::{Block, Format};
pub use meta::{CharRecord, CommonRecord, InfoRecord, KerningRecord, PageRecord};

#[cfg(feature = "bin")]
mod cli;

#[cfg(feature = "bin")]
pub use cli::{backup_path, convert_file, convert_in_place, run, Args};
