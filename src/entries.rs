//! Streaming transcoding of the three repeating blocks: pages, chars and kernings.
//!
//! An [`Entries`] iterator reads one entry at a time from the source, encodes it in the
//! target format and yields the encoded bytes as a *fragment*. The first fragment is
//! prefixed with the block's opening framing and the last one is suffixed with its closing
//! framing, so writing every fragment in order produces the complete block. Nothing beyond
//! the entry in flight is kept in memory.
//!
//! The iterator is single pass: consuming it advances the source, and once it has
//! yielded an error it yields nothing more.

use std::fmt::{self, Write as _};
use std::io::{BufRead, Read, Write};
use std::marker::PhantomData;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use log::{debug, trace};

use crate::element::{self, escape, is_self_closing, Element};
use crate::error::{Error, Result};
use crate::format::{Block, Format};
use crate::meta::{CharRecord, KerningRecord, PageRecord};
use crate::source::{eof_in, Source};

/// Bytes per binary char entry.
pub const CHAR_WIDTH: u32 = 20;
/// Bytes per binary kerning entry.
pub const KERNING_WIDTH: u32 = 10;

/// An entry of one of the repeating blocks.
pub trait Repeating: Sized + fmt::Debug {
    /// The block this entry belongs to.
    const BLOCK: Block;

    /// Width of every binary entry, or `None` when it is measured from the first entry.
    const BINARY_WIDTH: Option<u32>;

    /// Width of this entry in the binary format.
    fn binary_width(&self) -> u32 {
        Self::BINARY_WIDTH.unwrap_or(0)
    }

    /// Parses the entry at position `index` from a text or XML line.
    ///
    /// # Errors
    ///
    /// Fails if the line is not an entry of this block or lacks one of its fields.
    fn decode_line(line: &str, format: Format, index: u32) -> Result<Self>;

    /// Reads the entry at position `index` from a binary chunk with `remaining` payload
    /// bytes left.
    ///
    /// # Errors
    ///
    /// Fails if the source or the chunk ends early, or the entry cannot be represented.
    fn decode_binary<R: BufRead>(source: &mut Source<R>, index: u32, remaining: u32) -> Result<Self>;

    /// Writes the entry, without any block framing.
    ///
    /// # Errors
    ///
    /// Fails if writing fails.
    fn encode<W: Write>(&self, format: Format, out: &mut W) -> Result<()>;
}

impl Repeating for PageRecord {
    const BLOCK: Block = Block::Pages;
    const BINARY_WIDTH: Option<u32> = None;

    fn binary_width(&self) -> u32 {
        u32::try_from(self.file.len() + 1).unwrap_or(u32::MAX)
    }

    fn decode_line(line: &str, format: Format, index: u32) -> Result<Self> {
        let fields = Element::parse(line, format, Self::BLOCK)?.expect(Self::BLOCK.element(), line)?;
        Ok(Self {
            id: index,
            file: fields.str("file")?.to_owned(),
        })
    }

    fn decode_binary<R: BufRead>(source: &mut Source<R>, index: u32, remaining: u32) -> Result<Self> {
        let bytes = source.read_cstr(Self::BLOCK, remaining)?;
        let file = String::from_utf8(bytes).map_err(|err| Error::InvalidField {
            block: Self::BLOCK,
            field: "file",
            value: String::from_utf8_lossy(err.as_bytes()).into_owned(),
        })?;
        Ok(Self { id: index, file })
    }

    fn encode<W: Write>(&self, format: Format, out: &mut W) -> Result<()> {
        match format {
            Format::Text => writeln!(out, "page id={} file=\"{}\"", self.id, self.file)?,
            Format::Xml => writeln!(
                out,
                "    <page id=\"{}\" file=\"{}\" />",
                self.id,
                escape(&self.file)
            )?,
            Format::Binary => {
                out.write_all(self.file.as_bytes())?;
                out.write_u8(0)?;
            }
        }
        Ok(())
    }
}

impl Repeating for CharRecord {
    const BLOCK: Block = Block::Chars;
    const BINARY_WIDTH: Option<u32> = Some(CHAR_WIDTH);

    fn decode_line(line: &str, format: Format, _index: u32) -> Result<Self> {
        let fields = Element::parse(line, format, Self::BLOCK)?.expect(Self::BLOCK.element(), line)?;
        Ok(Self {
            id: fields.int("id")?,
            x: fields.int("x")?,
            y: fields.int("y")?,
            width: fields.int("width")?,
            height: fields.int("height")?,
            xoffset: fields.int("xoffset")?,
            yoffset: fields.int("yoffset")?,
            xadvance: fields.int("xadvance")?,
            page: fields.int("page")?,
            chnl: fields.int("chnl")?,
        })
    }

    fn decode_binary<R: BufRead>(source: &mut Source<R>, _index: u32, _remaining: u32) -> Result<Self> {
        let mut raw = [0; CHAR_WIDTH as usize];
        source
            .read_exact(&mut raw)
            .map_err(|err| eof_in(err, Self::BLOCK))?;
        let mut cursor = &raw[..];
        Ok(Self {
            id: cursor.read_u32::<LittleEndian>()?,
            x: cursor.read_u16::<LittleEndian>()?,
            y: cursor.read_u16::<LittleEndian>()?,
            width: cursor.read_u16::<LittleEndian>()?,
            height: cursor.read_u16::<LittleEndian>()?,
            xoffset: cursor.read_i16::<LittleEndian>()?,
            yoffset: cursor.read_i16::<LittleEndian>()?,
            xadvance: cursor.read_i16::<LittleEndian>()?,
            page: cursor.read_u8()?,
            chnl: cursor.read_u8()?,
        })
    }

    fn encode<W: Write>(&self, format: Format, out: &mut W) -> Result<()> {
        match format {
            Format::Text => {
                let mut line = String::with_capacity(120);
                column(&mut line, format_args!("char id={}", self.id), 13);
                column(&mut line, format_args!("x={}", self.x), 8);
                column(&mut line, format_args!("y={}", self.y), 8);
                column(&mut line, format_args!("width={}", self.width), 12);
                column(&mut line, format_args!("height={}", self.height), 13);
                column(&mut line, format_args!("xoffset={}", self.xoffset), 14);
                column(&mut line, format_args!("yoffset={}", self.yoffset), 14);
                column(&mut line, format_args!("xadvance={}", self.xadvance), 15);
                column(&mut line, format_args!("page={}", self.page), 8);
                writeln!(out, "{line}chnl={}", self.chnl)?;
            }
            Format::Xml => writeln!(
                out,
                "    <char id=\"{}\" x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" xoffset=\"{}\" \
                 yoffset=\"{}\" xadvance=\"{}\" page=\"{}\" chnl=\"{}\" />",
                self.id,
                self.x,
                self.y,
                self.width,
                self.height,
                self.xoffset,
                self.yoffset,
                self.xadvance,
                self.page,
                self.chnl,
            )?,
            Format::Binary => {
                out.write_u32::<LittleEndian>(self.id)?;
                out.write_u16::<LittleEndian>(self.x)?;
                out.write_u16::<LittleEndian>(self.y)?;
                out.write_u16::<LittleEndian>(self.width)?;
                out.write_u16::<LittleEndian>(self.height)?;
                out.write_i16::<LittleEndian>(self.xoffset)?;
                out.write_i16::<LittleEndian>(self.yoffset)?;
                out.write_i16::<LittleEndian>(self.xadvance)?;
                out.write_u8(self.page)?;
                out.write_u8(self.chnl)?;
            }
        }
        Ok(())
    }
}

impl Repeating for KerningRecord {
    const BLOCK: Block = Block::Kernings;
    const BINARY_WIDTH: Option<u32> = Some(KERNING_WIDTH);

    fn decode_line(line: &str, format: Format, _index: u32) -> Result<Self> {
        let fields = Element::parse(line, format, Self::BLOCK)?.expect(Self::BLOCK.element(), line)?;
        Ok(Self {
            first: fields.int("first")?,
            second: fields.int("second")?,
            amount: fields.int("amount")?,
        })
    }

    fn decode_binary<R: BufRead>(source: &mut Source<R>, _index: u32, _remaining: u32) -> Result<Self> {
        let mut raw = [0; KERNING_WIDTH as usize];
        source
            .read_exact(&mut raw)
            .map_err(|err| eof_in(err, Self::BLOCK))?;
        let mut cursor = &raw[..];
        Ok(Self {
            first: cursor.read_u32::<LittleEndian>()?,
            second: cursor.read_u32::<LittleEndian>()?,
            amount: cursor.read_i16::<LittleEndian>()?,
        })
    }

    fn encode<W: Write>(&self, format: Format, out: &mut W) -> Result<()> {
        match format {
            Format::Text => {
                let mut line = String::with_capacity(48);
                column(&mut line, format_args!("kerning first={}", self.first), 18);
                column(&mut line, format_args!("second={}", self.second), 11);
                column(&mut line, format_args!("amount={}", self.amount), 11);
                writeln!(out, "{line}")?;
            }
            Format::Xml => writeln!(
                out,
                "    <kerning first=\"{}\" second=\"{}\" amount=\"{}\" />",
                self.first, self.second, self.amount
            )?,
            Format::Binary => {
                out.write_u32::<LittleEndian>(self.first)?;
                out.write_u32::<LittleEndian>(self.second)?;
                out.write_i16::<LittleEndian>(self.amount)?;
            }
        }
        Ok(())
    }
}

/// Appends `token` left-aligned in a column at least `width` characters wide, always
/// followed by at least one space.
fn column(line: &mut String, token: fmt::Arguments<'_>, width: usize) {
    let start = line.len();
    // Writing into a `String` cannot fail.
    let _ = line.write_fmt(token);
    let pad = width.saturating_sub(line.len() - start).max(1);
    line.extend(std::iter::repeat(' ').take(pad));
}

/// Streaming transcoder for the pages block.
pub type Pages<'s, R> = Entries<'s, R, PageRecord>;
/// Streaming transcoder for the chars block.
pub type Chars<'s, R> = Entries<'s, R, CharRecord>;
/// Streaming transcoder for the kernings block.
pub type Kernings<'s, R> = Entries<'s, R, KerningRecord>;

/// What a block's opening framing told us.
#[derive(Default)]
struct Opening {
    count: u32,
    chunk_len: Option<u32>,
    source_open: bool,
}

/// Iterator over the encoded fragments of one repeating block.
pub struct Entries<'s, R, B> {
    source: &'s mut Source<R>,
    from: Format,
    to: Format,
    count: u32,
    index: u32,
    /// Payload length of the source chunk, for binary sources.
    chunk_len: Option<u32>,
    /// Binary width of the first entry.
    width: Option<u32>,
    /// Whether the XML source still has a closing tag to step past.
    source_open: bool,
    failed: bool,
    _entry: PhantomData<B>,
}

impl<'s, R: BufRead> Pages<'s, R> {
    /// Opens the pages block. Text and XML do not declare the page count, so it is taken
    /// from the `common` block.
    ///
    /// # Errors
    ///
    /// Fails if the block's opening framing is missing or malformed.
    pub fn new(source: &'s mut Source<R>, from: Format, to: Format, count: u16) -> Result<Self> {
        Self::open(source, from, to, Some(u32::from(count)))
    }
}

impl<'s, R: BufRead> Chars<'s, R> {
    /// Opens the chars block, reading its declared or derived entry count.
    ///
    /// # Errors
    ///
    /// Fails if the block's opening framing is missing or malformed.
    pub fn new(source: &'s mut Source<R>, from: Format, to: Format) -> Result<Self> {
        Self::open(source, from, to, None)
    }
}

impl<'s, R: BufRead> Kernings<'s, R> {
    /// Opens the kernings block if the source has one. Absence is detected by lookahead and
    /// consumes nothing.
    ///
    /// # Errors
    ///
    /// Fails if the block is present but its opening framing is malformed.
    pub fn probe(source: &'s mut Source<R>, from: Format, to: Format) -> Result<Option<Self>> {
        if !kernings_present(source, from)? {
            debug!("source has no kernings block");
            return Ok(None);
        }
        Self::open(source, from, to, None).map(Some)
    }
}

/// Whether the next block in the source is a kernings block.
///
/// # Errors
///
/// Fails if reading ahead fails.
pub fn kernings_present<R: BufRead>(source: &mut Source<R>, format: Format) -> Result<bool> {
    block_present(source, format, Block::Kernings)
}

/// Whether the next thing in the source opens `block`. Text pages have no container, so
/// their first entry is looked for instead.
fn block_present<R: BufRead>(source: &mut Source<R>, format: Format, block: Block) -> Result<bool> {
    Ok(match format {
        Format::Binary => source.peek_byte()? == Some(block.tag()),
        Format::Text if block == Block::Pages => source
            .peek_line()?
            .is_some_and(|line| element::keyword(line, format) == block.element()),
        Format::Text | Format::Xml => source
            .peek_line()?
            .is_some_and(|line| element::keyword(line, format) == block.container()),
    })
}

impl<'s, R: BufRead, B: Repeating> Entries<'s, R, B> {
    fn open(source: &'s mut Source<R>, from: Format, to: Format, known: Option<u32>) -> Result<Self> {
        let block = B::BLOCK;
        // Empty blocks produce no output, so a missing container reads as an empty block.
        let opening = if known.unwrap_or(0) == 0 && !block_present(source, from, block)? {
            debug!("{block} block is absent, treating it as empty");
            Opening::default()
        } else {
            Self::read_opening(source, from, known)?
        };
        debug!("{block} block: {} entries, {from} -> {to}", opening.count);

        let mut entries = Self {
            source,
            from,
            to,
            count: opening.count,
            index: 0,
            chunk_len: opening.chunk_len,
            width: None,
            source_open: opening.source_open,
            failed: false,
            _entry: PhantomData,
        };
        if entries.count == 0 {
            entries.close_source()?;
        }
        Ok(entries)
    }

    /// Consumes the block's opening framing and works out how many entries follow.
    fn read_opening(source: &mut Source<R>, from: Format, known: Option<u32>) -> Result<Opening> {
        let block = B::BLOCK;
        if from == Format::Binary {
            let length = source.read_chunk_header(block)?;
            let count = match (known, B::BINARY_WIDTH) {
                (Some(0), _) if length != 0 => {
                    return Err(Error::ChunkLength {
                        block,
                        length,
                        expected: 0,
                    });
                }
                (Some(count), _) => count,
                (None, Some(width)) if length % width != 0 => {
                    return Err(Error::ChunkLength {
                        block,
                        length,
                        expected: u64::from(length - length % width),
                    });
                }
                (None, Some(width)) => length / width,
                (None, None) => {
                    return Err(Error::MissingField {
                        block,
                        field: "count",
                    });
                }
            };
            return Ok(Opening {
                count,
                chunk_len: Some(length),
                source_open: false,
            });
        }

        let mut declared = None;
        let mut source_open = false;
        if from == Format::Xml || block.declares_count() {
            let line = source.expect_line(block)?;
            let fields = Element::parse(&line, from, block)?.expect(block.container(), &line)?;
            if block.declares_count() {
                declared = Some(fields.int("count")?);
            }
            source_open = from == Format::Xml && !is_self_closing(&line);
        }
        let count = known.or(declared).ok_or(Error::MissingField {
            block,
            field: "count",
        })?;
        Ok(Opening {
            count,
            chunk_len: None,
            source_open,
        })
    }

    /// Number of entries in the block.
    #[must_use]
    pub fn entry_count(&self) -> u32 {
        self.count
    }

    fn step(&mut self) -> Result<Vec<u8>> {
        let block = B::BLOCK;
        let index = self.index;
        let entry = match self.from {
            Format::Binary => {
                let remaining = self.remaining();
                B::decode_binary(self.source, index, remaining)?
            }
            format => {
                let line = self.source.expect_line(block)?;
                B::decode_line(&line, format, index)?
            }
        };
        trace!("{block} entry {index}: {entry:?}");
        self.check_width(&entry)?;

        let mut fragment = Vec::new();
        if index == 0 {
            let payload_len = self.payload_len()?;
            fragment.extend(self.to.open_block(block, self.count, payload_len));
        }
        entry.encode(self.to, &mut fragment)?;

        self.index += 1;
        if self.index == self.count {
            fragment.extend(self.to.close_block(block));
            self.close_source()?;
        }
        Ok(fragment)
    }

    /// Binary entries of one block must share a width: the chunk header announcing the
    /// payload length is written before any entry but the first has been seen.
    fn check_width(&mut self, entry: &B) -> Result<()> {
        if self.from != Format::Binary && self.to != Format::Binary {
            return Ok(());
        }
        let found = entry.binary_width();
        match self.width {
            None => {
                self.width = Some(found);
                if let Some(length) = self.chunk_len {
                    let expected = u64::from(found) * u64::from(self.count);
                    if u64::from(length) != expected {
                        return Err(Error::ChunkLength {
                            block: B::BLOCK,
                            length,
                            expected,
                        });
                    }
                }
            }
            Some(expected) if expected != found => {
                return Err(Error::UnevenPageNames {
                    index: self.index,
                    expected,
                    found,
                });
            }
            Some(_) => {}
        }
        Ok(())
    }

    /// Source chunk bytes not yet consumed. Entries before this one all had the first
    /// entry's width.
    fn remaining(&self) -> u32 {
        let consumed = u64::from(self.width.unwrap_or(0)) * u64::from(self.index);
        let length = u64::from(self.chunk_len.unwrap_or(0));
        u32::try_from(length.saturating_sub(consumed)).unwrap_or(u32::MAX)
    }

    fn payload_len(&self) -> Result<u32> {
        let width = self.width.unwrap_or(0);
        width.checked_mul(self.count).ok_or(Error::ChunkLength {
            block: B::BLOCK,
            length: u32::MAX,
            expected: u64::from(width) * u64::from(self.count),
        })
    }

    /// Steps past the XML source's closing tag, if any.
    fn close_source(&mut self) -> Result<()> {
        if !self.source_open {
            return Ok(());
        }
        self.source_open = false;
        let block = B::BLOCK;
        let line = self.source.expect_line(block)?;
        let expected = format!("/{}", block.container());
        if element::keyword(&line, Format::Xml) != expected {
            return Err(Error::UnexpectedElement {
                block,
                expected,
                found: line.trim().to_owned(),
            });
        }
        Ok(())
    }
}

impl<R: BufRead, B: Repeating> Iterator for Entries<'_, R, B> {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.index >= self.count {
            return None;
        }
        let fragment = self.step();
        self.failed = fragment.is_err();
        Some(fragment)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.failed {
            return (0, Some(0));
        }
        let remaining = usize::try_from(self.count - self.index).unwrap_or(usize::MAX);
        (0, Some(remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn collect<I: Iterator<Item = Result<Vec<u8>>>>(entries: I) -> Vec<Vec<u8>> {
        entries.collect::<Result<_>>().unwrap()
    }

    fn text(fragments: &[Vec<u8>]) -> Vec<String> {
        fragments
            .iter()
            .map(|f| String::from_utf8(f.clone()).unwrap())
            .collect()
    }

    #[test]
    fn char_text_columns() {
        let glyph = CharRecord {
            id: 32,
            x: 0,
            y: 0,
            width: 3,
            height: 1,
            xoffset: -1,
            yoffset: 31,
            xadvance: 8,
            page: 0,
            chnl: 15,
        };
        let mut out = Vec::new();
        glyph.encode(Format::Text, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "char id=32   x=0     y=0     width=3     height=1     xoffset=-1    \
             yoffset=31    xadvance=8     page=0  chnl=15\n"
        );
    }

    #[test]
    fn wide_values_keep_a_separator() {
        let glyph = CharRecord {
            id: 1_234_567,
            x: 12_345,
            ..CharRecord::default()
        };
        let mut out = Vec::new();
        glyph.encode(Format::Text, &mut out).unwrap();
        let line = String::from_utf8(out).unwrap();
        assert!(line.starts_with("char id=1234567 x=12345 y=0     "));
    }

    #[test]
    fn kerning_text_columns() {
        let pair = KerningRecord {
            first: 65,
            second: 86,
            amount: -2,
        };
        let mut out = Vec::new();
        pair.encode(Format::Text, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "kerning first=65  second=86  amount=-2  \n"
        );
    }

    #[test]
    fn pages_from_xml_assign_ids_and_consume_closing_tag() {
        let xml = "  <pages>\n    <page id=\"7\" file=\"a_0.png\" />\n    \
                   <page id=\"9\" file=\"a_1.png\" />\n  </pages>\n  <chars count=\"0\">\n";
        let mut source = Source::new(xml.as_bytes());
        let fragments = collect(Pages::new(&mut source, Format::Xml, Format::Text, 2).unwrap());
        assert_eq!(
            text(&fragments),
            ["page id=0 file=\"a_0.png\"\n", "page id=1 file=\"a_1.png\"\n"]
        );
        assert_eq!(source.peek_line().unwrap(), Some("  <chars count=\"0\">"));
    }

    #[test]
    fn single_entry_carries_both_framings() {
        let mut source = Source::new("chars count=1\nchar id=65 x=1 y=2 width=3 height=4 xoffset=0 yoffset=0 xadvance=5 page=0 chnl=15\n".as_bytes());
        let fragments = collect(Chars::new(&mut source, Format::Text, Format::Xml).unwrap());
        assert_eq!(
            text(&fragments),
            ["  <chars count=\"1\">\n    <char id=\"65\" x=\"1\" y=\"2\" width=\"3\" height=\"4\" \
              xoffset=\"0\" yoffset=\"0\" xadvance=\"5\" page=\"0\" chnl=\"15\" />\n  </chars>\n"]
        );
    }

    #[test]
    fn empty_block_yields_nothing() {
        let xml = "  <chars count=\"0\">\n  </chars>\n</font>\n";
        let mut source = Source::new(xml.as_bytes());
        let chars = Chars::new(&mut source, Format::Xml, Format::Binary).unwrap();
        assert_eq!(chars.entry_count(), 0);
        assert!(collect(chars).is_empty());
        assert_eq!(source.peek_line().unwrap(), Some("</font>"));

        let mut source = Source::new("  <chars count=\"0\"/>\n</font>\n".as_bytes());
        assert!(collect(Chars::new(&mut source, Format::Xml, Format::Text).unwrap()).is_empty());
        assert_eq!(source.peek_line().unwrap(), Some("</font>"));
    }

    #[test]
    fn binary_chars_header_uses_payload_length() {
        let text = "chars count=2\n\
                    char id=65 x=0 y=0 width=1 height=1 xoffset=0 yoffset=0 xadvance=1 page=0 chnl=15\n\
                    char id=66 x=0 y=0 width=1 height=1 xoffset=0 yoffset=0 xadvance=1 page=0 chnl=15\n";
        let mut source = Source::new(text.as_bytes());
        let fragments = collect(Chars::new(&mut source, Format::Text, Format::Binary).unwrap());
        assert_eq!(fragments.len(), 2);
        assert_eq!(&fragments[0][..5], &[4, 40, 0, 0, 0]);
        assert_eq!(fragments[0].len(), 5 + 20);
        assert_eq!(fragments[1].len(), 20);

        let binary = fragments.concat();
        let mut source = Source::new(&binary[..]);
        let chars = Chars::new(&mut source, Format::Binary, Format::Text).unwrap();
        assert_eq!(chars.entry_count(), 2);
        let back = text_of(collect(chars));
        assert!(back.starts_with("chars count=2\nchar id=65   "));
    }

    fn text_of(fragments: Vec<Vec<u8>>) -> String {
        String::from_utf8(fragments.concat()).unwrap()
    }

    #[test]
    fn binary_chunk_length_must_fit_entries() {
        let mut source = Source::new(&[4u8, 21, 0, 0, 0][..]);
        assert!(matches!(
            Chars::new(&mut source, Format::Binary, Format::Text),
            Err(Error::ChunkLength { block: Block::Chars, length: 21, expected: 20 })
        ));
    }

    #[test]
    fn binary_pages_measure_first_name() {
        let mut bytes = vec![3u8, 16, 0, 0, 0];
        bytes.extend_from_slice(b"a_0.png\0a_1.png\0");
        let mut source = Source::new(&bytes[..]);
        let fragments = collect(Pages::new(&mut source, Format::Binary, Format::Xml, 2).unwrap());
        assert_eq!(
            text_of(fragments),
            "  <pages>\n    <page id=\"0\" file=\"a_0.png\" />\n    \
             <page id=\"1\" file=\"a_1.png\" />\n  </pages>\n"
        );
    }

    #[test]
    fn uneven_page_names_are_flagged() {
        let mut bytes = vec![3u8, 15, 0, 0, 0];
        bytes.extend_from_slice(b"a.png\0bb_1.png\0");
        let mut source = Source::new(&bytes[..]);
        let result: Result<Vec<_>> = Pages::new(&mut source, Format::Binary, Format::Text, 2)
            .unwrap()
            .collect();
        assert!(matches!(result, Err(Error::ChunkLength { block: Block::Pages, .. })));

        let text = "page id=0 file=\"a.png\"\npage id=1 file=\"bb.png\"\n";
        let mut source = Source::new(text.as_bytes());
        let mut pages = Pages::new(&mut source, Format::Text, Format::Binary, 2).unwrap();
        assert_eq!(pages.next().unwrap().unwrap(), b"\x03\x0c\0\0\0a.png\0");
        assert!(matches!(
            pages.next(),
            Some(Err(Error::UnevenPageNames { index: 1, expected: 6, found: 7 }))
        ));
        assert!(pages.next().is_none());
    }

    #[test]
    fn unterminated_page_name_stops_at_chunk_end() {
        let mut bytes = vec![3u8, 4, 0, 0, 0];
        bytes.extend_from_slice(b"abcdefgh\0");
        let mut source = Source::new(&bytes[..]);
        let result: Result<Vec<_>> = Pages::new(&mut source, Format::Binary, Format::Text, 1)
            .unwrap()
            .collect();
        assert!(matches!(result, Err(Error::UnexpectedEnd(Block::Pages))));
        assert_eq!(source.peek_byte().unwrap(), Some(b'e'));
    }

    #[test]
    fn kernings_probe_does_not_consume() {
        let mut source = Source::new("</font>\n".as_bytes());
        assert!(Kernings::probe(&mut source, Format::Xml, Format::Text)
            .unwrap()
            .is_none());
        assert_eq!(source.next_line().unwrap().as_deref(), Some("</font>"));

        let mut source = Source::new("".as_bytes());
        assert!(!kernings_present(&mut source, Format::Text).unwrap());

        let mut source = Source::new(&[5u8, 10, 0, 0, 0, 65, 0, 0, 0, 86, 0, 0, 0, 0xFE, 0xFF][..]);
        let kernings = Kernings::probe(&mut source, Format::Binary, Format::Xml)
            .unwrap()
            .unwrap();
        assert_eq!(
            text_of(collect(kernings)),
            "  <kernings count=\"1\">\n    <kerning first=\"65\" second=\"86\" amount=\"-2\" />\n  </kernings>\n"
        );
    }

    #[test]
    fn wrong_closing_tag_is_rejected() {
        let xml = "  <kernings count=\"1\">\n    <kerning first=\"1\" second=\"2\" amount=\"3\" />\n  </chars>\n";
        let mut source = Source::new(xml.as_bytes());
        let result: Result<Vec<_>> = Kernings::probe(&mut source, Format::Xml, Format::Text)
            .unwrap()
            .unwrap()
            .collect();
        assert!(matches!(
            result,
            Err(Error::UnexpectedElement { block: Block::Kernings, .. })
        ));
    }

    #[test]
    fn truncated_block_names_the_block() {
        let mut source = Source::new("chars count=3\nchar id=1 x=0 y=0 width=0 height=0 xoffset=0 yoffset=0 xadvance=0 page=0 chnl=0\n".as_bytes());
        let result: Result<Vec<_>> = Chars::new(&mut source, Format::Text, Format::Text)
            .unwrap()
            .collect();
        assert!(matches!(result, Err(Error::UnexpectedEnd(Block::Chars))));
    }
}
