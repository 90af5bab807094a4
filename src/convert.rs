//! The conversion pipeline: one source stream, one destination stream, five blocks in order.

use std::io::{self, BufRead, Cursor, Read, Write};

use log::debug;

use crate::entries::{Chars, Kernings, Pages};
use crate::error::{Error, Result};
use crate::fixed;
use crate::format::{Block, Format, BINARY_MAGIC};
use crate::source::{eof_in, Source};

/// Entry counts of a finished conversion.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Summary {
    /// Number of pages transcoded.
    pub pages: u32,
    /// Number of chars transcoded.
    pub chars: u32,
    /// Number of kerning pairs transcoded, or `None` if the source had no kernings block.
    pub kernings: Option<u32>,
}

/// Transcodes the descriptor read from `reader` in format `from` into `writer` in format `to`.
///
/// Each record is written as soon as it has been read, so on failure the destination holds
/// everything up to the offending record. Converting to the binary format drops the info
/// block's charset, which that format cannot store.
///
/// # Errors
///
/// Fails on any I/O error and on any structural problem in the source, naming the block
/// (and field, where there is one) at fault.
pub fn convert<R: BufRead, W: Write>(
    reader: R,
    from: Format,
    mut writer: W,
    to: Format,
) -> Result<Summary> {
    let mut source = Source::new(reader);
    if from == Format::Binary {
        read_magic(&mut source)?;
    }
    writer.write_all(to.header())?;

    let info = fixed::decode_info(&mut source, from)?;
    debug!("info: face {:?}, size {}", info.face, info.size);
    fixed::encode_info(&info, to, &mut writer)?;

    let common = fixed::decode_common(&mut source, from)?;
    debug!("common: {} pages", common.pages);
    fixed::encode_common(&common, to, &mut writer)?;

    let pages = drain(Pages::new(&mut source, from, to, common.pages)?, &mut writer)?;
    let chars = drain(Chars::new(&mut source, from, to)?, &mut writer)?;
    let kernings = match Kernings::probe(&mut source, from, to)? {
        Some(kernings) => Some(drain(kernings, &mut writer)?),
        None => None,
    };

    writer.write_all(to.footer())?;
    writer.flush()?;
    debug!(
        "converted {from} to {to} after {} source lines",
        source.line_number()
    );

    Ok(Summary {
        pages,
        chars,
        kernings,
    })
}

/// Like [`convert`], but classifies the source by its four-byte signature first.
///
/// The signature is read from the stream and replayed, so no seeking is needed.
///
/// # Errors
///
/// Fails with [`Error::UnknownFormat`] if the source is shorter than a signature or no
/// signature matches, and otherwise as [`convert`] does.
pub fn convert_sniffed<R: BufRead, W: Write>(mut reader: R, writer: W, to: Format) -> Result<Summary> {
    let mut head = [0; 4];
    reader.read_exact(&mut head).map_err(|err| match err.kind() {
        io::ErrorKind::UnexpectedEof => Error::UnknownFormat,
        _ => Error::Io(err),
    })?;
    let from = Format::sniff(&head).ok_or(Error::UnknownFormat)?;
    debug!("sniffed {from} source");
    convert(Cursor::new(head).chain(reader), from, writer, to)
}

fn read_magic<R: BufRead>(source: &mut Source<R>) -> Result<()> {
    let mut found = [0; 4];
    source
        .read_exact(&mut found)
        .map_err(|err| eof_in(err, Block::Info))?;
    if found != BINARY_MAGIC {
        return Err(Error::BadMagic { found });
    }
    Ok(())
}

/// Writes every fragment of a block, returning how many entries it held.
fn drain<I, W>(fragments: I, writer: &mut W) -> Result<u32>
where
    I: Iterator<Item = Result<Vec<u8>>>,
    W: Write,
{
    let mut count = 0;
    for fragment in fragments {
        writer.write_all(&fragment?)?;
        count += 1;
    }
    Ok(count)
}
