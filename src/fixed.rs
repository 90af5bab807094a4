//! Codec for the two single-occurrence blocks, `info` and `common`.
//!
//! Text and XML fields are located by key; output always uses the canonical key order.

use std::io::{BufRead, Read, Write};

use bitflags::bitflags;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use log::debug;

use crate::element::{self, escape, Element};
use crate::error::{Error, Result};
use crate::format::{Block, Format};
use crate::meta::{CommonRecord, InfoRecord};
use crate::source::Source;

/// Bytes of the info payload preceding the face name.
const INFO_FIXED_LEN: usize = 14;
/// Bytes of the common payload.
const COMMON_LEN: usize = 15;

bitflags! {
    /// Bit field of the binary info block. Bits 0-3 are reserved.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub(crate) struct InfoFlags: u8 {
        const SMOOTH = 1 << 7;
        const UNICODE = 1 << 6;
        const ITALIC = 1 << 5;
        const BOLD = 1 << 4;
    }
}

bitflags! {
    /// Bit field of the binary common block. Bits 0-6 are reserved.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub(crate) struct CommonFlags: u8 {
        const PACKED = 1 << 7;
    }
}

impl InfoFlags {
    fn of(info: &InfoRecord) -> Self {
        let mut flags = Self::empty();
        flags.set(Self::SMOOTH, info.smooth);
        flags.set(Self::UNICODE, info.unicode);
        flags.set(Self::ITALIC, info.italic);
        flags.set(Self::BOLD, info.bold);
        flags
    }
}

/// Reads the `info` block. For text and XML, any lines preceding it (such as the XML
/// prolog and the `<font>` tag) are skipped.
pub fn decode_info<R: BufRead>(source: &mut Source<R>, format: Format) -> Result<InfoRecord> {
    let block = Block::Info;
    if format == Format::Binary {
        let length = source.read_chunk_header(block)?;
        let payload = source.read_payload(block, length)?;
        return info_from_binary(&payload, length);
    }

    let line = loop {
        let line = source.expect_line(block)?;
        if element::keyword(&line, format) == block.element() {
            break line;
        }
        debug!("skipping line {:?} before info block", line);
    };
    let fields = Element::parse(&line, format, block)?;
    Ok(InfoRecord {
        face: fields.str("face")?.to_owned(),
        size: fields.int("size")?,
        bold: fields.flag("bold")?,
        italic: fields.flag("italic")?,
        charset: fields.str("charset")?.to_owned(),
        unicode: fields.flag("unicode")?,
        stretch_h: fields.int("stretchH")?,
        smooth: fields.flag("smooth")?,
        aa: fields.int("aa")?,
        padding: fields.list("padding")?,
        spacing: fields.list("spacing")?,
        outline: fields.int("outline")?,
    })
}

fn info_from_binary(payload: &[u8], length: u32) -> Result<InfoRecord> {
    if payload.len() < INFO_FIXED_LEN {
        return Err(Error::ShortChunk {
            block: Block::Info,
            length,
        });
    }

    let mut cursor = payload;
    let size = cursor.read_i16::<LittleEndian>()?;
    let flags = InfoFlags::from_bits_truncate(cursor.read_u8()?);
    let _charset = cursor.read_u8()?;
    let stretch_h = cursor.read_u16::<LittleEndian>()?;
    let aa = cursor.read_u8()?;
    let mut padding = [0; 4];
    cursor.read_exact(&mut padding)?;
    let mut spacing = [0; 2];
    cursor.read_exact(&mut spacing)?;
    let outline = cursor.read_u8()?;

    let face = match cursor.iter().position(|&b| b == 0) {
        Some(end) => &cursor[..end],
        None => cursor,
    };
    let face = String::from_utf8(face.to_vec()).map_err(|err| Error::InvalidField {
        block: Block::Info,
        field: "face",
        value: String::from_utf8_lossy(err.as_bytes()).into_owned(),
    })?;

    Ok(InfoRecord {
        face,
        size,
        bold: flags.contains(InfoFlags::BOLD),
        italic: flags.contains(InfoFlags::ITALIC),
        charset: String::new(),
        unicode: flags.contains(InfoFlags::UNICODE),
        stretch_h,
        smooth: flags.contains(InfoFlags::SMOOTH),
        aa,
        padding,
        spacing,
        outline,
    })
}

/// Writes the `info` block. The binary format has no room for the charset, which is dropped.
pub fn encode_info<W: Write>(info: &InfoRecord, format: Format, out: &mut W) -> Result<()> {
    match format {
        Format::Text => writeln!(
            out,
            "info face=\"{}\" size={} bold={} italic={} charset=\"{}\" unicode={} stretchH={} \
             smooth={} aa={} padding={} spacing={} outline={}",
            info.face,
            info.size,
            u8::from(info.bold),
            u8::from(info.italic),
            info.charset,
            u8::from(info.unicode),
            info.stretch_h,
            u8::from(info.smooth),
            info.aa,
            join(&info.padding),
            join(&info.spacing),
            info.outline,
        )?,
        Format::Xml => writeln!(
            out,
            "  <info face=\"{}\" size=\"{}\" bold=\"{}\" italic=\"{}\" charset=\"{}\" \
             unicode=\"{}\" stretchH=\"{}\" smooth=\"{}\" aa=\"{}\" padding=\"{}\" \
             spacing=\"{}\" outline=\"{}\"/>",
            escape(&info.face),
            info.size,
            u8::from(info.bold),
            u8::from(info.italic),
            escape(&info.charset),
            u8::from(info.unicode),
            info.stretch_h,
            u8::from(info.smooth),
            info.aa,
            join(&info.padding),
            join(&info.spacing),
            info.outline,
        )?,
        Format::Binary => {
            if !info.charset.is_empty() {
                debug!("dropping charset {:?}, binary descriptors cannot store it", info.charset);
            }
            let mut payload = Vec::with_capacity(INFO_FIXED_LEN + info.face.len() + 1);
            payload.write_i16::<LittleEndian>(info.size)?;
            payload.write_u8(InfoFlags::of(info).bits())?;
            payload.write_u8(0)?;
            payload.write_u16::<LittleEndian>(info.stretch_h)?;
            payload.write_u8(info.aa)?;
            payload.write_all(&info.padding)?;
            payload.write_all(&info.spacing)?;
            payload.write_u8(info.outline)?;
            payload.write_all(info.face.as_bytes())?;
            payload.write_u8(0)?;
            write_chunk(out, Block::Info, &payload)?;
        }
    }
    Ok(())
}

/// Reads the `common` block.
pub fn decode_common<R: BufRead>(source: &mut Source<R>, format: Format) -> Result<CommonRecord> {
    let block = Block::Common;
    if format == Format::Binary {
        let length = source.read_chunk_header(block)?;
        let payload = source.read_payload(block, length)?;
        return common_from_binary(&payload, length);
    }

    let line = source.expect_line(block)?;
    let fields = Element::parse(&line, format, block)?.expect(block.element(), &line)?;
    Ok(CommonRecord {
        line_height: fields.int("lineHeight")?,
        base: fields.int("base")?,
        scale_w: fields.int("scaleW")?,
        scale_h: fields.int("scaleH")?,
        pages: fields.int("pages")?,
        packed: fields.flag("packed")?,
        alpha_chnl: fields.int("alphaChnl")?,
        red_chnl: fields.int("redChnl")?,
        green_chnl: fields.int("greenChnl")?,
        blue_chnl: fields.int("blueChnl")?,
    })
}

fn common_from_binary(payload: &[u8], length: u32) -> Result<CommonRecord> {
    if payload.len() < COMMON_LEN {
        return Err(Error::ShortChunk {
            block: Block::Common,
            length,
        });
    }

    let mut cursor = payload;
    Ok(CommonRecord {
        line_height: cursor.read_u16::<LittleEndian>()?,
        base: cursor.read_u16::<LittleEndian>()?,
        scale_w: cursor.read_u16::<LittleEndian>()?,
        scale_h: cursor.read_u16::<LittleEndian>()?,
        pages: cursor.read_u16::<LittleEndian>()?,
        packed: CommonFlags::from_bits_truncate(cursor.read_u8()?).contains(CommonFlags::PACKED),
        alpha_chnl: cursor.read_u8()?,
        red_chnl: cursor.read_u8()?,
        green_chnl: cursor.read_u8()?,
        blue_chnl: cursor.read_u8()?,
    })
}

/// Writes the `common` block.
pub fn encode_common<W: Write>(common: &CommonRecord, format: Format, out: &mut W) -> Result<()> {
    match format {
        Format::Text => writeln!(
            out,
            "common lineHeight={} base={} scaleW={} scaleH={} pages={} packed={} alphaChnl={} \
             redChnl={} greenChnl={} blueChnl={}",
            common.line_height,
            common.base,
            common.scale_w,
            common.scale_h,
            common.pages,
            u8::from(common.packed),
            common.alpha_chnl,
            common.red_chnl,
            common.green_chnl,
            common.blue_chnl,
        )?,
        Format::Xml => writeln!(
            out,
            "  <common lineHeight=\"{}\" base=\"{}\" scaleW=\"{}\" scaleH=\"{}\" pages=\"{}\" \
             packed=\"{}\" alphaChnl=\"{}\" redChnl=\"{}\" greenChnl=\"{}\" blueChnl=\"{}\"/>",
            common.line_height,
            common.base,
            common.scale_w,
            common.scale_h,
            common.pages,
            u8::from(common.packed),
            common.alpha_chnl,
            common.red_chnl,
            common.green_chnl,
            common.blue_chnl,
        )?,
        Format::Binary => {
            let mut flags = CommonFlags::empty();
            flags.set(CommonFlags::PACKED, common.packed);

            let mut payload = Vec::with_capacity(COMMON_LEN);
            payload.write_u16::<LittleEndian>(common.line_height)?;
            payload.write_u16::<LittleEndian>(common.base)?;
            payload.write_u16::<LittleEndian>(common.scale_w)?;
            payload.write_u16::<LittleEndian>(common.scale_h)?;
            payload.write_u16::<LittleEndian>(common.pages)?;
            payload.write_u8(flags.bits())?;
            payload.write_all(&[
                common.alpha_chnl,
                common.red_chnl,
                common.green_chnl,
                common.blue_chnl,
            ])?;
            write_chunk(out, Block::Common, &payload)?;
        }
    }
    Ok(())
}

fn write_chunk<W: Write>(out: &mut W, block: Block, payload: &[u8]) -> Result<()> {
    let length = u32::try_from(payload.len()).map_err(|_| Error::ChunkLength {
        block,
        length: u32::MAX,
        expected: payload.len() as u64,
    })?;
    out.write_u8(block.tag())?;
    out.write_u32::<LittleEndian>(length)?;
    out.write_all(payload)?;
    Ok(())
}

fn join(values: &[u8]) -> String {
    values
        .iter()
        .map(u8::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const INFO_TEXT: &str = "info face=\"Arial\" size=32 bold=1 italic=0 charset=\"\" unicode=1 \
                             stretchH=100 smooth=1 aa=1 padding=4,4,4,4 spacing=2,2 outline=0\n";
    const COMMON_TEXT: &str = "common lineHeight=38 base=30 scaleW=512 scaleH=512 pages=1 \
                               packed=0 alphaChnl=0 redChnl=4 greenChnl=4 blueChnl=4\n";

    fn arial() -> InfoRecord {
        InfoRecord {
            face: "Arial".into(),
            size: 32,
            bold: true,
            italic: false,
            charset: String::new(),
            unicode: true,
            stretch_h: 100,
            smooth: true,
            aa: 1,
            padding: [4, 4, 4, 4],
            spacing: [2, 2],
            outline: 0,
        }
    }

    fn encoded<F: FnOnce(&mut Vec<u8>) -> Result<()>>(f: F) -> Vec<u8> {
        let mut out = Vec::new();
        f(&mut out).unwrap();
        out
    }

    #[test]
    fn info_flag_byte_packing() {
        let info = InfoRecord {
            bold: true,
            italic: false,
            unicode: true,
            smooth: false,
            ..InfoRecord::default()
        };
        let bytes = encoded(|out| encode_info(&info, Format::Binary, out));
        assert_eq!(bytes[5 + 2], 0x50);

        let decoded = info_from_binary(&bytes[5..], 0).unwrap();
        assert!(decoded.bold && decoded.unicode);
        assert!(!decoded.italic && !decoded.smooth);
    }

    #[test]
    fn reserved_info_bits_are_ignored() {
        let mut payload = vec![0; INFO_FIXED_LEN];
        payload[2] = 0x5F;
        payload.push(0);
        let decoded = info_from_binary(&payload, 15).unwrap();
        let bytes = encoded(|out| encode_info(&decoded, Format::Binary, out));
        assert_eq!(bytes[5 + 2], 0x50);
    }

    #[test]
    fn info_binary_layout() {
        let bytes = encoded(|out| encode_info(&arial(), Format::Binary, out));
        assert_eq!(
            bytes,
            [
                1, 20, 0, 0, 0, // tag, length
                32, 0, 0xD0, 0, 100, 0, 1, 4, 4, 4, 4, 2, 2, 0, // fixed fields
                b'A', b'r', b'i', b'a', b'l', 0,
            ]
        );
    }

    #[test]
    fn common_binary_layout() {
        let mut source = Source::new(COMMON_TEXT.as_bytes());
        let common = decode_common(&mut source, Format::Text).unwrap();
        let bytes = encoded(|out| encode_common(&common, Format::Binary, out));
        assert_eq!(
            bytes,
            [2, 15, 0, 0, 0, 38, 0, 30, 0, 0, 2, 0, 2, 1, 0, 0, 0, 4, 4, 4]
        );
        let decoded = common_from_binary(&bytes[5..], 15).unwrap();
        assert_eq!(decoded, common);
    }

    #[test]
    fn text_is_canonicalised() {
        let shuffled = "info size=32 face=\"Arial\" outline=0 bold=1 italic=0 unicode=1 \
                        charset=\"\" smooth=1 stretchH=100 aa=1 spacing=2,2 padding=4,4,4,4\n";
        let mut source = Source::new(shuffled.as_bytes());
        let info = decode_info(&mut source, Format::Text).unwrap();
        assert_eq!(info, arial());
        let bytes = encoded(|out| encode_info(&info, Format::Text, out));
        assert_eq!(String::from_utf8(bytes).unwrap(), INFO_TEXT);
    }

    #[test]
    fn xml_info_skips_prolog_and_escapes() {
        let xml = "<?xml version=\"1.0\"?>\n<font>\n  <info face=\"A &amp; B\" size=\"-12\" \
                   bold=\"0\" italic=\"1\" charset=\"ANSI\" unicode=\"0\" stretchH=\"100\" \
                   smooth=\"0\" aa=\"2\" padding=\"0,1,2,3\" spacing=\"1,1\" outline=\"3\"/>\n";
        let mut source = Source::new(xml.as_bytes());
        let info = decode_info(&mut source, Format::Xml).unwrap();
        assert_eq!(info.face, "A & B");
        assert_eq!(info.size, -12);
        assert_eq!(info.charset, "ANSI");
        assert_eq!(info.padding, [0, 1, 2, 3]);

        let bytes = encoded(|out| encode_info(&info, Format::Xml, out));
        let line = String::from_utf8(bytes).unwrap();
        assert_eq!(line.trim(), xml.lines().nth(2).unwrap().trim());
    }

    #[test]
    fn binary_drops_charset() {
        let info = InfoRecord {
            charset: "ANSI".into(),
            ..arial()
        };
        let bytes = encoded(|out| encode_info(&info, Format::Binary, out));
        let mut source = Source::new(&bytes[..]);
        assert_eq!(decode_info(&mut source, Format::Binary).unwrap(), arial());
    }

    #[test]
    fn missing_field_names_block_and_key() {
        let mut source = Source::new("common lineHeight=38 base=30\n".as_bytes());
        assert!(matches!(
            decode_common(&mut source, Format::Text),
            Err(Error::MissingField { block: Block::Common, field: "scaleW" })
        ));
    }

    #[test]
    fn short_binary_chunks_are_rejected() {
        assert!(matches!(
            common_from_binary(&[0; 10], 10),
            Err(Error::ShortChunk { block: Block::Common, length: 10 })
        ));
        assert!(matches!(
            info_from_binary(&[0; 13], 13),
            Err(Error::ShortChunk { block: Block::Info, .. })
        ));
    }

    #[test]
    fn common_must_follow_info() {
        let mut source = Source::new("page id=0 file=\"a.png\"\n".as_bytes());
        assert!(matches!(
            decode_common(&mut source, Format::Text),
            Err(Error::UnexpectedElement { block: Block::Common, .. })
        ));
    }
}
