//! Word document text extraction.
//!
//! `.docx`: ZIP → `word/document.xml` → runs of `<w:t>` text.
//! `.doc`: OLE compound file → FIB in `WordDocument` → CLX piece table in
//! `0Table`/`1Table` → text pieces (8-bit compressed or UTF-16LE).

use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;
use zip::ZipArchive;

use crate::extraction::ExtractError;

// ────────────────────────────────────────────────────────────────────────────
// Word XML (.docx)
// ────────────────────────────────────────────────────────────────────────────

const DOCUMENT_XML_PATH: &str = "word/document.xml";

/// Ceiling on the decompressed body. A 5 MiB upload can inflate far past
/// this; real résumé bodies stay well under it.
const MAX_DOCUMENT_XML_BYTES: u64 = 32 * 1024 * 1024;

pub fn extract_docx(data: &[u8]) -> Result<String, ExtractError> {
    extract_docx_capped(data, MAX_DOCUMENT_XML_BYTES)
}

fn extract_docx_capped(data: &[u8], limit: u64) -> Result<String, ExtractError> {
    let mut archive = ZipArchive::new(Cursor::new(data)).map_err(|e| {
        ExtractError::failure(format!(
            "not a readable Word document; password-protected files are not supported ({e})"
        ))
    })?;

    let body = archive
        .by_name(DOCUMENT_XML_PATH)
        .map_err(|e| ExtractError::failure(format!("the Word document has no body ({e})")))?;
    let xml = read_capped(body, limit)?;

    document_xml_to_text(&xml)
}

/// Reads at most `limit` bytes of UTF-8; anything longer is rejected rather
/// than truncated.
fn read_capped(reader: impl Read, limit: u64) -> Result<String, ExtractError> {
    let mut xml = String::new();
    reader
        .take(limit.saturating_add(1))
        .read_to_string(&mut xml)
        .map_err(|e| ExtractError::failure(format!("the Word document body is unreadable ({e})")))?;
    if xml.len() as u64 > limit {
        return Err(ExtractError::failure(format!(
            "the Word document body is larger than {} MiB",
            limit / (1024 * 1024)
        )));
    }
    Ok(xml)
}

/// Walks the WordprocessingML body. Paragraph ends become newlines; tabs and
/// breaks are only honoured inside runs (`<w:tabs>` in paragraph properties
/// also contains `<w:tab>` elements).
fn document_xml_to_text(xml: &str) -> Result<String, ExtractError> {
    let mut reader = Reader::from_str(xml);
    let mut text = String::new();
    let mut in_run = false;
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"w:r" => in_run = true,
                b"w:t" => in_text = true,
                _ => {}
            },
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:r" => in_run = false,
                b"w:t" => in_text = false,
                b"w:p" => text.push('\n'),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"w:tab" if in_run => text.push('\t'),
                b"w:br" | b"w:cr" if in_run => text.push('\n'),
                b"w:p" => text.push('\n'),
                _ => {}
            },
            Ok(Event::Text(e)) if in_text => {
                let unescaped = e
                    .unescape()
                    .map_err(|err| ExtractError::failure(format!("malformed Word XML ({err})")))?;
                text.push_str(&unescaped);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ExtractError::failure(format!(
                    "malformed Word XML at byte {} ({e})",
                    reader.buffer_position()
                )))
            }
            _ => {}
        }
    }

    Ok(text)
}

// ────────────────────────────────────────────────────────────────────────────
// Legacy Word binary (.doc)
// ────────────────────────────────────────────────────────────────────────────

const FIB_IDENT: u16 = 0xA5EC;
const FIB_FLAGS_OFFSET: usize = 0x000A;
const FIB_FLAG_ENCRYPTED: u16 = 0x0100;
const FIB_FLAG_WHICH_TABLE: u16 = 0x0200;
const FIB_FC_CLX_OFFSET: usize = 0x01A2;
const FIB_LCB_CLX_OFFSET: usize = 0x01A6;

const CLX_PRC: u8 = 0x01;
const CLX_PCDT: u8 = 0x02;
const PCD_SIZE: usize = 8;
const FC_COMPRESSED: u32 = 0x4000_0000;
const FC_MASK: u32 = 0x3FFF_FFFF;

const FIELD_BEGIN: char = '\u{13}';
const FIELD_SEPARATOR: char = '\u{14}';
const FIELD_END: char = '\u{15}';

/// The fields of the File Information Block this extractor needs.
#[derive(Debug)]
struct Fib {
    encrypted: bool,
    table_stream: &'static str,
    fc_clx: usize,
    lcb_clx: usize,
}

impl Fib {
    fn parse(word_document: &[u8]) -> Result<Self, ExtractError> {
        if read_u16(word_document, 0)? != FIB_IDENT {
            return Err(ExtractError::failure("not a Word 97-2003 document"));
        }
        let flags = read_u16(word_document, FIB_FLAGS_OFFSET)?;
        Ok(Fib {
            encrypted: flags & FIB_FLAG_ENCRYPTED != 0,
            table_stream: if flags & FIB_FLAG_WHICH_TABLE != 0 {
                "/1Table"
            } else {
                "/0Table"
            },
            fc_clx: read_u32(word_document, FIB_FC_CLX_OFFSET)? as usize,
            lcb_clx: read_u32(word_document, FIB_LCB_CLX_OFFSET)? as usize,
        })
    }
}

/// One run of text in the `WordDocument` stream.
#[derive(Debug, PartialEq)]
struct Piece {
    offset: usize,
    char_count: usize,
    compressed: bool,
}

pub fn extract_doc(data: &[u8]) -> Result<String, ExtractError> {
    let mut compound = cfb::CompoundFile::open(Cursor::new(data)).map_err(|e| {
        ExtractError::failure(format!("not a readable Word 97-2003 document ({e})"))
    })?;

    let word_document = read_stream(&mut compound, "/WordDocument")?;
    let fib = Fib::parse(&word_document)?;
    if fib.encrypted {
        return Err(ExtractError::failure("the document is password-protected"));
    }

    let table = read_stream(&mut compound, fib.table_stream)?;
    let clx = fib
        .fc_clx
        .checked_add(fib.lcb_clx)
        .and_then(|end| table.get(fib.fc_clx..end))
        .ok_or_else(|| ExtractError::failure("the document's piece table is out of bounds"))?;

    let mut raw = String::new();
    for piece in parse_clx(clx)? {
        raw.push_str(&decode_piece(&word_document, &piece)?);
    }
    Ok(clean_word_text(&raw))
}

fn read_stream(
    compound: &mut cfb::CompoundFile<Cursor<&[u8]>>,
    path: &str,
) -> Result<Vec<u8>, ExtractError> {
    let mut stream = compound
        .open_stream(path)
        .map_err(|e| ExtractError::failure(format!("missing {path} stream ({e})")))?;
    let mut buf = Vec::new();
    stream
        .read_to_end(&mut buf)
        .map_err(|e| ExtractError::failure(format!("unreadable {path} stream ({e})")))?;
    Ok(buf)
}

/// Skips property modifiers (`Prc`) and parses the piece table (`Pcdt`).
fn parse_clx(clx: &[u8]) -> Result<Vec<Piece>, ExtractError> {
    let mut pos = 0;
    while pos < clx.len() {
        match clx[pos] {
            CLX_PRC => {
                let cb_grpprl = read_u16(clx, pos + 1)? as usize;
                pos += 3 + cb_grpprl;
            }
            CLX_PCDT => {
                let lcb = read_u32(clx, pos + 1)? as usize;
                let plc = clx
                    .get(pos + 5..pos + 5 + lcb)
                    .ok_or_else(|| ExtractError::failure("truncated piece table"))?;
                return parse_plc_pcd(plc);
            }
            other => {
                return Err(ExtractError::failure(format!(
                    "unexpected piece table entry {other:#04x}"
                )))
            }
        }
    }
    Err(ExtractError::failure("the document has no piece table"))
}

/// PlcPcd layout: n+1 character positions (u32) followed by n 8-byte PCDs.
fn parse_plc_pcd(plc: &[u8]) -> Result<Vec<Piece>, ExtractError> {
    if plc.len() < 4 || (plc.len() - 4) % (4 + PCD_SIZE) != 0 {
        return Err(ExtractError::failure("malformed piece table"));
    }
    let count = (plc.len() - 4) / (4 + PCD_SIZE);
    let descriptors = (count + 1) * 4;

    (0..count)
        .map(|i| {
            let cp_start = read_u32(plc, i * 4)?;
            let cp_end = read_u32(plc, (i + 1) * 4)?;
            let fc = read_u32(plc, descriptors + i * PCD_SIZE + 2)?;
            let compressed = fc & FC_COMPRESSED != 0;
            let fc = (fc & FC_MASK) as usize;
            Ok(Piece {
                offset: if compressed { fc / 2 } else { fc },
                char_count: cp_end.saturating_sub(cp_start) as usize,
                compressed,
            })
        })
        .collect()
}

fn decode_piece(word_document: &[u8], piece: &Piece) -> Result<String, ExtractError> {
    let byte_len = if piece.compressed {
        piece.char_count
    } else {
        piece.char_count * 2
    };
    let bytes = word_document
        .get(piece.offset..piece.offset + byte_len)
        .ok_or_else(|| ExtractError::failure("text piece lies outside the document stream"))?;

    if piece.compressed {
        return Ok(bytes.iter().map(|&b| cp1252_char(b)).collect());
    }
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    Ok(String::from_utf16_lossy(&units))
}

/// Maps Word's in-text control characters to plain text. Field instructions
/// (`{ HYPERLINK "..." }`) are dropped, field results are kept.
fn clean_word_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    // One entry per open field: true while still inside its instruction part.
    let mut fields: Vec<bool> = Vec::new();

    for ch in raw.chars() {
        match ch {
            FIELD_BEGIN => {
                fields.push(true);
                continue;
            }
            FIELD_SEPARATOR => {
                if let Some(in_instruction) = fields.last_mut() {
                    *in_instruction = false;
                }
                continue;
            }
            FIELD_END => {
                fields.pop();
                continue;
            }
            _ => {}
        }
        if fields.iter().any(|&in_instruction| in_instruction) {
            continue;
        }
        match ch {
            '\r' | '\u{0B}' | '\u{0C}' => out.push('\n'),
            '\u{07}' => out.push('\t'),
            '\u{1E}' => out.push('-'),
            '\t' | '\n' => out.push(ch),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    out
}

/// Windows-1252 for the 0x80–0x9F block; Latin-1 elsewhere.
fn cp1252_char(byte: u8) -> char {
    const HIGH: [char; 32] = [
        '€', '\u{81}', '‚', 'ƒ', '„', '…', '†', '‡', 'ˆ', '‰', 'Š', '‹', 'Œ', '\u{8D}', 'Ž',
        '\u{8F}', '\u{90}', '‘', '’', '“', '”', '•', '–', '—', '˜', '™', 'š', '›', 'œ', '\u{9D}',
        'ž', 'Ÿ',
    ];
    match byte {
        0x80..=0x9F => HIGH[(byte - 0x80) as usize],
        _ => byte as char,
    }
}

fn read_u16(data: &[u8], offset: usize) -> Result<u16, ExtractError> {
    data.get(offset..offset + 2)
        .map(|b| u16::from_le_bytes([b[0], b[1]]))
        .ok_or_else(|| ExtractError::failure("unexpected end of Word data"))
}

fn read_u32(data: &[u8], offset: usize) -> Result<u32, ExtractError> {
    data.get(offset..offset + 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or_else(|| ExtractError::failure("unexpected end of Word data"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn build_docx(document_xml: &str) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file(DOCUMENT_XML_PATH, zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(document_xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    const TEXT_OFFSET: usize = 0x200;

    /// A minimal Word 97 file: one compressed piece holding `text`.
    fn build_doc(text: &str, flags: u16) -> Vec<u8> {
        let mut word_document = vec![0u8; TEXT_OFFSET];
        word_document[0..2].copy_from_slice(&FIB_IDENT.to_le_bytes());
        word_document[FIB_FLAGS_OFFSET..FIB_FLAGS_OFFSET + 2].copy_from_slice(&flags.to_le_bytes());
        word_document.extend(text.bytes());

        let mut plc = Vec::new();
        plc.extend(0u32.to_le_bytes());
        plc.extend((text.len() as u32).to_le_bytes());
        plc.extend([0u8; 2]);
        plc.extend(((TEXT_OFFSET as u32 * 2) | FC_COMPRESSED).to_le_bytes());
        plc.extend([0u8; 2]);

        let mut clx = vec![CLX_PRC, 0x02, 0x00, 0xAA, 0xBB, CLX_PCDT];
        clx.extend((plc.len() as u32).to_le_bytes());
        clx.extend(plc);

        word_document[FIB_FC_CLX_OFFSET..FIB_FC_CLX_OFFSET + 4].copy_from_slice(&0u32.to_le_bytes());
        word_document[FIB_LCB_CLX_OFFSET..FIB_LCB_CLX_OFFSET + 4]
            .copy_from_slice(&(clx.len() as u32).to_le_bytes());

        let mut compound = cfb::CompoundFile::create(Cursor::new(Vec::new())).unwrap();
        compound
            .create_stream("/WordDocument")
            .unwrap()
            .write_all(&word_document)
            .unwrap();
        compound.create_stream("/1Table").unwrap().write_all(&clx).unwrap();
        compound.flush().unwrap();
        compound.into_inner().into_inner()
    }

    #[test]
    fn test_docx_paragraphs_become_lines() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p><w:pPr><w:tabs><w:tab w:val="left" w:pos="720"/></w:tabs></w:pPr><w:r><w:t>SUMMARY</w:t></w:r></w:p>
    <w:p><w:r><w:t xml:space="preserve">Built </w:t></w:r><w:r><w:t>things &amp; shipped them.</w:t></w:r></w:p>
    <w:p/>
    <w:p><w:r><w:t>SKILLS</w:t></w:r></w:p>
    <w:p><w:r><w:t>Rust</w:t><w:tab/><w:t>SQL</w:t><w:br/><w:t>Go</w:t></w:r></w:p>
  </w:body>
</w:document>"#;
        let text = extract_docx(&build_docx(xml)).unwrap();
        assert_eq!(
            text,
            "SUMMARY\nBuilt things & shipped them.\n\nSKILLS\nRust\tSQL\nGo\n"
        );
    }

    #[test]
    fn test_non_zip_docx_is_extraction_failure() {
        let err = extract_docx(b"\xD0\xCF\x11\xE0 encrypted package").unwrap_err();
        assert!(err.to_string().contains("password-protected"));
    }

    #[test]
    fn test_docx_without_body_is_extraction_failure() {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("docProps/core.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"<cp:coreProperties/>").unwrap();
        let bytes = writer.finish().unwrap().into_inner();
        assert!(matches!(
            extract_docx(&bytes),
            Err(ExtractError::ExtractionFailure(_))
        ));
    }

    #[test]
    fn test_oversized_docx_body_is_rejected() {
        let filler = "<w:p/>".repeat(4096);
        let xml = format!("<w:document><w:body>{filler}</w:body></w:document>");
        let bytes = build_docx(&xml);
        assert!(bytes.len() < xml.len());

        let err = extract_docx_capped(&bytes, 1024).unwrap_err();
        assert!(matches!(err, ExtractError::ExtractionFailure(_)));
        assert!(err.to_string().contains("larger than"));

        assert!(extract_docx_capped(&bytes, xml.len() as u64).is_ok());
    }

    #[test]
    fn test_read_capped_accepts_exact_limit() {
        assert_eq!(read_capped(&b"abcdef"[..], 6).unwrap(), "abcdef");
        assert!(read_capped(&b"abcdefg"[..], 6).is_err());
    }

    #[test]
    fn test_doc_piece_table_text() {
        let bytes = build_doc("SUMMARY\rBuilt things.\r\rEDUCATION\rBS CS, 2020\r", FIB_FLAG_WHICH_TABLE);
        let text = extract_doc(&bytes).unwrap();
        assert_eq!(text, "SUMMARY\nBuilt things.\n\nEDUCATION\nBS CS, 2020\n");
    }

    #[test]
    fn test_encrypted_doc_is_rejected() {
        let bytes = build_doc("secret", FIB_FLAG_WHICH_TABLE | FIB_FLAG_ENCRYPTED);
        let err = extract_doc(&bytes).unwrap_err();
        assert!(err.to_string().contains("password-protected"));
    }

    #[test]
    fn test_doc_missing_table_stream_is_rejected() {
        // The table lives in 1Table, but the flag points at 0Table.
        let bytes = build_doc("text", 0);
        assert!(matches!(
            extract_doc(&bytes),
            Err(ExtractError::ExtractionFailure(_))
        ));
    }

    #[test]
    fn test_non_ole_doc_is_rejected() {
        assert!(matches!(
            extract_doc(b"plain bytes"),
            Err(ExtractError::ExtractionFailure(_))
        ));
    }

    #[test]
    fn test_uncompressed_piece_decodes_utf16() {
        let mut stream = vec![0u8; 4];
        for unit in "Zoë".encode_utf16() {
            stream.extend(unit.to_le_bytes());
        }
        let piece = Piece {
            offset: 4,
            char_count: 3,
            compressed: false,
        };
        assert_eq!(decode_piece(&stream, &piece).unwrap(), "Zoë");
    }

    #[test]
    fn test_clean_word_text_drops_field_instructions() {
        let raw = "See \u{13} HYPERLINK \"https://example.com\" \u{14}my site\u{15}\u{07}next\u{0B}line";
        assert_eq!(clean_word_text(raw), "See my site\tnext\nline");
    }

    #[test]
    fn test_cp1252_high_block() {
        assert_eq!(cp1252_char(0x93), '“');
        assert_eq!(cp1252_char(0x95), '•');
        assert_eq!(cp1252_char(b'A'), 'A');
        assert_eq!(cp1252_char(0xE9), 'é');
    }
}
