//! Minimal TrueType binaries built in memory for tests
//!
//! Produces `cmap`, `head`, `hhea`, `maxp` and `name` tables: just enough for
//! a structural parser to accept the font and report names, a glyph count,
//! and a character map.

const PLATFORM_WINDOWS: u16 = 3;
const ENCODING_UNICODE_BMP: u16 = 1;
const LANGUAGE_EN_US: u16 = 0x0409;
const LANGUAGE_FR_FR: u16 = 0x040C;

pub struct TestFont {
    names: Vec<(u16, u16, String)>,
    chars: Vec<char>,
}

impl TestFont {
    pub fn new(family: &str) -> Self {
        let font = Self {
            names: Vec::new(),
            chars: vec!['A', 'B'],
        };
        font.name(1, family)
            .name(2, "Regular")
            .name(4, &format!("{family} Regular"))
            .name(6, &format!("{}-Regular", family.replace(' ', "")))
    }

    /// Add an en-US name record
    pub fn name(mut self, name_id: u16, value: &str) -> Self {
        self.names.push((name_id, LANGUAGE_EN_US, value.to_string()));
        self
    }

    /// Add a French name record, which must lose to the English one
    pub fn french_name(mut self, name_id: u16, value: &str) -> Self {
        self.names.push((name_id, LANGUAGE_FR_FR, value.to_string()));
        self
    }

    pub fn chars(mut self, chars: &[char]) -> Self {
        self.chars = chars.to_vec();
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut chars: Vec<u16> = self.chars.iter().map(|c| *c as u32 as u16).collect();
        chars.sort_unstable();
        chars.dedup();
        let glyph_count = chars.len() as u16 + 1;

        let tables: Vec<([u8; 4], Vec<u8>)> = vec![
            (*b"cmap", cmap(&chars)),
            (*b"head", head()),
            (*b"hhea", hhea()),
            (*b"maxp", maxp(glyph_count)),
            (*b"name", name_table(&self.names)),
        ];
        sfnt(tables)
    }
}

/// "Test Sans" with glyphs for `A` and `B`
pub fn minimal_ttf() -> Vec<u8> {
    TestFont::new("Test Sans").build()
}

/// Wrap an sfnt built by [`TestFont`] in a WOFF 1.0 container. With
/// `compress`, each table is deflated when that makes it smaller.
pub fn woff_from_sfnt(sfnt: &[u8], compress: bool) -> Vec<u8> {
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use std::io::Write;

    let read_u32 = |at: usize| u32::from_be_bytes([sfnt[at], sfnt[at + 1], sfnt[at + 2], sfnt[at + 3]]);
    let num_tables = u16::from_be_bytes([sfnt[4], sfnt[5]]) as usize;

    let mut entries = Vec::new();
    for i in 0..num_tables {
        let record = 12 + 16 * i;
        let tag = read_u32(record);
        let checksum = read_u32(record + 4);
        let offset = read_u32(record + 8) as usize;
        let length = read_u32(record + 12) as usize;
        let table = &sfnt[offset..offset + length];
        let mut stored = table.to_vec();
        if compress {
            let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(table).unwrap();
            let deflated = encoder.finish().unwrap();
            if deflated.len() < table.len() {
                stored = deflated;
            }
        }
        entries.push((tag, checksum, length as u32, stored));
    }

    let mut directory = Vec::new();
    let mut body = Vec::new();
    let data_start = 44 + 20 * num_tables;
    for (tag, checksum, orig_length, stored) in &entries {
        push_u32(&mut directory, *tag);
        push_u32(&mut directory, (data_start + body.len()) as u32);
        push_u32(&mut directory, stored.len() as u32);
        push_u32(&mut directory, *orig_length);
        push_u32(&mut directory, *checksum);
        body.extend_from_slice(stored);
        while body.len() % 4 != 0 {
            body.push(0);
        }
    }

    let mut out = Vec::new();
    out.extend_from_slice(b"wOFF");
    out.extend_from_slice(&sfnt[0..4]); // flavor
    push_u32(&mut out, (data_start + body.len()) as u32);
    push_u16(&mut out, num_tables as u16);
    push_u16(&mut out, 0); // reserved
    push_u32(&mut out, sfnt.len() as u32);
    push_u16(&mut out, 1); // majorVersion
    push_u16(&mut out, 0); // minorVersion
    out.extend_from_slice(&[0; 20]); // no metadata or private block
    out.extend_from_slice(&directory);
    out.extend_from_slice(&body);
    out
}

fn sfnt(tables: Vec<([u8; 4], Vec<u8>)>) -> Vec<u8> {
    let num_tables = tables.len() as u16;
    let mut out = Vec::new();
    push_u32(&mut out, 0x0001_0000);
    push_u16(&mut out, num_tables);
    push_u16(&mut out, 64);
    push_u16(&mut out, 2);
    push_u16(&mut out, num_tables * 16 - 64);

    let mut offset = 12 + 16 * tables.len() as u32;
    let mut body = Vec::new();
    for (tag, data) in &tables {
        out.extend_from_slice(tag);
        push_u32(&mut out, 0);
        push_u32(&mut out, offset);
        push_u32(&mut out, data.len() as u32);
        body.extend_from_slice(data);
        while body.len() % 4 != 0 {
            body.push(0);
        }
        offset = 12 + 16 * tables.len() as u32 + body.len() as u32;
    }
    out.extend_from_slice(&body);
    out
}

fn head() -> Vec<u8> {
    let mut t = Vec::new();
    push_u32(&mut t, 0x0001_0000); // version
    push_u32(&mut t, 0x0001_0000); // fontRevision
    push_u32(&mut t, 0); // checkSumAdjustment
    push_u32(&mut t, 0x5F0F_3CF5); // magicNumber
    push_u16(&mut t, 0); // flags
    push_u16(&mut t, 1000); // unitsPerEm
    t.extend_from_slice(&[0; 16]); // created, modified
    t.extend_from_slice(&[0; 8]); // bounding box
    push_u16(&mut t, 0); // macStyle
    push_u16(&mut t, 8); // lowestRecPPEM
    push_u16(&mut t, 2); // fontDirectionHint
    push_u16(&mut t, 0); // indexToLocFormat
    push_u16(&mut t, 0); // glyphDataFormat
    t
}

fn hhea() -> Vec<u8> {
    let mut t = Vec::new();
    push_u32(&mut t, 0x0001_0000);
    push_u16(&mut t, 800); // ascender
    push_u16(&mut t, (-200i16) as u16); // descender
    push_u16(&mut t, 0); // lineGap
    t.extend_from_slice(&[0; 24]);
    push_u16(&mut t, 0); // numberOfHMetrics
    t
}

fn maxp(glyph_count: u16) -> Vec<u8> {
    let mut t = Vec::new();
    push_u32(&mut t, 0x0000_5000);
    push_u16(&mut t, glyph_count);
    t
}

fn name_table(names: &[(u16, u16, String)]) -> Vec<u8> {
    let mut records = Vec::new();
    let mut storage = Vec::new();
    for (name_id, language_id, value) in names {
        let encoded: Vec<u8> = value.encode_utf16().flat_map(|u| u.to_be_bytes()).collect();
        push_u16(&mut records, PLATFORM_WINDOWS);
        push_u16(&mut records, ENCODING_UNICODE_BMP);
        push_u16(&mut records, *language_id);
        push_u16(&mut records, *name_id);
        push_u16(&mut records, encoded.len() as u16);
        push_u16(&mut records, storage.len() as u16);
        storage.extend_from_slice(&encoded);
    }

    let mut t = Vec::new();
    push_u16(&mut t, 0);
    push_u16(&mut t, names.len() as u16);
    push_u16(&mut t, 6 + 12 * names.len() as u16);
    t.extend_from_slice(&records);
    t.extend_from_slice(&storage);
    t
}

fn cmap(chars: &[u16]) -> Vec<u8> {
    // one segment per code point, then the mandatory 0xFFFF terminator
    let seg_count = chars.len() as u16 + 1;
    let mut ends = Vec::new();
    let mut starts = Vec::new();
    let mut deltas = Vec::new();
    for (index, c) in chars.iter().enumerate() {
        let glyph = index as u16 + 1;
        ends.push(*c);
        starts.push(*c);
        deltas.push(glyph.wrapping_sub(*c));
    }
    ends.push(0xFFFF);
    starts.push(0xFFFF);
    deltas.push(1);

    let mut sub = Vec::new();
    push_u16(&mut sub, 4);
    push_u16(&mut sub, 16 + 8 * seg_count);
    push_u16(&mut sub, 0);
    push_u16(&mut sub, seg_count * 2);
    push_u16(&mut sub, 2);
    push_u16(&mut sub, 0);
    push_u16(&mut sub, 0);
    ends.iter().for_each(|v| push_u16(&mut sub, *v));
    push_u16(&mut sub, 0);
    starts.iter().for_each(|v| push_u16(&mut sub, *v));
    deltas.iter().for_each(|v| push_u16(&mut sub, *v));
    (0..seg_count).for_each(|_| push_u16(&mut sub, 0));

    let mut t = Vec::new();
    push_u16(&mut t, 0);
    push_u16(&mut t, 1);
    push_u16(&mut t, PLATFORM_WINDOWS);
    push_u16(&mut t, ENCODING_UNICODE_BMP);
    push_u32(&mut t, 12);
    t.extend_from_slice(&sub);
    t
}

fn push_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_be_bytes());
}

fn push_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_be_bytes());
}
