use crate::{
    error::{Error, Result},
    flags::FlagRecord,
};
use byteordered::byteorder::{ReadBytesExt, WriteBytesExt, BE};
use std::io::{self, Cursor, Write};
use tracing::{debug, instrument};

pub const TABLE_TERMINATOR: u8 = 0xff;
pub const WORD_TERMINATOR: u16 = 0xffff;

/// Decodes consecutive fixed-width records. A record boundary whose next byte
/// is `0xFF` ends the table, as does the end of the data.
#[instrument(level = "debug", skip(bytes), fields(len = bytes.len(), kind = T::KIND))]
pub fn decode_table<T: FlagRecord>(bytes: &[u8]) -> Result<Vec<T>> {
    let mut records = Vec::with_capacity(bytes.len() / T::SIZE);
    let mut offset = 0;
    while offset < bytes.len() && bytes[offset] != TABLE_TERMINATOR {
        let rest = &bytes[offset..];
        if rest.len() < T::SIZE {
            return Err(Error::TruncatedTable {
                offset,
                trailing: rest.len(),
                record_size: T::SIZE,
            });
        }
        records.push(T::from_bytes(&rest[..T::SIZE])?);
        offset += T::SIZE;
    }
    debug!("{} records", records.len());
    Ok(records)
}

/// Appends the table terminator to already encoded records, padding to an
/// even length.
pub fn encode_table(body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(body.len() + 2);
    out.extend_from_slice(body);
    out.push(TABLE_TERMINATOR);
    if out.len() % 2 == 1 {
        out.push(TABLE_TERMINATOR);
    }
    out
}

pub fn encode_records<T: FlagRecord>(records: &[T]) -> Vec<u8> {
    let mut body = Vec::with_capacity(records.len() * T::SIZE);
    for record in records {
        body.extend(record.to_bytes());
    }
    encode_table(&body)
}

/// Splits big-endian data into 16-bit words.
pub fn read_words(bytes: &[u8]) -> Result<Vec<u16>> {
    if bytes.len() % 2 != 0 {
        return Err(Error::TruncatedTable {
            offset: bytes.len() - 1,
            trailing: 1,
            record_size: 2,
        });
    }
    let mut words = vec![0; bytes.len() / 2];
    Cursor::new(bytes).read_u16_into::<BE>(&mut words)?;
    Ok(words)
}

pub fn write_words(out: &mut impl Write, words: &[u16]) -> io::Result<()> {
    for &word in words {
        out.write_u16::<BE>(word)?;
    }
    Ok(())
}
