/*
 * @file size.rs
 * @author The blocked_lu authors
 * @copyright 2026 The blocked_lu authors
 *
 * Length of an encoded object, without allocating the encoding.
 */

use bincode::{Encode,config::Config,enc::EncoderImpl,error::EncodeError,enc::write::Writer};

/** A writer that throws the bytes away and only counts them */
struct ByteCounter {
    count: usize
}

impl Writer for ByteCounter {
    fn write(&mut self, bytes: &[u8]) -> Result<(), EncodeError> {
        self.count += bytes.len();
        Ok(())
    }
}

/** Return the number of bytes `obj` encodes to under `config`. */
pub fn encoded_len<T:Encode,C:Config>(obj:&T, config:C) -> Result<usize, EncodeError> {
    let mut encoder = EncoderImpl::new(ByteCounter { count: 0 }, config);
    obj.encode(&mut encoder)?;
    Ok(encoder.into_writer().count)
}
