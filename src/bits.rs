//! Bit level access to byte streams
//!
//! Tokens in the pack format are not byte aligned, so the codec goes through
//! these wrappers.  Bits travel MSB first within each byte.  Both wrappers
//! count the bytes moved through the underlying stream, which is how the
//! compressor learns the size of what it wrote.

use std::io::{Read,Write,ErrorKind};

/// Accumulates bits and flushes whole bytes to the underlying writer.
pub struct BitWriter<W> {
    inner: W,
    acc: u32,
    held: u32,
    length: u64
}

/// Pulls bytes from the underlying reader and serves them out as bits.
pub struct BitReader<R> {
    inner: R,
    acc: u32,
    held: u32,
    length: u64
}

impl <W: Write> BitWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            acc: 0,
            held: 0,
            length: 0
        }
    }
    /// queue a single bit, flushing a byte once 8 are held
    pub fn write_bit(&mut self,bit: u32) -> Result<(),std::io::Error> {
        self.acc = (self.acc << 1) | (bit & 1);
        self.held += 1;
        if self.held == 8 {
            self.inner.write_all(&[self.acc as u8])?;
            self.acc = 0;
            self.held = 0;
            self.length += 1;
        }
        Ok(())
    }
    /// write the low `bits` bits of `data`, most significant first, `bits` is clamped to 32
    pub fn write(&mut self,bits: u32,data: u32) -> Result<(),std::io::Error> {
        let bits = bits.min(32);
        for i in (0..bits).rev() {
            self.write_bit((data >> i) & 1)?;
        }
        Ok(())
    }
    /// pad with zero bits until the stream is back on a byte boundary
    pub fn finish_byte(&mut self) -> Result<(),std::io::Error> {
        while self.held != 0 {
            self.write_bit(0)?;
        }
        Ok(())
    }
    pub fn flush(&mut self) -> Result<(),std::io::Error> {
        self.inner.flush()
    }
    /// bytes flushed to the underlying writer so far
    pub fn length(&self) -> u64 {
        self.length
    }
}

impl <R: Read> BitReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            acc: 0,
            held: 0,
            length: 0
        }
    }
    /// Read the next `bits` bits, MSB first, spanning byte boundaries as needed.
    /// `bits` is clamped to 32.  Reading past the end of the underlying stream
    /// yields zero bits without advancing `length`, as the old decoders did;
    /// a well formed token stream never gets there.
    pub fn read(&mut self,bits: u32) -> Result<u32,std::io::Error> {
        let bits = bits.min(32);
        if bits > 25 {
            // accumulator cannot take a 24 bit residue plus a refill byte
            let rest = bits - 24;
            let high = self.read(24)?;
            let low = self.read(rest)?;
            return Ok((high << rest) | low);
        }
        while self.held < bits {
            let mut byte: [u8;1] = [0];
            match self.inner.read_exact(&mut byte) {
                Ok(()) => {
                    self.length += 1;
                },
                Err(e) if e.kind()==ErrorKind::UnexpectedEof => {
                    byte[0] = 0;
                },
                Err(e) => {
                    return Err(e);
                }
            }
            self.acc = (self.acc << 8) | byte[0] as u32;
            self.held += 8;
        }
        self.held -= bits;
        Ok((self.acc >> self.held) & ((1u32 << bits) - 1))
    }
    /// bytes fetched from the underlying reader so far
    pub fn length(&self) -> u64 {
        self.length
    }
}

#[test]
fn bit_exactness() {
    use std::io::Cursor;
    // widths 1..=32 sum to 528 bits, an exact byte count
    let vals: Vec<(u32,u32)> = (1..=32).map(|w| {
        let msk = match w {
            32 => u32::MAX,
            _ => (1u32 << w) - 1
        };
        (w, 0xDEADBEEFu32 & msk)
    }).collect();
    let mut cur: Cursor<Vec<u8>> = Cursor::new(Vec::new());
    let mut writer = BitWriter::new(&mut cur);
    for (w,v) in &vals {
        writer.write(*w,*v).expect("write failed");
    }
    writer.finish_byte().expect("pad failed");
    assert_eq!(writer.length(),66);
    cur.set_position(0);
    let mut reader = BitReader::new(&mut cur);
    for (w,v) in &vals {
        assert_eq!(reader.read(*w).expect("read failed"),*v);
    }
    assert_eq!(reader.length(),66);
}

#[test]
fn byte_padding() {
    use std::io::Cursor;
    let mut cur: Cursor<Vec<u8>> = Cursor::new(Vec::new());
    let mut writer = BitWriter::new(&mut cur);
    writer.write_bit(1).expect("write failed");
    writer.write_bit(0).expect("write failed");
    writer.write_bit(1).expect("write failed");
    assert_eq!(writer.length(),0);
    writer.finish_byte().expect("pad failed");
    assert_eq!(writer.length(),1);
    assert_eq!(cur.into_inner(),vec![0xa0]);
}

#[test]
fn zero_fill_past_end() {
    use std::io::Cursor;
    let mut cur = Cursor::new(vec![0xff]);
    let mut reader = BitReader::new(&mut cur);
    assert_eq!(reader.read(4).expect("read failed"),0xf);
    assert_eq!(reader.read(8).expect("read failed"),0xf0);
    assert_eq!(reader.length(),1);
}
