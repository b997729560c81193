//! LZSS codec for the pack containers
//!
//! Each token starts with a 1 bit flag: a literal byte follows (8 bits), or a
//! back reference into an 8K sliding window (13 bit absolute window position
//! plus 4 bit length code, length = code + 3).  Window position 0 never holds
//! data; a reference to it terminates the stream.  Bits go out MSB first.
//!
//! The stream does not describe its own sizes.  The surrounding container
//! records them, and the caller passes them in.  Match finding runs over hash
//! chains kept in step with the window, so the search only visits positions
//! that share the 3 byte prefix of the lookahead.

use std::io::{Cursor,Read,Write,Seek,BufReader,BufWriter,ErrorKind};
use crate::bits::{BitReader,BitWriter};
use crate::tools::window::Window;
use crate::tools::hash_chain::{hash_key,DictionaryIndex};
use crate::DYNERR;

/// shortest run worth tokenizing
const MIN_MATCH: usize = 3;
/// longest run one token can carry
const MAX_MATCH: usize = 18;

/// Structure to perform the LZSS stage of compression.
/// This maintains two components: a sliding window containing the symbols in
/// the order encountered ("dictionary"), and hash chains pointing at window
/// positions where each 3 byte prefix was last seen ("index").
struct LZSS {
    window: Window,
    index: DictionaryIndex,
    match_pos: usize,
    match_length: usize
}

impl LZSS {
    fn new() -> Self {
        Self {
            window: Window::create(),
            index: DictionaryIndex::create(),
            match_pos: 0,
            match_length: 0
        }
    }
    /// Find the longest prior occurrence of the run starting at `pos`,
    /// considering at most `limit` bytes.  Chains run newest to oldest and
    /// only a strictly longer match displaces the best, so on equal length
    /// the most recently inserted occurrence wins.
    fn find_match(&mut self,pos: usize,limit: usize) {
        self.match_pos = 0;
        self.match_length = 0;
        let key = hash_key(&self.window,pos);
        let mut cand = self.index.newest(key);
        while cand != 0 {
            // cheap rejection before comparing the whole run
            let probe = self.match_length;
            if self.window.get(Window::ahead(cand,probe)) == self.window.get(Window::ahead(pos,probe)) {
                let mut len = 0;
                while len < limit && self.window.get(Window::ahead(cand,len)) == self.window.get(Window::ahead(pos,len)) {
                    len += 1;
                }
                if len > self.match_length {
                    self.match_pos = cand;
                    self.match_length = len;
                    if len >= limit {
                        break;
                    }
                }
            }
            cand = self.index.older(cand);
        }
    }
    /// bring `val` into the window at `frontier`, first unlinking whatever
    /// the slot held a window cycle ago
    fn slide_in(&mut self,frontier: usize,val: u8) {
        self.index.remove(hash_key(&self.window,frontier),frontier);
        self.window.set(frontier,val);
    }
    /// make `pos` findable by later searches
    fn index_head(&mut self,pos: usize) {
        let key = hash_key(&self.window,pos);
        self.index.insert(key,pos);
    }
}

/// Pull the next input byte.  A short read is reported as `None` rather than
/// an error; the caller shortens the logical input to match.
fn next_byte<R: Read>(reader: &mut R) -> Result<Option<u8>,DYNERR> {
    let mut byte: [u8;1] = [0];
    match reader.read_exact(&mut byte) {
        Ok(()) => Ok(Some(byte[0])),
        Err(e) if e.kind()==ErrorKind::UnexpectedEof => Ok(None),
        Err(e) => Err(Box::new(e))
    }
}

/// Main compression function.
/// `expanded_in` is an object with `Read` and `Seek` traits, usually `std::fs::File`, or `std::io::Cursor<&[u8]>`,
/// positioned at the start of the data; `input_size` is the byte count to consume from it.
/// `compressed_out` is an object with the `Write` trait.
/// Returns the compressed size in bytes, or error.
pub fn compress<R,W>(expanded_in: &mut R, input_size: u64, compressed_out: &mut W) -> Result<u64,DYNERR>
where R: Read + Seek, W: Write {
    if input_size == 0 {
        return Err(Box::new(crate::Error::OutOfRange));
    }
    log::debug!("compressing {} bytes from offset {}",input_size,expanded_in.stream_position()?);
    let mut reader = BufReader::new(expanded_in);
    let mut writer = BitWriter::new(BufWriter::new(compressed_out));
    let mut lzss = LZSS::new();
    let mut pos: usize = 1;
    let mut frontier: usize = 1;
    let mut waiting: usize = 0;
    let mut bytes_read: u64 = 0;
    // prime the lookahead, it lives in the window just ahead of the head
    while waiting < MAX_MATCH && bytes_read < input_size {
        match next_byte(&mut reader)? {
            Some(c) => {
                lzss.window.set(frontier,c);
                frontier = Window::advance(frontier);
                waiting += 1;
                bytes_read += 1;
            },
            None => {
                log::warn!("input ended {} bytes early",input_size - bytes_read);
                bytes_read = input_size;
            }
        }
    }
    // main loop, one token per pass
    while waiting > 0 {
        lzss.find_match(pos,waiting.min(MAX_MATCH));
        let emitted = match lzss.match_length < MIN_MATCH {
            true => {
                writer.write(1,1)?;
                writer.write(8,lzss.window.get(pos) as u32)?;
                1
            },
            false => {
                writer.write(1,0)?;
                writer.write(13,lzss.match_pos as u32)?;
                writer.write(4,(lzss.match_length - MIN_MATCH) as u32)?;
                lzss.match_length
            }
        };
        for _i in 0..emitted {
            if bytes_read < input_size {
                match next_byte(&mut reader)? {
                    Some(c) => {
                        lzss.slide_in(frontier,c);
                        frontier = Window::advance(frontier);
                        bytes_read += 1;
                    },
                    None => {
                        log::warn!("input ended {} bytes early",input_size - bytes_read);
                        bytes_read = input_size;
                        waiting -= 1;
                    }
                }
            } else {
                waiting -= 1;
            }
            lzss.index_head(pos);
            pos = Window::advance(pos);
        }
    }
    // end marker, then pad out the last byte
    writer.write(1,0)?;
    writer.write(13,0)?;
    writer.write(4,0)?;
    writer.finish_byte()?;
    writer.flush()?;
    Ok(writer.length())
}

/// Main decompression function.
/// `compressed_in` is an object with `Read` and `Seek` traits, usually `std::fs::File`, or `std::io::Cursor<&[u8]>`,
/// positioned at the start of the token stream.
/// `expanded_out` is an object with the `Write` trait.
/// `output_size` bounds the expansion; an end marker inside the stream wins over it.
/// Returns the number of bytes written, or error.
pub fn expand<R,W>(compressed_in: &mut R, expanded_out: &mut W, output_size: u64) -> Result<u64,DYNERR>
where R: Read + Seek, W: Write {
    if output_size == 0 {
        return Err(Box::new(crate::Error::OutOfRange));
    }
    log::debug!("expanding to {} bytes from offset {}",output_size,compressed_in.stream_position()?);
    let mut reader = BitReader::new(BufReader::new(compressed_in));
    let mut writer = BufWriter::new(expanded_out);
    let mut window = Window::create();
    let mut pos: usize = 1;
    let mut written: u64 = 0;
    while written < output_size {
        if reader.read(1)? == 1 {
            let c = reader.read(8)? as u8;
            writer.write_all(&[c])?;
            window.set(pos,c);
            pos = Window::advance(pos);
            written += 1;
        } else {
            let mut from = reader.read(13)? as usize;
            if from == 0 {
                // end marker wins over the requested size
                break;
            }
            let len = reader.read(4)? as usize + MIN_MATCH;
            // copy one byte at a time so a run overlapping the head replays itself
            for _i in 0..len {
                let c = window.get(from);
                from = Window::advance(from);
                writer.write_all(&[c])?;
                window.set(pos,c);
                pos = Window::advance(pos);
                written += 1;
            }
        }
    }
    writer.flush()?;
    Ok(written)
}

/// Convenience function, calls `compress` with a slice returning a Vec
pub fn compress_slice(slice: &[u8]) -> Result<Vec<u8>,DYNERR> {
    let mut src = Cursor::new(slice);
    let mut ans: Cursor<Vec<u8>> = Cursor::new(Vec::new());
    compress(&mut src,slice.len() as u64,&mut ans)?;
    Ok(ans.into_inner())
}

/// Convenience function, calls `expand` with a slice returning a Vec
pub fn expand_slice(slice: &[u8],output_size: u64) -> Result<Vec<u8>,DYNERR> {
    let mut src = Cursor::new(slice);
    let mut ans: Cursor<Vec<u8>> = Cursor::new(Vec::new());
    expand(&mut src,&mut ans,output_size)?;
    Ok(ans.into_inner())
}

#[cfg(test)]
fn push_bits(bits: &mut bit_vec::BitVec,num_bits: u32,val: u32) {
    for i in (0..num_bits).rev() {
        bits.push((val >> i) & 1 == 1);
    }
}

#[test]
fn literal_path() {
    // three literals, then the end marker, zero padded
    let compressed = compress_slice(b"ABC").expect("compression failed");
    assert_eq!(compressed,hex::decode("a0d0a8600000").unwrap());
    let expanded = expand_slice(&compressed,3).expect("expansion failed");
    assert_eq!(expanded,b"ABC".to_vec());
}

#[test]
fn match_path() {
    // second half of ABCABC comes out as one reference to window position 1
    let compressed = compress_slice(b"ABCABC").expect("compression failed");
    assert_eq!(compressed,hex::decode("a0d0a86000800000").unwrap());
    let expanded = expand_slice(&compressed,6).expect("expansion failed");
    assert_eq!(expanded,b"ABCABC".to_vec());
}

#[test]
fn hand_built_tokens() {
    use bit_vec::BitVec;
    let mut bits = BitVec::new();
    for c in b"ABC" {
        push_bits(&mut bits,1,1);
        push_bits(&mut bits,8,*c as u32);
    }
    // reference to the literal run, then the end marker
    push_bits(&mut bits,1,0);
    push_bits(&mut bits,13,1);
    push_bits(&mut bits,4,0);
    push_bits(&mut bits,1,0);
    push_bits(&mut bits,13,0);
    push_bits(&mut bits,4,0);
    let stream = bits.to_bytes();
    let expanded = expand_slice(&stream,6).expect("expansion failed");
    assert_eq!(expanded,b"ABCABC".to_vec());
    // the size bound is only checked between tokens, the reference lands whole
    let expanded = expand_slice(&stream,4).expect("expansion failed");
    assert_eq!(expanded,b"ABCABC".to_vec());
}

#[test]
fn end_marker_precedence() {
    let mut stream = compress_slice(b"ABC").expect("compression failed");
    stream.push(0xff);
    stream.push(0xff);
    let mut src = Cursor::new(&stream);
    let mut ans: Cursor<Vec<u8>> = Cursor::new(Vec::new());
    let count = expand(&mut src,&mut ans,100).expect("expansion failed");
    assert_eq!(count,3);
    assert_eq!(ans.into_inner(),b"ABC".to_vec());
}

#[test]
fn match_length_boundaries() {
    // shortest reference: 4 literals then a 3 byte match, 72 bits even
    let data = b"XYZ-XYZ";
    let compressed = compress_slice(data).expect("compression failed");
    assert_eq!(compressed.len(),9);
    assert_eq!(expand_slice(&compressed,7).expect("expansion failed"),data.to_vec());
    // longest reference: 18 distinct bytes repeated once, 18 literals + 1 match
    let unit: Vec<u8> = (b'A'..b'A'+18).collect();
    let data = [unit.clone(),unit.clone()].concat();
    let compressed = compress_slice(&data).expect("compression failed");
    assert_eq!(compressed.len(),25);
    assert_eq!(expand_slice(&compressed,36).expect("expansion failed"),data);
    // a 19 byte repeat splits into an 18 byte match plus a literal
    let unit: Vec<u8> = (b'A'..b'A'+19).collect();
    let data = [unit.clone(),unit.clone()].concat();
    let compressed = compress_slice(&data).expect("compression failed");
    assert_eq!(compressed.len(),27);
    assert_eq!(expand_slice(&compressed,38).expect("expansion failed"),data);
}

#[test]
fn overlapping_runs() {
    // a long run references itself while the head advances into the copy
    let data = vec![b'A';40];
    let compressed = compress_slice(&data).expect("compression failed");
    assert!(compressed.len() < data.len());
    let expanded = expand_slice(&compressed,40).expect("expansion failed");
    assert_eq!(expanded,data);
}

#[test]
fn invertibility() {
    let test_data = "I am Sam. Sam I am. I do not like this Sam I am.\n".as_bytes();
    let compressed = compress_slice(test_data).expect("compression failed");
    let expanded = expand_slice(&compressed,test_data.len() as u64).expect("expansion failed");
    assert_eq!(test_data.to_vec(),expanded);
    // same input, same bytes
    let again = compress_slice(test_data).expect("compression failed");
    assert_eq!(compressed,again);
}

#[test]
fn window_wraparound() {
    // long enough that references cross the wrap from 8191 back to 1
    let text = "I am Sam. Sam I am. I do not like this Sam I am.\n".as_bytes();
    let mut data = Vec::new();
    while data.len() < 20000 {
        data.extend_from_slice(text);
    }
    let compressed = compress_slice(&data).expect("compression failed");
    assert!(compressed.len() < data.len());
    let expanded = expand_slice(&compressed,data.len() as u64).expect("expansion failed");
    assert_eq!(expanded,data);
    // low redundancy variant, mostly literals across several window cycles
    let data: Vec<u8> = (0..12000usize).map(|i| ((i * 131) % 251) as u8 ^ (i / 509) as u8).collect();
    let compressed = compress_slice(&data).expect("compression failed");
    let expanded = expand_slice(&compressed,data.len() as u64).expect("expansion failed");
    assert_eq!(expanded,data);
}

#[test]
fn degenerate_sizes() {
    assert!(compress_slice(&[]).is_err());
    assert!(expand_slice(&[0x00,0x00,0x00],0).is_err());
}

#[test]
fn truncated_input_shrinks() {
    // the caller's size overstates the channel, the logical input shrinks
    let mut src = Cursor::new(b"ABCDE".to_vec());
    let mut ans: Cursor<Vec<u8>> = Cursor::new(Vec::new());
    let out_size = compress(&mut src,10,&mut ans).expect("compression failed");
    assert!(out_size > 0);
    let compressed = ans.into_inner();
    let mut src = Cursor::new(&compressed);
    let mut ans: Cursor<Vec<u8>> = Cursor::new(Vec::new());
    let count = expand(&mut src,&mut ans,10).expect("expansion failed");
    assert_eq!(count,5);
    assert_eq!(ans.into_inner(),b"ABCDE".to_vec());
}
