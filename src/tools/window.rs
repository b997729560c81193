//! Sliding window for the LZSS dictionary
//!
//! Position 0 is reserved: the hash chains use it to mean "no link" and the
//! token stream uses it as the end marker, so stream data only ever occupies
//! positions 1 through 8191.  Stepping forward wraps past the last position
//! to 1, never to 0.

pub const WIN_SIZE: usize = 8192;

pub struct Window {
    buf: Vec<u8>
}

impl Window {
    pub fn create() -> Self {
        Self {
            buf: vec![0;WIN_SIZE]
        }
    }
    /// value at absolute position, addressed modulo the window size
    pub fn get(&self,pos: usize) -> u8 {
        self.buf[pos % WIN_SIZE]
    }
    /// set value at absolute position, addressed modulo the window size
    pub fn set(&mut self,pos: usize,val: u8) {
        self.buf[pos % WIN_SIZE] = val;
    }
    /// next position, wrapping past the end to 1
    pub fn advance(pos: usize) -> usize {
        match pos + 1 < WIN_SIZE {
            true => pos + 1,
            false => 1
        }
    }
    /// position `count` steps ahead of `pos`, skipping the reserved slot
    pub fn ahead(pos: usize,count: usize) -> usize {
        let q = pos + count;
        match q < WIN_SIZE {
            true => q,
            false => (q - 1) % (WIN_SIZE - 1) + 1
        }
    }
}

#[test]
fn stepping() {
    assert_eq!(Window::advance(1),2);
    assert_eq!(Window::advance(8190),8191);
    assert_eq!(Window::advance(8191),1);
    assert_eq!(Window::ahead(5,0),5);
    assert_eq!(Window::ahead(8190,3),2);
    assert_eq!(Window::ahead(1,8191),1);
}

#[test]
fn addressing() {
    let mut win = Window::create();
    win.set(8191,0x5a);
    assert_eq!(win.get(8191),0x5a);
    assert_eq!(win.get(8191 + WIN_SIZE),0x5a);
}
