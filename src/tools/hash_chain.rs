//! Hash chains over the sliding window
//!
//! This is the index the match finder searches.  A 16 bit key derived from
//! 3 window bytes maps to the positions where that key was last seen.  The
//! chains are doubly linked through two flat arrays indexed by window
//! position, with 0 meaning "no link", so any occurrence can be unlinked in
//! O(1) when the sliding window overwrites its slot.  No heap nodes.

use super::window::{Window,WIN_SIZE};

/// hash key over the three bytes starting at `pos`
pub fn hash_key(window: &Window,pos: usize) -> u16 {
    let a = window.get(pos) as u16;
    let b = window.get(pos + 1) as u16;
    let c = window.get(pos + 2) as u16;
    (a << 8) ^ (b << 4) ^ c
}

pub struct DictionaryIndex {
    /// chain head per key, 0 if the key has never been seen
    newest: Vec<u16>,
    /// per position, the next older occurrence of the same key
    older: Vec<u16>,
    /// per position, the next newer occurrence, 0 at the chain head
    newer: Vec<u16>
}

impl DictionaryIndex {
    pub fn create() -> Self {
        Self {
            newest: vec![0;1 << 16],
            older: vec![0;WIN_SIZE],
            newer: vec![0;WIN_SIZE]
        }
    }
    /// most recent position inserted for `key`, 0 if none
    pub fn newest(&self,key: u16) -> usize {
        self.newest[key as usize] as usize
    }
    /// next candidate behind `pos` in its chain, 0 at the end
    pub fn older(&self,pos: usize) -> usize {
        self.older[pos] as usize
    }
    /// push `pos` to the head of `key`'s chain
    pub fn insert(&mut self,key: u16,pos: usize) {
        let old = self.newest[key as usize];
        self.older[pos] = old;
        self.newer[pos] = 0;
        if old != 0 {
            self.newer[old as usize] = pos as u16;
        }
        self.newest[key as usize] = pos as u16;
    }
    /// Unlink `pos` from `key`'s chain, if it is still a member.
    /// A position whose slot was already recycled is left alone.
    pub fn remove(&mut self,key: u16,pos: usize) {
        let up = self.newer[pos];
        let down = self.older[pos];
        if up == 0 {
            if self.newest[key as usize] != pos as u16 {
                return;
            }
            self.newest[key as usize] = down;
        } else {
            self.older[up as usize] = down;
        }
        if down != 0 {
            self.newer[down as usize] = up;
        }
        self.older[pos] = 0;
        self.newer[pos] = 0;
    }
}

#[test]
fn chain_order_and_removal() {
    let mut index = DictionaryIndex::create();
    index.insert(5,10);
    index.insert(5,20);
    index.insert(5,30);
    // newest to oldest
    assert_eq!(index.newest(5),30);
    assert_eq!(index.older(30),20);
    assert_eq!(index.older(20),10);
    assert_eq!(index.older(10),0);
    // unlink from the middle
    index.remove(5,20);
    assert_eq!(index.newest(5),30);
    assert_eq!(index.older(30),10);
    // unlink the head
    index.remove(5,30);
    assert_eq!(index.newest(5),10);
    index.remove(5,10);
    assert_eq!(index.newest(5),0);
}

#[test]
fn stale_removal_is_ignored() {
    let mut index = DictionaryIndex::create();
    index.insert(7,3);
    // never inserted, and already removed
    index.remove(7,9);
    index.remove(7,3);
    index.remove(7,3);
    assert_eq!(index.newest(7),0);
    index.insert(7,4);
    index.remove(7,3);
    assert_eq!(index.newest(7),4);
}

#[test]
fn keys_follow_triples() {
    let mut win = Window::create();
    for (i,c) in b"ABCABCABD".iter().enumerate() {
        win.set(1 + i,*c);
    }
    // equal triples hash alike, nearby different triples do not
    assert_eq!(hash_key(&win,1),hash_key(&win,4));
    assert_ne!(hash_key(&win,1),hash_key(&win,2));
    assert_ne!(hash_key(&win,4),hash_key(&win,7));
}
