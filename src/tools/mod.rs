pub mod window;
pub mod hash_chain;
