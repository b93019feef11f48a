mod arena;
mod cursor;
mod handle;
mod node;
mod raw_bptree;

pub(crate) use cursor::Cursor;
pub(crate) use raw_bptree::RawBPTree;
