mod iterator;
mod skip_list;

pub mod error;
pub mod options;

#[cfg(test)]
mod test_utils;

pub use iterator::SkipListIter;
pub use lazyskip_node as node;
pub use skip_list::SkipList;
