mod arena;
mod iter;
mod node;
#[cfg(test)]
mod test;
mod tree;

pub use arena::Handle;
pub use iter::Cursor;
pub use node::Branch;
pub use tree::Tree;
