//! Corpus access: restartable example streams and fold rotation

mod fold;
mod stream;

pub use fold::{FoldSplitter, SplitPolicy};
pub use stream::{Example, TokenStream};
