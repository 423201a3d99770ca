pub mod normalize;
pub mod page;

pub use page::{PageExtract, PageParser};
