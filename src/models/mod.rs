pub mod issue;
pub mod company;
pub mod story;
pub mod category;
pub mod statistics;
pub mod support;

pub use issue::*;
pub use company::*;
pub use story::*;
pub use category::*;
pub use statistics::*;
pub use support::*;
