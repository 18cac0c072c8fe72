mod issue;
mod project;
mod resolution;

pub use issue::*;
pub use project::*;
pub use resolution::*;
