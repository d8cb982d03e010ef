pub mod declaration;

pub use declaration::{Binds, Declaration};
