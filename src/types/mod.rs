mod declaration;

pub use declaration::*;
