mod scan;
mod watch;

pub use scan::*;
pub use watch::*;
