mod compress;
mod tile_path;

pub use compress::*;
pub use tile_path::*;
