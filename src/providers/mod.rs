pub mod util;
pub mod vatcomply;
