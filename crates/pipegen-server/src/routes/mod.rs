pub mod meta;
pub mod sessions;
