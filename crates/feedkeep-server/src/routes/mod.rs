pub mod feeds;
pub mod media;
