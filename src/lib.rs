pub mod logger;
pub mod pyramid_codec;
