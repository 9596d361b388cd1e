pub mod crop;
pub mod image_io;
pub mod sequence;
pub mod table;
