pub mod error;
pub mod consts;
pub mod frame;
pub mod io;
pub mod background;
pub mod binarize;
pub mod measure;
pub mod fit;
pub mod discovery;
pub mod batch;
