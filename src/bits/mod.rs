pub use self::{reader::BitBarrel, writer::BitBarrelWriter};

mod reader;
mod writer;
