pub mod apng;
pub mod assemble;
pub mod gif;
