//! Rule categories, one module per area. Each `check` reads the model
//! through the shared [`DetectPass`](crate::DetectPass) and records its
//! findings independently of the other categories.

pub(crate) mod fasteners;
pub(crate) mod geometric;
pub(crate) mod logic;
pub(crate) mod members;
pub(crate) mod plates;
