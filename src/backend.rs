#[derive(Debug)]
pub enum FindError {
    NotFound,
}

#[derive(Debug)]
pub enum CreateError {
    Exists,
}

mod backend_mem;
pub use backend_mem::*;
