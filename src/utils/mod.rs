pub mod time;

pub(crate) mod panic;
