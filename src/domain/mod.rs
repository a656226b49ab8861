pub mod errors;
pub mod frame;
pub mod interface;
pub mod model;
pub mod pose;
pub mod request;
