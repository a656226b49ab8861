pub mod dto;
pub mod model_cache;
pub mod ports;
pub mod services;
