pub mod evaluation_service;
pub mod export_service;
pub mod fallback;
pub mod generator_service;
pub mod scoring;
pub mod session_service;
pub mod timing;
