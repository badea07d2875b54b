pub mod delivery;
pub mod health_service;
pub mod relay_service;
pub mod segmenter;
pub mod sender;
