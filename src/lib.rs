pub mod annotate;
pub mod capture;
pub mod geometry_utils;
pub mod pose;
pub mod session;
pub mod session_config;
pub mod settings;
pub mod systems;
pub mod tracking;
