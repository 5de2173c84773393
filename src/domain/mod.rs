pub mod extended_time;
pub mod models;
pub mod time_zone;
pub mod view_model;
