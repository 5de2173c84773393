pub mod mutation_gateway;
pub mod sync_controller;
