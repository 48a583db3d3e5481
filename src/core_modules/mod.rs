pub mod coordinate_mapper;
pub mod detection;
pub mod detection_merger;
pub mod exemplar;
pub mod grid_planner;
pub mod response_parser;
pub mod retry;
pub mod schedule;
pub mod tile_dispatcher;
