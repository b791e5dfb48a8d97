pub mod fast_map;
