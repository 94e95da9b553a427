pub mod alpr_engine;
pub mod alpr_payload;
pub mod alpr_plate_detector;
pub mod subprocess_engine;
