pub mod alert_engine;
pub mod detection_filter;
pub mod face_detector;
pub mod stability_evaluator;
