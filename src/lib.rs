pub mod boundary;
pub mod citymodel;
pub mod config;
pub mod detection;
pub mod error;
pub mod merge;
pub mod output;
pub mod polygon;
pub mod settings;
pub mod surfaces;
pub mod underpass;
pub mod vertices;
pub mod wkt;
