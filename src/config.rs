pub const DEFAULT_EPS: f64 = 1e-8; // minimum roof - ground area difference for an underpass
pub const CLIP_FACTOR: f64 = 1e6; // lowest integer scaling used by the polygon clipper
pub const CLIP_RANGE: f64 = 1e16; // largest scaled coordinate handed to the polygon clipper
pub const DEFAULT_CRS: &str = "EPSG:28992"; // Amersfoort / RD New
