// Domain types and value objects
mod fix;
mod geo;
mod location;
mod stay_point;

// Re-export commonly used types to the world
pub use fix::RawFix;
pub use geo::{GeoPoint, centroid, haversine_m, weighted_centroid};
pub use location::{Location, LocationId, VisitStats};
pub use stay_point::StayPoint;
