//! Planar geometry over WGS84 coordinates.
//!
//! Provides the shapes features are made of ([`Location`], [`PolyLine`],
//! [`Polygon`]) and the rectangles shards are bounded by ([`Rectangle`],
//! [`MultiRectangle`]). Spatial predicates treat latitude/longitude as a
//! plane; distances use the haversine formula.

mod location;
mod rectangle;
mod segment;
mod shapes;
mod union;

pub use location::{Location, EARTH_RADIUS_METERS};
pub use rectangle::Rectangle;
pub use shapes::{PolyLine, Polygon};
pub use union::MultiRectangle;
