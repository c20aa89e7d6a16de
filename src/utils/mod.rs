//! Various utilities functions and types

mod arena;
pub mod easing;
mod geometry;

pub use self::arena::{Arena, Handle};
pub use self::geometry::{Coordinate, Global, Local, Point, Rectangle, Size};
