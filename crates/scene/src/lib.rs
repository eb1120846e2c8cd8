pub mod picking;
pub mod properties;
pub mod tileset;
pub mod view;
pub mod viewer;

pub use picking::*;
pub use properties::*;
pub use tileset::*;
pub use view::*;
pub use viewer::*;
