// Image comparison pipeline: resize -> preprocess (gray, blur, mask) -> compare

pub mod compare;
pub mod mask;
pub mod preprocess;
pub mod resize;

pub use compare::{Comparison, CompareError, Contour, compare_frames};
pub use mask::{BorderSpec, MaskError, mask_borders, mask_borders_mut};
pub use preprocess::{Frame, PreprocessError, PreprocessSettings, preprocess};
pub use resize::resize_area;
