pub mod canvas;
pub mod color;
pub mod grid_layout;
pub mod sinks;
pub mod smoothing;

pub mod utils {
    pub mod image_helper;
    #[cfg(feature = "opencv")]
    pub mod opencv_bridge;
    pub mod path_encoding;
}
