mod source_image;
mod upload;

pub use source_image::SourceImage;
pub use upload::Upload;
