pub mod page_loader;
pub mod resume_loader;

pub use page_loader::load_page_images;
pub use resume_loader::{attach_similarities, load_distances, load_resumes, load_text_file};
