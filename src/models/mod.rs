pub mod loaders;
pub mod page;
pub mod resume;
pub mod work_item;

pub use loaders::{attach_similarities, load_distances, load_page_images, load_resumes, load_text_file};
pub use page::{skip_preceding_pages, PageImage};
pub use resume::{similarity_from_distance, RankedResume, ResumeAssessment, ResumeCandidate};
pub use work_item::{Batch, BatchOutcomes, ItemId, ItemState, Outcome, OutcomeRecord, WorkItem};
