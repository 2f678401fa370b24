pub mod extracted_info;
pub mod page;
pub mod replies;

pub use extracted_info::ExtractedInfo;
pub use page::{PageRef, UpdateMarker};
pub use replies::{
    FinalizeForm, FolderListing, GenerateFolderAck, MoveDirection, OcrOutcome, OcrTarget,
    RotateDirection, UploadAck,
};
