pub mod photo;
pub mod storage_object;

pub use photo::{GpsFix, NewPhotoRecord, PhotoRecord};
pub use storage_object::StorageObject;
