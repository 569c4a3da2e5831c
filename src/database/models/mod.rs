pub mod consultation;
pub mod property;

pub use consultation::Consultation;
pub use property::{Property, PropertyDraft, RecordId};
