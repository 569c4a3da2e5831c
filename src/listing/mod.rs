//! Listing rules shared by the property handlers: the category set, field
//! normalization and image URL synthesis.

pub mod image;
pub mod kind;
pub mod normalize;

pub use image::{image_prompt, image_url};
pub use kind::PropertyType;
pub use normalize::{draft_for_create, draft_for_update, MissingFields, PropertyInput};
