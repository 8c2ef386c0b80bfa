pub mod api;
pub mod enums;

pub use enums::UnknownVariant;
