pub mod dignities;
pub mod signs;

pub use dignities::{DignitiesService, DignityResult, DignityType, ExactExaltation};
pub use signs::{
    describe_sign, normalize_degrees, to_sign_position, Element, Language, Modality, SignPosition,
    ZodiacSign,
};
