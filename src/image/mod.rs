//! Image normalization into embeddable data URIs.
pub mod normalizer;

pub use normalizer::{decode_data_uri, NormalizedImage, ResponseNormalizer};
