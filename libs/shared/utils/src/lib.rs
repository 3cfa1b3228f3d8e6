pub mod extractor;
pub mod jwt;
pub mod profile;
pub mod test_utils;
pub mod validation;
