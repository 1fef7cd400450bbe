pub mod access;
pub mod dates;
pub mod extractor;
pub mod jwt;
pub mod limits;
pub mod password;
pub mod test_utils;
