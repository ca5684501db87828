pub mod anki;
pub mod json;
