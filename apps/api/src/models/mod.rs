pub mod cv_sections;
pub mod profile;
