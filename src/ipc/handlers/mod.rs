pub mod analytics;
pub mod collection;
pub mod core;
pub mod grades;
pub mod session;
pub mod students;
pub mod subjects;
pub mod validate;
