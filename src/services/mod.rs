pub mod categories;

pub use categories::{CategoryCount, CategoryService, SharedCategories};
