pub mod auth;
pub mod docs;
pub mod model;
pub mod profile;
pub mod report;
pub mod swipe;
pub mod user;

pub use model::{IdInput, Paginate};
