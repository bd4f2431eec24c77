//! Profile infrastructure

mod store;

pub use store::{ProfileData, ProfileDataStore, ProfileView};
