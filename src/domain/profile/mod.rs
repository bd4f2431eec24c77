//! Profile domain - per-user key/value attributes

mod entity;

pub use entity::{
    ProfileEntry, ProfileEntryKey, ProfileType, ProfileValue, ValueEncoding, MAX_PROFILE_KEY_LENGTH,
};
