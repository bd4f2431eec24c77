//! Access domain - who may see and write which user fields

mod policy;

pub use policy::{FieldAccessPolicy, ReadOptions, ReadView, Requester, Role, WriteOperation};
