pub mod permission;

pub use permission::{Capability, Permission};
