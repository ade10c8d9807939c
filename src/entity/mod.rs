//! Entity instances and the CRUD operations built on schema templates
//! and the execution seam.

mod crud;
mod record;

pub use crud::*;
pub use record::*;
