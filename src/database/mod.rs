pub mod schema;
pub mod setup;

pub use schema::*;
pub use setup::*;
