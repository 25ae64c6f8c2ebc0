pub mod answers;
pub mod feedback;
pub mod notifications;
pub mod questions;
pub mod requests;
pub mod reviews;
pub mod trust;
pub mod users;

pub use answers::*;
pub use feedback::*;
pub use notifications::*;
pub use questions::*;
pub use requests::*;
pub use reviews::*;
pub use trust::*;
pub use users::*;
