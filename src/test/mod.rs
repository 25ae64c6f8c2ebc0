pub mod utils;

mod feedback;
mod notifications;
mod trust;
mod users;
