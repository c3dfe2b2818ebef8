//! Domain entities

mod departure;
mod line;
mod stop;

pub use departure::Departure;
pub use line::Line;
pub use stop::Stop;
