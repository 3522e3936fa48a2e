pub mod day;
pub mod place;
pub mod trip;
