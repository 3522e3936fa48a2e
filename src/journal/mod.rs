pub mod calendar;
pub mod hashtags;
pub mod reconcile;
