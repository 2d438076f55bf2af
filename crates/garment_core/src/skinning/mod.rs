pub mod lbs;
