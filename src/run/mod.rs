pub mod driver;
pub mod output;
