pub mod fakes;
pub mod harness;
