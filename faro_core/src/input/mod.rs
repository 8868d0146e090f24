pub mod hit_test;

pub use hit_test::{HitOutcome, HitTester};
