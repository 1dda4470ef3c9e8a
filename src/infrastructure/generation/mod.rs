mod noop_generator;

pub use noop_generator::NoOpGenerator;
