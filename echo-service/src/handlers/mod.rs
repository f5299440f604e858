pub mod health;
pub mod process;

pub use health::health_check;
pub use process::process_input;
