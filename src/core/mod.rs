pub mod clock;
pub mod report;
pub mod state_machine;
