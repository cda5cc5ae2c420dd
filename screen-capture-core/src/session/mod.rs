pub mod controller;
pub mod running_state;
