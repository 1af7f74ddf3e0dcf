pub mod controller;
pub mod frame_packet;
pub mod session_state;
