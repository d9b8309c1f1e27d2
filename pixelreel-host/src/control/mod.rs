//! Control surface
//!
//! Framed requests arrive over TCP and are served on a plain thread, next
//! to the embassy executor. Requests call the player directly; anything the
//! render task must react to travels over the command channel.

pub mod handler;
pub mod server;

pub use handler::ControlHandler;
pub use server::spawn_control_server;
