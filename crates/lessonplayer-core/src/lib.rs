pub mod backend;
pub mod count_in;
pub mod ipc;
pub mod loop_ab;
pub mod preset;
pub mod rate_pitch;
pub mod session;
pub mod state;
pub mod status;

pub use backend::*;
pub use count_in::*;
pub use ipc::*;
pub use loop_ab::*;
pub use preset::*;
pub use rate_pitch::*;
pub use session::*;
pub use state::*;
pub use status::*;
