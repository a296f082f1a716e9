pub mod error;
pub mod message;
pub mod session;
pub mod todo;

pub use error::*;
pub use message::*;
pub use session::*;
pub use todo::*;
