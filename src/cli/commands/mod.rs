mod add;
mod check;
mod init;
mod prompt;
mod status;

pub use add::{cmd_movie_add, cmd_series_add};
pub use check::cmd_check;
pub use init::cmd_init;
pub use status::cmd_status;
