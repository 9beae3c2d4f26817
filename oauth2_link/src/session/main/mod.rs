mod session;

pub use session::{current_user, get_session_id_from_headers, logout};

pub(crate) use session::{ensure_session, login};
