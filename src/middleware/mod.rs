mod client_ctx;

pub use client_ctx::{ClientCtx, SESSION_USER_KEY};
