mod classify;
mod session;
