// Single-job applications submitted by the current user.

pub mod handlers;
