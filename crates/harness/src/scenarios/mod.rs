//! End-to-end use of the harness against small subjects with async collaborators.

mod notification_handler;
mod user_service;
