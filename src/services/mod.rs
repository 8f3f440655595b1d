pub mod role_service;
pub mod vote_service;
