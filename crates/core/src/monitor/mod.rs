pub mod mailbox;
pub mod status;
pub mod worker;
