pub mod message_store;
