pub mod channels;
pub mod events;
