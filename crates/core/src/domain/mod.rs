pub mod conversation;
pub mod interaction;
pub mod product;
