pub mod cart;
pub mod cart_item;
pub mod connection;
pub mod foreign_types;
pub mod order_datatypes;
