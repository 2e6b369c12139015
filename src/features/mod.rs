pub mod cosmetics;
