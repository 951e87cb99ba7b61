pub mod wallets;

pub use wallets::Entity as Wallets;
pub use wallets::Model as Wallet;
