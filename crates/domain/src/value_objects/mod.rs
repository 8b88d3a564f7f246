pub mod amount;
pub mod coin;

pub use amount::Amount;
pub use coin::Coin;
