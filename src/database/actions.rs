pub mod carts;
pub mod favorites;
pub mod ingredients;
pub mod recipes;
pub mod subscriptions;
pub mod tags;
pub mod users;

pub use carts::*;
pub use favorites::*;
pub use ingredients::*;
pub use recipes::*;
pub use subscriptions::*;
pub use tags::*;
pub use users::*;
